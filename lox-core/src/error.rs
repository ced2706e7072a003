//! 错误类型定义

use std::fmt;

use thiserror::Error;

/// 字节码写入错误
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkError {
    #[error("Too much code to jump over.")]
    JumpTooLarge,
    #[error("Loop body too large.")]
    LoopTooLarge,
}

/// 局部变量管理错误
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeError {
    #[error("Too many local variables in function.")]
    TooManyLocals,
    #[error("Already a variable with this name in this scope.")]
    AlreadyDeclared,
    #[error("Can't read local variable in its own initializer.")]
    ReadInOwnInitializer,
}

/// 诊断所指向的位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLocation {
    /// 在某个词素处
    Lexeme(String),
    /// 在输入末尾
    End,
    /// 扫描错误，没有可展示的词素
    None,
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorLocation::Lexeme(lexeme) => write!(f, " at '{lexeme}'"),
            ErrorLocation::End => write!(f, " at end"),
            ErrorLocation::None => Ok(()),
        }
    }
}

/// 单条编译诊断
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[line {line}] Error{location}: {message}")]
pub struct Diagnostic {
    pub line: usize,
    pub location: ErrorLocation,
    pub message: String,
}

/// 编译错误：一次编译中收集到的全部诊断
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", render_lines(.diagnostics))]
pub struct CompileError {
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileError {
    /// 第一条诊断的行号
    pub fn line(&self) -> Option<usize> {
        self.diagnostics.first().map(|d| d.line)
    }
}

/// 运行时错误种类
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    #[error("Operand must be a number.")]
    OperandMustBeNumber,
    #[error("Operands must be numbers.")]
    OperandsMustBeNumbers,
    #[error("Operands must be two numbers or two strings.")]
    OperandsMustBeNumbersOrStrings,
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),
    #[error("Can only call functions and classes.")]
    NotCallable,
    #[error("Expected {expected} arguments but got {got}.")]
    ArityMismatch { expected: u8, got: u8 },
    #[error("Stack overflow.")]
    StackOverflow,
    #[error("Stack underflow.")]
    StackUnderflow,
    #[error("Unknown opcode {0}.")]
    UnknownOpcode(u8),
    #[error("Invalid bytecode: {0}.")]
    InvalidBytecode(&'static str),
    #[error("Failed to write output: {0}.")]
    Output(String),
}

impl RuntimeErrorKind {
    /// 错误种类名（供结构化报告使用）
    pub fn name(&self) -> &'static str {
        match self {
            RuntimeErrorKind::OperandMustBeNumber => "OperandMustBeNumber",
            RuntimeErrorKind::OperandsMustBeNumbers => "OperandsMustBeNumbers",
            RuntimeErrorKind::OperandsMustBeNumbersOrStrings => "OperandsMustBeNumbersOrStrings",
            RuntimeErrorKind::UndefinedVariable(_) => "UndefinedVariable",
            RuntimeErrorKind::NotCallable => "NotCallable",
            RuntimeErrorKind::ArityMismatch { .. } => "ArityMismatch",
            RuntimeErrorKind::StackOverflow => "StackOverflow",
            RuntimeErrorKind::StackUnderflow => "StackUnderflow",
            RuntimeErrorKind::UnknownOpcode(_) => "UnknownOpcode",
            RuntimeErrorKind::InvalidBytecode(_) => "InvalidBytecode",
            RuntimeErrorKind::Output(_) => "Output",
        }
    }
}

/// 调用栈中的一帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub line: usize,
    /// 函数名，顶层脚本为 None
    pub function: Option<String>,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.function {
            Some(name) => write!(f, "[line {}] in {}()", self.line, name),
            None => write!(f, "[line {}] in script", self.line),
        }
    }
}

/// 运行时错误：错误种类 + 出错指令所在行 + 调用栈（最内层在前）
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}\n{}", render_lines(.trace))]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub line: usize,
    pub trace: Vec<TraceEntry>,
}

fn render_lines<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
