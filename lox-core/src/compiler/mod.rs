//! 单遍编译器：源码 → 字节码
//!
//! 表达式用 Pratt 解析，语句用递归下降，边解析边发射字节码，不构建 AST。
//! 出错后进入 panic 模式，抑制后续诊断直到语句边界再同步。

mod expr;
mod rules;
mod stmt;
pub mod var;

pub use rules::Precedence;
pub use var::Local;

use std::mem;

use lox_config::CompilerConfig;
use tracing::{debug, trace};

use crate::chunk::Chunk;
use crate::debug::disassemble_chunk;
use crate::error::{CompileError, Diagnostic, ErrorLocation};
use crate::heap::Heap;
use crate::object::{ObjFunction, ObjRef};
use crate::opcode::OpCode;
use crate::scanner::{Scanner, Token, TokenKind};
use crate::value::Value;

/// 正在编译的函数种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Script,
    Function,
}

/// 单个函数的编译状态
#[derive(Debug)]
pub struct FunctionState<'src> {
    pub(crate) function: ObjFunction,
    pub(crate) kind: FunctionKind,
    pub(crate) locals: Vec<Local<'src>>,
    pub(crate) scope_depth: usize,
}

impl<'src> FunctionState<'src> {
    fn new(kind: FunctionKind, name: Option<ObjRef>) -> Self {
        // 槽位 0 保留给被调用的函数本身
        let reserved = Local {
            name: "",
            depth: 0,
            is_initialized: true,
        };
        Self {
            function: ObjFunction::new(name),
            kind,
            locals: vec![reserved],
            scope_depth: 0,
        }
    }
}

struct Parser<'src> {
    current: Token<'src>,
    previous: Token<'src>,
    had_error: bool,
    panic_mode: bool,
    diagnostics: Vec<Diagnostic>,
}

/// 编译器
pub struct Compiler<'src, 'heap> {
    scanner: Scanner<'src>,
    parser: Parser<'src>,
    heap: &'heap mut Heap,
    /// 当前（最内层）函数
    state: FunctionState<'src>,
    /// 外层函数，最近的在末尾
    enclosing: Vec<FunctionState<'src>>,
    config: CompilerConfig,
}

/// 以默认配置编译
pub fn compile(source: &str, heap: &mut Heap) -> Result<ObjRef, CompileError> {
    compile_with_config(source, heap, &CompilerConfig::default())
}

/// 编译整段源码，成功时返回顶层脚本函数
pub fn compile_with_config(
    source: &str,
    heap: &mut Heap,
    config: &CompilerConfig,
) -> Result<ObjRef, CompileError> {
    let mut compiler = Compiler::new(source, heap, config.clone());
    compiler.advance();
    while !compiler.match_token(TokenKind::Eof) {
        compiler.declaration();
    }
    compiler.finish()
}

impl<'src, 'heap> Compiler<'src, 'heap> {
    fn new(source: &'src str, heap: &'heap mut Heap, config: CompilerConfig) -> Self {
        Self {
            scanner: Scanner::new(source),
            parser: Parser {
                current: Token::synthetic(""),
                previous: Token::synthetic(""),
                had_error: false,
                panic_mode: false,
                diagnostics: Vec::new(),
            },
            heap,
            state: FunctionState::new(FunctionKind::Script, None),
            enclosing: Vec::new(),
            config,
        }
    }

    fn finish(mut self) -> Result<ObjRef, CompileError> {
        self.emit_return();
        if self.parser.had_error {
            debug!(
                target: "lox::compiler",
                errors = self.parser.diagnostics.len(),
                "compilation failed"
            );
            return Err(CompileError {
                diagnostics: self.parser.diagnostics,
            });
        }
        self.dump_code("<script>");
        Ok(self.heap.new_function(self.state.function))
    }

    // ===== token 流 =====

    fn advance(&mut self) {
        self.parser.previous = self.parser.current;
        loop {
            self.parser.current = self.scanner.scan_token();
            if self.parser.current.kind != TokenKind::Error {
                break;
            }
            let message = self.parser.current.lexeme;
            self.error_at_current(message);
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.parser.current.kind == kind {
            self.advance();
            return;
        }
        self.error_at_current(message);
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.parser.current.kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    // ===== 诊断 =====

    fn error_at_current(&mut self, message: &str) {
        let token = self.parser.current;
        self.error_at(token, message);
    }

    fn error(&mut self, message: &str) {
        let token = self.parser.previous;
        self.error_at(token, message);
    }

    fn error_at(&mut self, token: Token<'src>, message: &str) {
        if self.parser.panic_mode {
            return;
        }
        self.parser.panic_mode = true;
        self.parser.had_error = true;

        let location = match token.kind {
            TokenKind::Eof => ErrorLocation::End,
            TokenKind::Error => ErrorLocation::None,
            _ => ErrorLocation::Lexeme(token.lexeme.to_string()),
        };
        let diagnostic = Diagnostic {
            line: token.line,
            location,
            message: message.to_string(),
        };
        debug!(target: "lox::compiler", "{}", diagnostic);
        self.parser.diagnostics.push(diagnostic);
    }

    // ===== 字节码发射 =====

    fn current_chunk(&mut self) -> &mut Chunk {
        &mut self.state.function.chunk
    }

    fn emit_op(&mut self, op: OpCode) {
        let line = self.parser.previous.line;
        self.current_chunk().write_op(op, line);
    }

    fn emit_op_u8(&mut self, op: OpCode, operand: u8) {
        let line = self.parser.previous.line;
        self.current_chunk().write_op_u8(op, operand, line);
    }

    fn emit_return(&mut self) {
        self.emit_op(OpCode::Nil);
        self.emit_op(OpCode::Return);
    }

    fn emit_constant(&mut self, value: Value) {
        let index = self.current_chunk().add_constant(value);
        if let Ok(index) = u8::try_from(index) {
            self.emit_op_u8(OpCode::Constant, index);
        } else if let Ok(index) = u16::try_from(index) {
            let line = self.parser.previous.line;
            self.current_chunk()
                .write_op_u16(OpCode::ConstantWide, index, line);
        } else {
            self.error("Too many constants in one chunk.");
        }
    }

    /// 添加常量，返回单字节索引
    fn make_constant(&mut self, value: Value) -> u8 {
        let index = self.current_chunk().add_constant(value);
        match u8::try_from(index) {
            Ok(index) => index,
            Err(_) => {
                self.error("Too many constants in one chunk.");
                0
            }
        }
    }

    /// 变量名常量，同名复用已有槽位
    fn identifier_constant(&mut self, name: &str) -> u8 {
        let handle = self.heap.copy_string(name);
        let existing = self
            .state
            .function
            .chunk
            .constants
            .iter()
            .position(|c| *c == Value::Obj(handle));
        match existing.and_then(|index| u8::try_from(index).ok()) {
            Some(index) => index,
            None => self.make_constant(Value::Obj(handle)),
        }
    }

    fn emit_jump(&mut self, op: OpCode) -> usize {
        let line = self.parser.previous.line;
        self.current_chunk().write_jump(op, line)
    }

    fn patch_jump(&mut self, offset: usize) {
        if let Err(e) = self.current_chunk().patch_jump(offset) {
            self.error(&e.to_string());
        }
    }

    fn emit_loop(&mut self, loop_start: usize) {
        let line = self.parser.previous.line;
        if let Err(e) = self.current_chunk().write_loop(loop_start, line) {
            self.error(&e.to_string());
        }
    }

    // ===== 嵌套函数 =====

    fn begin_function(&mut self, kind: FunctionKind, name: Option<ObjRef>) {
        trace!(target: "lox::compiler", ?kind, depth = self.enclosing.len() + 1, "begin function");
        let outer = mem::replace(&mut self.state, FunctionState::new(kind, name));
        self.enclosing.push(outer);
    }

    fn end_function(&mut self) -> ObjRef {
        self.emit_return();
        let outer = self
            .enclosing
            .pop()
            .unwrap_or_else(|| FunctionState::new(FunctionKind::Script, None));
        let finished = mem::replace(&mut self.state, outer);

        let name = finished
            .function
            .name
            .and_then(|n| self.heap.string(n))
            .map(|s| format!("<fn {}>", s.chars))
            .unwrap_or_else(|| "<script>".to_string());
        trace!(
            target: "lox::compiler",
            kind = ?finished.kind,
            name = %name,
            arity = finished.function.arity,
            "end function"
        );
        if !self.parser.had_error {
            self.dump_chunk(&finished.function.chunk, &name);
        }
        self.heap.new_function(finished.function)
    }

    fn dump_code(&self, name: &str) {
        self.dump_chunk(&self.state.function.chunk, name);
    }

    fn dump_chunk(&self, chunk: &Chunk, name: &str) {
        if self.config.print_code {
            debug!(target: "lox::compiler", "\n{}", disassemble_chunk(chunk, &*self.heap, name));
        }
    }
}
