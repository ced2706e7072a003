//! 测试辅助工具
//!
//! 提供端到端测试的辅助函数

#![allow(dead_code)]

use lox_core::{CompileError, InterpretResult, RuntimeError, SharedOutput, Value, VM};

/// 执行结果
#[derive(Debug)]
pub struct ExecResult {
    /// 脚本 `return` 的值
    pub return_value: Value,
    /// 返回值的打印形式
    pub rendered: String,
    /// `print` 输出
    pub output: String,
}

#[derive(Debug)]
pub enum ExecError {
    Compile(CompileError),
    Runtime { error: RuntimeError, output: String },
}

/// 执行 Lox 代码并捕获输出
///
/// # Example
/// ```
/// let result = run_code("var x = 5; return x;");
/// assert!(result.is_ok());
/// ```
pub fn run_code(code: &str) -> Result<ExecResult, ExecError> {
    let out = SharedOutput::new();
    let mut vm = VM::new().with_output(out.clone());
    match vm.interpret(code) {
        InterpretResult::Ok => {
            let return_value = vm.last_value();
            Ok(ExecResult {
                return_value,
                rendered: vm.display(return_value),
                output: out.contents(),
            })
        }
        InterpretResult::CompileError(e) => Err(ExecError::Compile(e)),
        InterpretResult::RuntimeError(error) => Err(ExecError::Runtime {
            error,
            output: out.contents(),
        }),
    }
}

/// 执行并返回 `print` 输出，失败时 panic
pub fn output_of(code: &str) -> String {
    match run_code(code) {
        Ok(result) => result.output,
        Err(e) => panic!("execution failed: {e:?}"),
    }
}

/// 获取数字返回值
pub fn get_number(result: &ExecResult) -> Option<f64> {
    result.return_value.as_number()
}

/// 期望运行时错误，返回错误本身
pub fn runtime_error(code: &str) -> RuntimeError {
    match run_code(code) {
        Err(ExecError::Runtime { error, .. }) => error,
        other => panic!("expected runtime error, got {other:?}"),
    }
}

/// 期望编译错误，返回全部诊断的文本
pub fn compile_errors(code: &str) -> Vec<String> {
    match run_code(code) {
        Err(ExecError::Compile(e)) => e.diagnostics.iter().map(ToString::to_string).collect(),
        other => panic!("expected compile error, got {other:?}"),
    }
}
