//! API 错误类型
//!
//! 提供统一的错误类型和结构化错误报告。

use serde::Serialize;
use thiserror::Error;

pub use lox_core::{CompileError, RuntimeError};

/// Lox 错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoxError {
    /// 编译错误（包含全部诊断）
    #[error("{0}")]
    Compile(#[from] CompileError),

    /// 运行时错误
    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}

impl LoxError {
    /// 获取错误行号（如果有）
    pub fn line(&self) -> Option<usize> {
        match self {
            LoxError::Compile(e) => e.line(),
            LoxError::Runtime(e) => Some(e.line),
        }
    }

    /// 获取错误阶段名称
    pub fn phase(&self) -> &'static str {
        match self {
            LoxError::Compile(_) => "compile",
            LoxError::Runtime(_) => "runtime",
        }
    }

    /// 转换为结构化错误报告
    ///
    /// 编译错误取第一条诊断作为主消息，其余放进 `details`。
    pub fn to_report(&self) -> ErrorReport {
        match self {
            LoxError::Compile(e) => {
                let mut messages = e.diagnostics.iter().map(ToString::to_string);
                ErrorReport {
                    phase: self.phase(),
                    line: self.line(),
                    error_kind: "CompileError".to_string(),
                    message: messages.next().unwrap_or_default(),
                    details: messages.collect(),
                }
            }
            LoxError::Runtime(e) => ErrorReport {
                phase: self.phase(),
                line: self.line(),
                error_kind: e.kind.name().to_string(),
                message: e.kind.to_string(),
                details: e.trace.iter().map(ToString::to_string).collect(),
            },
        }
    }
}

/// 结构化错误报告
///
/// 上层应用（CLI、编辑器插件）可以根据自己的需求格式化。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    /// 错误阶段: compile, runtime
    pub phase: &'static str,
    /// 错误行号（1-based，如果有）
    pub line: Option<usize>,
    /// 错误类型（可用于程序化处理）
    pub error_kind: String,
    /// 人类可读的错误消息
    pub message: String,
    /// 额外诊断或调用栈
    pub details: Vec<String>,
}

impl std::fmt::Display for ErrorReport {
    /// 默认的 CLI 友好格式
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "[line {}] {} error: {}", line, self.phase, self.message),
            None => write!(f, "{} error: {}", self.phase, self.message),
        }
    }
}

impl ErrorReport {
    /// 转换为 JSON 格式（工具集成使用）
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
