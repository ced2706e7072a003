//! API 类型定义
//!
//! 编译和执行的输入输出类型。

use lox_core::{disassemble_function, Heap, ObjFunction, ObjRef};

/// 编译输出：顶层脚本函数及其所在的堆
#[derive(Debug)]
pub struct CompileOutput {
    /// 持有脚本函数、嵌套函数与字符串常量
    pub heap: Heap,
    /// 顶层脚本函数
    pub function: ObjRef,
}

impl CompileOutput {
    pub fn script(&self) -> Option<&ObjFunction> {
        self.heap.function(self.function)
    }

    /// 反汇编顶层脚本（嵌套函数递归列出）
    pub fn disassemble(&self) -> String {
        disassemble_function(&self.heap, self.function)
    }
}

/// 执行输出
#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteOutput {
    /// 脚本 `return` 的值的打印形式；返回 nil 时为 None
    pub value: Option<String>,
    /// 标准输出捕获（仅在 `capture_output` 时填充）
    pub stdout: String,
}
