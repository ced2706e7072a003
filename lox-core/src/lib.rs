//! Lox Core - 字节码编译器与虚拟机
//!
//! 纯逻辑层：扫描、单遍编译、字节码执行。除 `print` 写入可替换的输出目标外不做 IO。
//!
//! 模块结构：
//! - value / object / heap：值表示、堆对象与字符串驻留
//! - memory：统一的扩容策略
//! - chunk / opcode / debug：字节码容器、指令集、反汇编
//! - table：开放寻址哈希表
//! - scanner / compiler：源码 → 字节码
//! - vm：执行引擎

pub mod chunk;
pub mod compiler;
pub mod debug;
pub mod error;
pub mod heap;
pub mod memory;
pub mod object;
pub mod opcode;
pub mod scanner;
pub mod table;
pub mod value;
pub mod vm;

pub use chunk::Chunk;
pub use compiler::{compile, compile_with_config};
pub use debug::{disassemble_chunk, disassemble_function, disassemble_instruction};
pub use error::{
    ChunkError, CompileError, Diagnostic, ErrorLocation, RuntimeError, RuntimeErrorKind,
    ScopeError, TraceEntry,
};
pub use heap::Heap;
pub use object::{NativeFn, Obj, ObjFunction, ObjKind, ObjNative, ObjRef, ObjString, ObjType};
pub use opcode::OpCode;
pub use scanner::{Scanner, Token, TokenKind};
pub use table::{Key, Table};
pub use value::Value;
pub use vm::{CallFrame, InterpretResult, SharedOutput, VMConfig, VmState, VM};
