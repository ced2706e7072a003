//! 字节码虚拟机
//!
//! VM 是一个显式的值：持有操作数栈、调用帧、全局变量表和对象堆。
//! 同一实例上多次 `interpret` 共享全局变量与驻留字符串（REPL 依赖这一点）。

mod call;
mod execution;
mod native;
mod operators;
mod output;
pub mod stack;

pub use output::SharedOutput;

use std::io::{self, Write};

use lox_config::{CompilerConfig, LimitConfig, LoxConfig};
use tracing::debug;

use crate::compiler;
use crate::error::{CompileError, RuntimeError, RuntimeErrorKind, TraceEntry};
use crate::heap::Heap;
use crate::object::{NativeFn, ObjRef};
use crate::table::Table;
use crate::value::Value;

/// 调用帧
#[derive(Debug, Clone, Copy)]
pub struct CallFrame {
    pub function: ObjRef,
    /// 下一条待执行指令在函数 chunk 中的偏移
    pub ip: usize,
    /// 本帧槽位 0 在操作数栈中的位置
    pub slot_base: usize,
}

/// VM 生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Idle,
    Loaded,
    Running,
    HaltedOk,
    HaltedCompileError,
    HaltedRuntimeError,
}

/// 解释执行结果
#[derive(Debug, Clone, PartialEq)]
pub enum InterpretResult {
    Ok,
    CompileError(CompileError),
    RuntimeError(RuntimeError),
}

impl InterpretResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, InterpretResult::Ok)
    }
}

/// VM 配置
#[derive(Debug, Clone, Default)]
pub struct VMConfig {
    pub compiler: CompilerConfig,
    pub limits: LimitConfig,
}

impl From<&LoxConfig> for VMConfig {
    fn from(config: &LoxConfig) -> Self {
        Self {
            compiler: config.compiler.clone(),
            limits: config.limits.clone(),
        }
    }
}

/// 虚拟机
pub struct VM {
    pub(crate) frames: Vec<CallFrame>,
    pub(crate) stack: Vec<Value>,
    pub(crate) globals: Table,
    pub(crate) heap: Heap,
    pub(crate) limits: LimitConfig,
    pub(crate) out: Box<dyn Write>,
    compiler_config: CompilerConfig,
    state: VmState,
    last_value: Value,
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}

impl VM {
    /// 创建新的 VM（默认配置，输出到 stdout）
    pub fn new() -> Self {
        Self::with_config(VMConfig::default())
    }

    pub fn with_config(config: VMConfig) -> Self {
        let mut vm = Self {
            frames: Vec::new(),
            stack: Vec::new(),
            globals: Table::new(),
            heap: Heap::new(),
            limits: config.limits,
            out: Box::new(io::stdout()),
            compiler_config: config.compiler,
            state: VmState::Idle,
            last_value: Value::Nil,
        };
        native::register_defaults(&mut vm);
        vm
    }

    /// 替换 `print` 的输出目标
    pub fn with_output(mut self, out: impl Write + 'static) -> Self {
        self.out = Box::new(out);
        self
    }

    /// 编译并执行一段源码
    pub fn interpret(&mut self, source: &str) -> InterpretResult {
        match self.compile(source) {
            Ok(function) => self.run_function(function),
            Err(e) => InterpretResult::CompileError(e),
        }
    }

    /// 编译到本 VM 的堆中，返回脚本函数；失败时进入 HaltedCompileError
    pub fn compile(&mut self, source: &str) -> Result<ObjRef, CompileError> {
        self.state = VmState::Idle;
        compiler::compile_with_config(source, &mut self.heap, &self.compiler_config).map_err(|e| {
            self.state = VmState::HaltedCompileError;
            e
        })
    }

    /// 执行本 VM 已编译的脚本函数
    pub fn run_function(&mut self, function: ObjRef) -> InterpretResult {
        self.frames.clear();
        self.last_value = Value::Nil;
        if let Err(kind) = self.load(function) {
            return self.halt_with(kind);
        }

        self.state = VmState::Running;
        debug!(target: "lox::vm", objects = self.heap.object_count(), "run script");
        let result = execution::run(self);
        let flushed = self.out.flush();
        match result {
            Ok(()) => {
                if let Err(e) = flushed {
                    return self.halt_with(RuntimeErrorKind::Output(e.to_string()));
                }
                self.state = VmState::HaltedOk;
                debug!(target: "lox::vm", stack = self.stack.len(), "halted ok");
                InterpretResult::Ok
            }
            Err(error) => {
                self.state = VmState::HaltedRuntimeError;
                InterpretResult::RuntimeError(error)
            }
        }
    }

    /// 把脚本函数绑定为第 0 帧
    fn load(&mut self, function: ObjRef) -> Result<(), RuntimeErrorKind> {
        stack::push(self, Value::Obj(function))?;
        call::call_function(self, function, 0)?;
        self.state = VmState::Loaded;
        Ok(())
    }

    fn halt_with(&mut self, kind: RuntimeErrorKind) -> InterpretResult {
        let error = self.runtime_error(kind);
        self.state = VmState::HaltedRuntimeError;
        InterpretResult::RuntimeError(error)
    }

    /// 根据当前调用帧构造运行时错误，行号取 ip 前一个字节
    pub(crate) fn runtime_error(&self, kind: RuntimeErrorKind) -> RuntimeError {
        let trace: Vec<TraceEntry> = self
            .frames
            .iter()
            .rev()
            .map(|frame| {
                let function = self.heap.function(frame.function);
                let line = function
                    .and_then(|f| f.chunk.line_at(frame.ip.saturating_sub(1)))
                    .unwrap_or(0);
                let name = function
                    .and_then(|f| f.name)
                    .and_then(|n| self.heap.string(n))
                    .map(|s| s.chars.to_string());
                TraceEntry {
                    line,
                    function: name,
                }
            })
            .collect();
        let line = trace.first().map(|entry| entry.line).unwrap_or(0);
        debug!(target: "lox::vm", %kind, line, "runtime error");
        RuntimeError { kind, line, trace }
    }

    /// 宿主在执行前压入值
    pub fn push(&mut self, value: Value) -> Result<(), RuntimeErrorKind> {
        stack::push(self, value)
    }

    pub fn pop(&mut self) -> Result<Value, RuntimeErrorKind> {
        stack::pop(self)
    }

    /// 注册原生函数为全局变量
    pub fn define_native(&mut self, name: &'static str, arity: u8, function: NativeFn) {
        let name_ref = self.heap.copy_string(name);
        let native = self.heap.new_native(name, arity, function);
        if let Some(key) = self.heap.key(name_ref) {
            self.globals.set(key, Value::Obj(native));
        }
    }

    /// 最近一次执行的脚本返回值（没有 `return` 值时为 nil）
    pub fn last_value(&self) -> Value {
        self.last_value
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// 清空操作数栈和调用帧（运行时错误后由宿主调用）
    pub fn reset_stack(&mut self) {
        self.stack.clear();
        self.frames.clear();
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn globals(&self) -> &Table {
        &self.globals
    }

    /// 按名字读取全局变量
    pub fn get_global(&self, name: &str) -> Option<Value> {
        let handle = self.heap.interned(name)?;
        let key = self.heap.key(handle)?;
        self.globals.get(key)
    }

    /// 值的打印形式
    pub fn display(&self, value: Value) -> String {
        self.heap.display(value).to_string()
    }

    /// 释放全部运行时资源，返回释放的对象数
    pub fn free(&mut self) -> usize {
        self.reset_stack();
        self.globals.clear();
        let freed = self.heap.free_objects();
        self.state = VmState::Idle;
        self.last_value = Value::Nil;
        debug!(target: "lox::vm", freed, "vm freed");
        freed
    }
}

impl Drop for VM {
    fn drop(&mut self) {
        self.free();
    }
}
