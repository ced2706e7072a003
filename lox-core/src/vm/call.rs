//! 函数调用与返回

use tracing::trace;

use super::execution::Flow;
use super::{stack, CallFrame, VM};
use crate::error::RuntimeErrorKind;
use crate::object::{NativeFn, ObjRef};
use crate::value::Value;

/// 调用栈上 `arg_count` 个参数之下的被调用者
pub(super) fn call_value(vm: &mut VM, callee: Value, arg_count: u8) -> Result<(), RuntimeErrorKind> {
    let Value::Obj(handle) = callee else {
        return Err(RuntimeErrorKind::NotCallable);
    };
    if vm.heap.function(handle).is_some() {
        return call_function(vm, handle, arg_count);
    }
    if let Some(native) = vm.heap.native(handle) {
        let (function, arity) = (native.function, native.arity);
        return call_native(vm, function, arity, arg_count);
    }
    Err(RuntimeErrorKind::NotCallable)
}

/// 为 Lox 函数压入新的调用帧
pub(super) fn call_function(vm: &mut VM, handle: ObjRef, arg_count: u8) -> Result<(), RuntimeErrorKind> {
    let arity = vm
        .heap
        .function(handle)
        .map(|function| function.arity)
        .ok_or(RuntimeErrorKind::NotCallable)?;
    if arg_count != arity {
        return Err(RuntimeErrorKind::ArityMismatch {
            expected: arity,
            got: arg_count,
        });
    }
    if vm.frames.len() >= vm.limits.frames_max {
        return Err(RuntimeErrorKind::StackOverflow);
    }

    let slot_base = vm
        .stack
        .len()
        .checked_sub(arg_count as usize + 1)
        .ok_or(RuntimeErrorKind::StackUnderflow)?;
    vm.frames.push(CallFrame {
        function: handle,
        ip: 0,
        slot_base,
    });
    trace!(target: "lox::vm", depth = vm.frames.len(), slot_base, "call");
    Ok(())
}

/// 原生函数直接在宿主中执行，结果替换被调用者和参数
fn call_native(
    vm: &mut VM,
    function: NativeFn,
    arity: u8,
    arg_count: u8,
) -> Result<(), RuntimeErrorKind> {
    if arg_count != arity {
        return Err(RuntimeErrorKind::ArityMismatch {
            expected: arity,
            got: arg_count,
        });
    }
    let result = function(stack::top(vm, arg_count as usize)?);
    let base = vm.stack.len() - arg_count as usize - 1;
    stack::truncate(vm, base);
    stack::push(vm, result)
}

/// 弹出当前帧；最外层帧返回时记录脚本结果并停机
pub(super) fn return_from(vm: &mut VM) -> Result<Flow, RuntimeErrorKind> {
    let result = stack::pop(vm)?;
    let frame = vm
        .frames
        .pop()
        .ok_or(RuntimeErrorKind::InvalidBytecode("return without a call frame"))?;
    stack::truncate(vm, frame.slot_base);

    if vm.frames.is_empty() {
        vm.last_value = result;
        return Ok(Flow::Halt);
    }
    stack::push(vm, result)?;
    trace!(target: "lox::vm", depth = vm.frames.len(), "return");
    Ok(Flow::Continue)
}
