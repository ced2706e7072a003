//! 操作数栈操作
//!
//! 所有栈访问都经过这里：push/pop/peek 和两个帧内槽位访问器。

use super::VM;
use crate::error::RuntimeErrorKind;
use crate::memory;
use crate::value::Value;

/// 压栈，达到上限时报栈溢出
#[inline]
pub fn push(vm: &mut VM, value: Value) -> Result<(), RuntimeErrorKind> {
    if vm.stack.len() >= vm.limits.stack_max {
        return Err(RuntimeErrorKind::StackOverflow);
    }
    memory::push_grow(&mut vm.stack, value);
    Ok(())
}

#[inline]
pub fn pop(vm: &mut VM) -> Result<Value, RuntimeErrorKind> {
    vm.stack.pop().ok_or(RuntimeErrorKind::StackUnderflow)
}

/// 弹出两个值，返回 (a, b)，b 是原栈顶
#[inline]
pub fn pop_two(vm: &mut VM) -> Result<(Value, Value), RuntimeErrorKind> {
    let b = pop(vm)?;
    let a = pop(vm)?;
    Ok((a, b))
}

/// 查看栈顶往下第 `distance` 个值（0 为栈顶）
#[inline]
pub fn peek(vm: &VM, distance: usize) -> Result<Value, RuntimeErrorKind> {
    vm.stack
        .len()
        .checked_sub(distance + 1)
        .map(|index| vm.stack[index])
        .ok_or(RuntimeErrorKind::StackUnderflow)
}

/// 栈顶的 `count` 个值（调用参数）
pub fn top(vm: &VM, count: usize) -> Result<&[Value], RuntimeErrorKind> {
    let start = vm
        .stack
        .len()
        .checked_sub(count)
        .ok_or(RuntimeErrorKind::StackUnderflow)?;
    Ok(&vm.stack[start..])
}

/// 丢弃 `len` 以上的值（帧退出时使用）
pub fn truncate(vm: &mut VM, len: usize) {
    vm.stack.truncate(len);
}

fn slot_index(vm: &VM, slot: u8) -> Result<usize, RuntimeErrorKind> {
    let base = vm
        .frames
        .last()
        .map(|frame| frame.slot_base)
        .ok_or(RuntimeErrorKind::InvalidBytecode("no active call frame"))?;
    let index = base + slot as usize;
    if index < vm.stack.len() {
        Ok(index)
    } else {
        Err(RuntimeErrorKind::StackUnderflow)
    }
}

/// 读取当前帧的局部变量槽位
pub fn get_slot(vm: &VM, slot: u8) -> Result<Value, RuntimeErrorKind> {
    slot_index(vm, slot).map(|index| vm.stack[index])
}

/// 写入当前帧的局部变量槽位
pub fn set_slot(vm: &mut VM, slot: u8, value: Value) -> Result<(), RuntimeErrorKind> {
    let index = slot_index(vm, slot)?;
    vm.stack[index] = value;
    Ok(())
}
