//! 运算符实现
//!
//! 先 peek 做类型检查，通过后才弹出操作数；类型错误时栈保持原样。

use super::{stack, VM};
use crate::error::RuntimeErrorKind;
use crate::object::ObjRef;
use crate::value::Value;

fn number_operands(vm: &VM) -> Result<(f64, f64), RuntimeErrorKind> {
    match (stack::peek(vm, 1)?, stack::peek(vm, 0)?) {
        (Value::Number(a), Value::Number(b)) => Ok((a, b)),
        _ => Err(RuntimeErrorKind::OperandsMustBeNumbers),
    }
}

/// 数值二元运算 (- * /)
pub(super) fn arithmetic(vm: &mut VM, op: impl Fn(f64, f64) -> f64) -> Result<(), RuntimeErrorKind> {
    let (a, b) = number_operands(vm)?;
    stack::pop_two(vm)?;
    stack::push(vm, Value::Number(op(a, b)))
}

/// 数值比较 (> >= < <=)
pub(super) fn compare(vm: &mut VM, op: impl Fn(f64, f64) -> bool) -> Result<(), RuntimeErrorKind> {
    let (a, b) = number_operands(vm)?;
    stack::pop_two(vm)?;
    stack::push(vm, Value::Bool(op(a, b)))
}

/// `+`：数字相加或字符串拼接
pub(super) fn add(vm: &mut VM) -> Result<(), RuntimeErrorKind> {
    match (stack::peek(vm, 1)?, stack::peek(vm, 0)?) {
        (Value::Number(a), Value::Number(b)) => {
            stack::pop_two(vm)?;
            stack::push(vm, Value::Number(a + b))
        }
        (Value::Obj(a), Value::Obj(b)) => concatenate(vm, a, b),
        _ => Err(RuntimeErrorKind::OperandsMustBeNumbersOrStrings),
    }
}

fn concatenate(vm: &mut VM, a: ObjRef, b: ObjRef) -> Result<(), RuntimeErrorKind> {
    let (Some(left), Some(right)) = (vm.heap.string(a), vm.heap.string(b)) else {
        return Err(RuntimeErrorKind::OperandsMustBeNumbersOrStrings);
    };
    let mut chars = String::with_capacity(left.len() + right.len());
    chars.push_str(left.as_str());
    chars.push_str(right.as_str());

    stack::pop_two(vm)?;
    let result = vm.heap.take_string(chars);
    stack::push(vm, Value::Obj(result))
}

pub(super) fn negate(vm: &mut VM) -> Result<(), RuntimeErrorKind> {
    match stack::peek(vm, 0)? {
        Value::Number(n) => {
            stack::pop(vm)?;
            stack::push(vm, Value::Number(-n))
        }
        _ => Err(RuntimeErrorKind::OperandMustBeNumber),
    }
}
