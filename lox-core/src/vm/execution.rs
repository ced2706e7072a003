//! run() 主执行循环

use std::io::Write;

use super::{call, operators, stack, VM};
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::opcode::OpCode;
use crate::table::Key;
use crate::value::Value;

/// 单步执行后的去向
pub(super) enum Flow {
    Continue,
    Halt,
}

/// 执行字节码的主循环，直到最外层帧返回
pub(super) fn run(vm: &mut VM) -> Result<(), RuntimeError> {
    loop {
        #[cfg(feature = "trace_execution")]
        trace_instruction(vm);

        match step(vm) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Halt) => return Ok(()),
            Err(kind) => return Err(vm.runtime_error(kind)),
        }
    }
}

fn step(vm: &mut VM) -> Result<Flow, RuntimeErrorKind> {
    let byte = read_byte(vm)?;
    let op = OpCode::from_byte(byte).ok_or(RuntimeErrorKind::UnknownOpcode(byte))?;

    use OpCode::*;
    match op {
        // ===== 常量 =====
        Constant => {
            let index = read_byte(vm)? as usize;
            let value = read_constant(vm, index)?;
            stack::push(vm, value)?;
        }
        ConstantWide => {
            let index = read_u16(vm)? as usize;
            let value = read_constant(vm, index)?;
            stack::push(vm, value)?;
        }
        Nil => stack::push(vm, Value::Nil)?,
        True => stack::push(vm, Value::TRUE)?,
        False => stack::push(vm, Value::FALSE)?,

        // ===== 栈 =====
        Pop => {
            stack::pop(vm)?;
        }

        // ===== 变量 =====
        GetLocal => {
            let slot = read_byte(vm)?;
            let value = stack::get_slot(vm, slot)?;
            stack::push(vm, value)?;
        }
        SetLocal => {
            // 赋值是表达式，值留在栈顶
            let slot = read_byte(vm)?;
            let value = stack::peek(vm, 0)?;
            stack::set_slot(vm, slot, value)?;
        }
        GetGlobal => {
            let key = read_name(vm)?;
            match vm.globals.get(key) {
                Some(value) => stack::push(vm, value)?,
                None => return Err(undefined_variable(vm, key)),
            }
        }
        DefineGlobal => {
            let key = read_name(vm)?;
            let value = stack::peek(vm, 0)?;
            vm.globals.set(key, value);
            stack::pop(vm)?;
        }
        SetGlobal => {
            let key = read_name(vm)?;
            let value = stack::peek(vm, 0)?;
            if vm.globals.set(key, value) {
                // 赋值不能隐式定义全局变量
                vm.globals.delete(key);
                return Err(undefined_variable(vm, key));
            }
        }

        // ===== 算术 =====
        Add => operators::add(vm)?,
        Subtract => operators::arithmetic(vm, |a, b| a - b)?,
        Multiply => operators::arithmetic(vm, |a, b| a * b)?,
        Divide => operators::arithmetic(vm, |a, b| a / b)?,
        Negate => operators::negate(vm)?,

        // ===== 比较与逻辑 =====
        Equal => {
            let (a, b) = stack::pop_two(vm)?;
            stack::push(vm, Value::Bool(a == b))?;
        }
        NotEqual => {
            let (a, b) = stack::pop_two(vm)?;
            stack::push(vm, Value::Bool(a != b))?;
        }
        Greater => operators::compare(vm, |a, b| a > b)?,
        GreaterEqual => operators::compare(vm, |a, b| a >= b)?,
        Less => operators::compare(vm, |a, b| a < b)?,
        LessEqual => operators::compare(vm, |a, b| a <= b)?,
        Not => {
            let value = stack::pop(vm)?;
            stack::push(vm, Value::Bool(value.is_falsey()))?;
        }

        // ===== 控制流 =====
        Jump | Loop => {
            let offset = read_i16(vm)?;
            jump(vm, offset)?;
        }
        JumpIfFalse => {
            let offset = read_i16(vm)?;
            if stack::peek(vm, 0)?.is_falsey() {
                jump(vm, offset)?;
            }
        }

        // ===== 函数 =====
        Call => {
            let arg_count = read_byte(vm)?;
            let callee = stack::peek(vm, arg_count as usize)?;
            call::call_value(vm, callee, arg_count)?;
        }
        Return => return call::return_from(vm),

        // ===== 输出 =====
        Print => {
            let value = stack::pop(vm)?;
            writeln!(vm.out, "{}", vm.heap.display(value))
                .map_err(|e| RuntimeErrorKind::Output(e.to_string()))?;
        }
    }
    Ok(Flow::Continue)
}

fn read_byte(vm: &mut VM) -> Result<u8, RuntimeErrorKind> {
    let frame = vm
        .frames
        .last_mut()
        .ok_or(RuntimeErrorKind::InvalidBytecode("no active call frame"))?;
    let byte = vm
        .heap
        .function(frame.function)
        .and_then(|function| function.chunk.byte_at(frame.ip))
        .ok_or(RuntimeErrorKind::InvalidBytecode("instruction pointer out of bounds"))?;
    frame.ip += 1;
    Ok(byte)
}

fn read_u16(vm: &mut VM) -> Result<u16, RuntimeErrorKind> {
    let lo = read_byte(vm)?;
    let hi = read_byte(vm)?;
    Ok(u16::from_le_bytes([lo, hi]))
}

fn read_i16(vm: &mut VM) -> Result<i16, RuntimeErrorKind> {
    let lo = read_byte(vm)?;
    let hi = read_byte(vm)?;
    Ok(i16::from_le_bytes([lo, hi]))
}

fn read_constant(vm: &VM, index: usize) -> Result<Value, RuntimeErrorKind> {
    vm.frames
        .last()
        .and_then(|frame| vm.heap.function(frame.function))
        .and_then(|function| function.chunk.constant(index))
        .ok_or(RuntimeErrorKind::InvalidBytecode("constant index out of range"))
}

/// 读取单字节常量索引，取出变量名的表键
fn read_name(vm: &mut VM) -> Result<Key, RuntimeErrorKind> {
    let index = read_byte(vm)? as usize;
    read_constant(vm, index)?
        .as_obj()
        .and_then(|handle| vm.heap.key(handle))
        .ok_or(RuntimeErrorKind::InvalidBytecode("variable name is not a string"))
}

fn undefined_variable(vm: &VM, key: Key) -> RuntimeErrorKind {
    let name = vm
        .heap
        .string(key.handle)
        .map(|s| s.chars.to_string())
        .unwrap_or_default();
    RuntimeErrorKind::UndefinedVariable(name)
}

/// ip 相对于操作数之后的位置偏移
fn jump(vm: &mut VM, offset: i16) -> Result<(), RuntimeErrorKind> {
    let frame = vm
        .frames
        .last_mut()
        .ok_or(RuntimeErrorKind::InvalidBytecode("no active call frame"))?;
    frame.ip = frame
        .ip
        .checked_add_signed(offset as isize)
        .ok_or(RuntimeErrorKind::InvalidBytecode("jump target out of range"))?;
    Ok(())
}

#[cfg(feature = "trace_execution")]
fn trace_instruction(vm: &VM) {
    let Some(frame) = vm.frames.last() else {
        return;
    };
    let Some(function) = vm.heap.function(frame.function) else {
        return;
    };
    let stack: String = vm
        .stack
        .iter()
        .map(|value| format!("[ {} ]", vm.heap.display(*value)))
        .collect();
    let mut instruction = String::new();
    crate::debug::disassemble_instruction(&function.chunk, &vm.heap, frame.ip, &mut instruction);
    tracing::trace!(target: "lox::vm", stack = %stack, "{}", instruction.trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Chunk;
    use crate::object::ObjFunction;
    use crate::vm::{CallFrame, SharedOutput};

    /// 直接执行手工构造的 chunk
    fn run_chunk(chunk: Chunk) -> (VM, Result<(), RuntimeError>, SharedOutput) {
        let out = SharedOutput::new();
        let mut vm = VM::new().with_output(out.clone());
        let mut function = ObjFunction::new(None);
        function.chunk = chunk;
        let handle = vm.heap.new_function(function);
        stack::push(&mut vm, Value::Obj(handle)).unwrap();
        vm.frames.push(CallFrame {
            function: handle,
            ip: 0,
            slot_base: 0,
        });
        let result = run(&mut vm);
        (vm, result, out)
    }

    #[test]
    fn test_hand_built_arithmetic() {
        // -((1.2 + 3.4) / 5.6)
        let mut chunk = Chunk::new();
        for n in [1.2, 3.4] {
            let idx = chunk.add_constant(Value::Number(n));
            chunk.write_op_u8(OpCode::Constant, idx as u8, 1);
        }
        chunk.write_op(OpCode::Add, 1);
        let idx = chunk.add_constant(Value::Number(5.6));
        chunk.write_op_u8(OpCode::Constant, idx as u8, 1);
        chunk.write_op(OpCode::Divide, 1);
        chunk.write_op(OpCode::Negate, 1);
        chunk.write_op(OpCode::Return, 1);

        let (vm, result, _) = run_chunk(chunk);
        assert!(result.is_ok());
        let value = vm.last_value().as_number().unwrap();
        assert!((value + (1.2 + 3.4) / 5.6).abs() < 1e-12);
        assert_eq!(vm.stack_len(), 0);
    }

    #[test]
    fn test_wide_constant() {
        let mut chunk = Chunk::new();
        for i in 0..300 {
            chunk.add_constant(Value::Number(i as f64));
        }
        chunk.write_op_u16(OpCode::ConstantWide, 299, 1);
        chunk.write_op(OpCode::Print, 1);
        chunk.write_op(OpCode::Nil, 1);
        chunk.write_op(OpCode::Return, 1);

        let (_, result, out) = run_chunk(chunk);
        assert!(result.is_ok());
        assert_eq!(out.contents(), "299\n");
    }

    #[test]
    fn test_unknown_opcode_is_runtime_error() {
        let mut chunk = Chunk::new();
        chunk.write(0xFF, 7);
        let (_, result, _) = run_chunk(chunk);
        let err = result.unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::UnknownOpcode(0xFF));
        assert_eq!(err.line, 7);
    }

    #[test]
    fn test_running_off_the_end() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Nil, 1);
        let (_, result, _) = run_chunk(chunk);
        assert!(matches!(
            result.unwrap_err().kind,
            RuntimeErrorKind::InvalidBytecode(_)
        ));
    }
}
