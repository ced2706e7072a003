//! 反汇编器
//!
//! 输出形如 `0003    2 OP_CONSTANT         1 '3.5'` 的清单；
//! 同一行号的连续指令以 `|` 代替行号。

use std::fmt::Write;

use crate::chunk::Chunk;
use crate::heap::Heap;
use crate::object::ObjRef;
use crate::opcode::OpCode;
use crate::value::Value;

/// 反汇编堆中的函数，标题用其打印形式（`<script>`、`<fn name>`）
pub fn disassemble_function(heap: &Heap, function: ObjRef) -> String {
    match heap.function(function) {
        Some(f) => {
            let name = heap.display(Value::Obj(function)).to_string();
            disassemble_chunk(&f.chunk, heap, &name)
        }
        None => String::new(),
    }
}

/// 反汇编整个 chunk，常量池中的嵌套函数随后递归列出
pub fn disassemble_chunk(chunk: &Chunk, heap: &Heap, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {name} ==");

    let mut offset = 0;
    while offset < chunk.len() {
        offset = disassemble_instruction(chunk, heap, offset, &mut out);
    }

    for constant in &chunk.constants {
        let Some(handle) = constant.as_obj() else {
            continue;
        };
        if let Some(function) = heap.function(handle) {
            let nested = heap.display(*constant).to_string();
            out.push_str(&disassemble_chunk(&function.chunk, heap, &nested));
        }
    }
    out
}

/// 解码 `offset` 处的一条指令写入 `out`，返回下一条指令的偏移
pub fn disassemble_instruction(chunk: &Chunk, heap: &Heap, offset: usize, out: &mut String) -> usize {
    let _ = write!(out, "{offset:04} ");
    let line = chunk.line_at(offset).unwrap_or(0);
    if offset > 0 && chunk.line_at(offset - 1) == Some(line) {
        out.push_str("   | ");
    } else {
        let _ = write!(out, "{line:4} ");
    }

    let byte = chunk.byte_at(offset).unwrap_or(0);
    let Some(op) = OpCode::from_byte(byte) else {
        let _ = writeln!(out, "Unknown opcode {byte}");
        return offset + 1;
    };

    use OpCode::*;
    match op {
        Constant => match chunk.byte_at(offset + 1) {
            Some(index) => constant_instruction(op, chunk, heap, index as usize, offset + 2, out),
            None => truncated(op, chunk, out),
        },
        ConstantWide => match chunk.read_u16(offset + 1) {
            Some(index) => constant_instruction(op, chunk, heap, index as usize, offset + 3, out),
            None => truncated(op, chunk, out),
        },
        GetLocal | SetLocal | Call => match chunk.byte_at(offset + 1) {
            Some(operand) => {
                let _ = writeln!(out, "{:<16} {:4}", op.name(), operand);
                offset + 2
            }
            None => truncated(op, chunk, out),
        },
        GetGlobal | DefineGlobal | SetGlobal => match chunk.byte_at(offset + 1) {
            Some(index) => constant_instruction(op, chunk, heap, index as usize, offset + 2, out),
            None => truncated(op, chunk, out),
        },
        Jump | JumpIfFalse | Loop => match chunk.read_i16(offset + 1) {
            Some(jump) => {
                let target = (offset as isize + 3 + jump as isize) as usize;
                let _ = writeln!(out, "{:<16} {:4} -> {}", op.name(), offset, target);
                offset + 3
            }
            None => truncated(op, chunk, out),
        },
        _ => {
            let _ = writeln!(out, "{}", op.name());
            offset + 1
        }
    }
}

fn constant_instruction(
    op: OpCode,
    chunk: &Chunk,
    heap: &Heap,
    index: usize,
    next: usize,
    out: &mut String,
) -> usize {
    let _ = write!(out, "{:<16} {:4} ", op.name(), index);
    match chunk.constant(index) {
        Some(value) => {
            let _ = writeln!(out, "'{}'", heap.display(value));
        }
        None => out.push_str("<bad constant>\n"),
    }
    next
}

fn truncated(op: OpCode, chunk: &Chunk, out: &mut String) -> usize {
    let _ = writeln!(out, "{} <truncated>", op.name());
    chunk.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::value::Value;

    #[test]
    fn test_constant_and_return_listing() {
        let heap = Heap::new();
        let mut chunk = Chunk::new();
        let idx = chunk.add_constant(Value::Number(1.2));
        chunk.write_op_u8(OpCode::Constant, idx as u8, 123);
        chunk.write_op(OpCode::Return, 123);

        let listing = disassemble_chunk(&chunk, &heap, "test chunk");
        assert_eq!(
            listing,
            "== test chunk ==\n\
             0000  123 OP_CONSTANT         0 '1.2'\n\
             0002    | OP_RETURN\n"
        );
    }

    #[test]
    fn test_jump_target() {
        let heap = Heap::new();
        let mut chunk = Chunk::new();
        let jump = chunk.write_jump(OpCode::JumpIfFalse, 1);
        chunk.write_op(OpCode::Pop, 2);
        chunk.patch_jump(jump).unwrap();

        let mut out = String::new();
        let next = disassemble_instruction(&chunk, &heap, 0, &mut out);
        assert_eq!(next, 3);
        assert_eq!(out, "0000    1 OP_JUMP_IF_FALSE    0 -> 4\n");
    }

    #[test]
    fn test_unknown_opcode() {
        let heap = Heap::new();
        let mut chunk = Chunk::new();
        chunk.write(0xFF, 1);
        let mut out = String::new();
        assert_eq!(disassemble_instruction(&chunk, &heap, 0, &mut out), 1);
        assert!(out.contains("Unknown opcode 255"));
    }

    #[test]
    fn test_traversal_consumes_whole_chunk() {
        let mut heap = Heap::new();
        let source = "var a = 1; { var b = a; b = b + 2; print b; }\n\
                      for (var i = 0; i < 3; i = i + 1) { if (i == 1 or false) print i; }\n\
                      fun f(x) { return x and !x; } print f(1);";
        let script = compile(source, &mut heap).unwrap();
        let mut chunks = vec![&heap.function(script).unwrap().chunk];
        for c in &heap.function(script).unwrap().chunk.constants {
            if let Some(f) = c.as_obj().and_then(|h| heap.function(h)) {
                chunks.push(&f.chunk);
            }
        }

        for chunk in chunks {
            let mut out = String::new();
            let mut offset = 0;
            while offset < chunk.len() {
                offset = disassemble_instruction(chunk, &heap, offset, &mut out);
            }
            assert_eq!(offset, chunk.len());
            assert!(!out.contains("Unknown opcode"));
        }
    }

    #[test]
    fn test_nested_function_listed() {
        let mut heap = Heap::new();
        let script = compile("fun add(a, b) { return a + b; }", &mut heap).unwrap();
        let listing = disassemble_function(&heap, script);
        assert!(listing.starts_with("== <script> ==\n"));
        assert!(listing.contains("== <fn add> =="));
        assert!(listing.contains("OP_GET_LOCAL        1"));
        assert!(listing.contains("OP_ADD"));
    }
}
