//! 堆、驻留与哈希表测试

mod common;
use common::run_code;
use lox_core::{
    disassemble_instruction, Chunk, Heap, InterpretResult, Key, ObjType, OpCode, Table, Value, VM,
};

fn keys(heap: &mut Heap, prefix: &str, range: std::ops::Range<usize>) -> Vec<Key> {
    range
        .map(|i| {
            let handle = heap.copy_string(&format!("{prefix}{i}"));
            heap.key(handle).unwrap()
        })
        .collect()
}

#[test]
fn test_table_insert_delete_reinsert() {
    // 100 次插入、50 次删除、50 次新插入
    let mut heap = Heap::new();
    let first = keys(&mut heap, "k", 0..100);
    let second = keys(&mut heap, "n", 0..50);

    let mut table = Table::new();
    for (i, key) in first.iter().enumerate() {
        assert!(table.set(*key, Value::Number(i as f64)));
    }
    for key in first.iter().step_by(2) {
        assert!(table.delete(*key));
    }
    for (i, key) in second.iter().enumerate() {
        assert!(table.set(*key, Value::Number(1000.0 + i as f64)));
    }

    assert_eq!(table.len(), 100);
    for (i, key) in first.iter().enumerate() {
        let expected = if i % 2 == 0 {
            None
        } else {
            Some(Value::Number(i as f64))
        };
        assert_eq!(table.get(*key), expected);
    }
    for (i, key) in second.iter().enumerate() {
        assert_eq!(table.get(*key), Some(Value::Number(1000.0 + i as f64)));
    }
}

#[test]
fn test_deleted_key_can_be_set_again() {
    let mut heap = Heap::new();
    let key = keys(&mut heap, "x", 0..1)[0];
    let mut table = Table::new();
    table.set(key, Value::Number(1.0));
    assert!(table.delete(key));
    assert_eq!(table.get(key), None);
    assert!(table.set(key, Value::Number(2.0)));
    assert_eq!(table.get(key), Some(Value::Number(2.0)));
}

#[test]
fn test_concatenation_is_identical_to_literal() {
    let mut vm = VM::new();
    assert_eq!(
        vm.interpret(r#"var joined = "foo" + "bar"; var literal = "foobar";"#),
        InterpretResult::Ok
    );
    let joined = vm.get_global("joined").unwrap();
    let literal = vm.get_global("literal").unwrap();
    assert_eq!(joined, literal);
    assert_eq!(joined.as_obj(), vm.heap().interned("foobar"));
}

#[test]
fn test_string_equality_in_language() {
    let result = run_code(r#"var a = "ab"; return a == "a" + "b";"#).unwrap();
    assert_eq!(result.return_value, Value::TRUE);
}

#[test]
fn test_interning_dedupes_across_runs() {
    let mut vm = VM::new();
    assert!(vm.interpret(r#"var s = "same";"#).is_ok());
    let count = vm.heap().interned_count();
    assert!(vm.interpret(r#"var t = "same";"#).is_ok());
    // 只新增了变量名 "t"
    assert_eq!(vm.heap().interned_count(), count + 1);
}

#[test]
fn test_chunk_constants_grow() {
    let mut chunk = Chunk::new();
    for i in 0..9 {
        chunk.add_constant(Value::Number(i as f64));
    }
    assert!(chunk.constants.capacity() >= 16);
    for i in 0..9 {
        assert_eq!(chunk.constant(i), Some(Value::Number(i as f64)));
    }
}

#[test]
fn test_chunk_traversal_consumes_exact_length() {
    let mut heap = Heap::new();
    let mut chunk = Chunk::new();
    let name = heap.copy_string("g");
    let idx = chunk.add_constant(Value::Obj(name)) as u8;
    chunk.write_op(OpCode::Nil, 1);
    chunk.write_op_u8(OpCode::DefineGlobal, idx, 1);
    chunk.write_op_u8(OpCode::GetGlobal, idx, 2);
    let jump = chunk.write_jump(OpCode::JumpIfFalse, 2);
    chunk.write_op(OpCode::Pop, 2);
    chunk.patch_jump(jump).unwrap();
    chunk.write_loop(0, 3).unwrap();
    chunk.write_op_u16(OpCode::ConstantWide, 0, 3);
    chunk.write_op_u8(OpCode::Call, 0, 3);
    chunk.write_op(OpCode::Return, 3);

    let mut offset = 0;
    let mut count = 0;
    let mut listing = String::new();
    while offset < chunk.len() {
        offset = disassemble_instruction(&chunk, &heap, offset, &mut listing);
        count += 1;
    }
    assert_eq!(offset, chunk.len());
    assert_eq!(count, 9);
}

#[test]
fn test_vm_free_releases_heap() {
    let mut vm = VM::new();
    assert!(vm
        .interpret(r#"fun f(a) { return a + "!"; } var r = f("x");"#)
        .is_ok());
    let types: Vec<ObjType> = vm.heap().objects().map(|(_, obj)| obj.obj_type()).collect();
    assert!(types.contains(&ObjType::Function));
    assert!(types.contains(&ObjType::Native));
    assert!(types.contains(&ObjType::String));

    let live = vm.heap().object_count();
    assert_eq!(vm.free(), live);
    assert_eq!(vm.heap().object_count(), 0);
    assert!(vm.globals().is_empty());
}
