//! 字节码块实现

use crate::error::ChunkError;
use crate::memory;
use crate::opcode::OpCode;
use crate::value::Value;

/// 字节码块
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    /// 指令字节码
    pub code: Vec<u8>,
    /// 行号信息 (与 code 一一对应)
    pub lines: Vec<usize>,
    /// 常量池
    pub constants: Vec<Value>,
}

impl Chunk {
    /// 创建新的字节码块
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入单个字节及其源码行号
    pub fn write(&mut self, byte: u8, line: usize) {
        memory::push_grow(&mut self.code, byte);
        memory::push_grow(&mut self.lines, line);
    }

    /// 写入单字节指令
    pub fn write_op(&mut self, op: OpCode, line: usize) {
        self.write(op as u8, line);
    }

    /// 写入带 u8 操作数的指令
    pub fn write_op_u8(&mut self, op: OpCode, operand: u8, line: usize) {
        self.write(op as u8, line);
        self.write(operand, line);
    }

    /// 写入带 u16 操作数的指令
    pub fn write_op_u16(&mut self, op: OpCode, operand: u16, line: usize) {
        self.write(op as u8, line);
        self.write_u16(operand, line);
    }

    fn write_u16(&mut self, value: u16, line: usize) {
        let [lo, hi] = value.to_le_bytes();
        self.write(lo, line);
        self.write(hi, line);
    }

    fn write_i16(&mut self, value: i16, line: usize) {
        let [lo, hi] = value.to_le_bytes();
        self.write(lo, line);
        self.write(hi, line);
    }

    /// 写入跳转指令 (占位，稍后 patch)，返回操作数的起始位置
    pub fn write_jump(&mut self, op: OpCode, line: usize) -> usize {
        self.write_op(op, line);
        let offset = self.code.len();
        self.write_i16(-1, line);
        offset
    }

    /// 修补跳转偏移量，使其跳到当前末尾
    ///
    /// 执行完跳转指令后 ip 指向操作数之后 (offset + 2)
    pub fn patch_jump(&mut self, offset: usize) -> Result<(), ChunkError> {
        let jump = self.code.len() - (offset + 2);
        if jump > i16::MAX as usize {
            return Err(ChunkError::JumpTooLarge);
        }
        let [lo, hi] = (jump as i16).to_le_bytes();
        self.code[offset] = lo;
        self.code[offset + 1] = hi;
        Ok(())
    }

    /// 写入循环跳转 (负向跳转)
    pub fn write_loop(&mut self, loop_start: usize, line: usize) -> Result<(), ChunkError> {
        // +3 为指令本身和 i16 操作数
        let offset = self.code.len() + 3 - loop_start;
        if offset > i16::MAX as usize {
            return Err(ChunkError::LoopTooLarge);
        }
        self.write_op(OpCode::Loop, line);
        self.write_i16(-(offset as i16), line);
        Ok(())
    }

    /// 添加常量，返回索引
    pub fn add_constant(&mut self, value: Value) -> usize {
        memory::push_grow(&mut self.constants, value);
        self.constants.len() - 1
    }

    /// 获取当前代码位置 (用于计算跳转)
    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        self.code.get(offset).copied()
    }

    pub fn line_at(&self, offset: usize) -> Option<usize> {
        self.lines.get(offset).copied()
    }

    pub fn constant(&self, index: usize) -> Option<Value> {
        self.constants.get(index).copied()
    }

    /// 读取小端 u16 操作数
    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        Some(u16::from_le_bytes([self.byte_at(offset)?, self.byte_at(offset + 1)?]))
    }

    /// 读取小端 i16 操作数
    pub fn read_i16(&self, offset: usize) -> Option<i16> {
        Some(i16::from_le_bytes([self.byte_at(offset)?, self.byte_at(offset + 1)?]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_keeps_lines_in_step() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Nil, 1);
        chunk.write_op_u8(OpCode::Constant, 0, 2);
        chunk.write_op_u16(OpCode::ConstantWide, 300, 3);
        assert_eq!(chunk.code.len(), chunk.lines.len());
        assert_eq!(chunk.lines, vec![1, 2, 2, 3, 3, 3]);
        assert_eq!(chunk.read_u16(4), Some(300));
    }

    #[test]
    fn test_constant_then_return() {
        // 加载常量后返回
        let mut chunk = Chunk::new();
        let idx = chunk.add_constant(Value::Number(1.2));
        assert_eq!(idx, 0);
        chunk.write_op_u8(OpCode::Constant, idx as u8, 123);
        chunk.write_op(OpCode::Return, 123);

        assert_eq!(chunk.code, vec![OpCode::Constant as u8, 0, OpCode::Return as u8]);
        assert_eq!(chunk.lines, vec![123, 123, 123]);
        assert_eq!(chunk.constant(0), Some(Value::Number(1.2)));
    }

    #[test]
    fn test_add_constant_indices_are_dense() {
        let mut chunk = Chunk::new();
        for i in 0..300 {
            assert_eq!(chunk.add_constant(Value::Number(i as f64)), i);
        }
        assert_eq!(chunk.constants.len(), 300);
    }

    #[test]
    fn test_patch_jump() {
        let mut chunk = Chunk::new();
        let jump = chunk.write_jump(OpCode::JumpIfFalse, 1);
        assert_eq!(chunk.read_i16(jump), Some(-1));
        chunk.write_op(OpCode::Pop, 1);
        chunk.write_op(OpCode::Nil, 1);
        chunk.patch_jump(jump).unwrap();
        assert_eq!(chunk.read_i16(jump), Some(2));
    }

    #[test]
    fn test_patch_jump_too_large() {
        let mut chunk = Chunk::new();
        let jump = chunk.write_jump(OpCode::Jump, 1);
        for _ in 0..(i16::MAX as usize + 1) {
            chunk.write_op(OpCode::Nil, 1);
        }
        assert_eq!(chunk.patch_jump(jump), Err(ChunkError::JumpTooLarge));
    }

    #[test]
    fn test_write_loop_lands_on_start() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Nil, 1);
        let loop_start = chunk.current_offset();
        chunk.write_op(OpCode::Pop, 1);
        chunk.write_loop(loop_start, 1).unwrap();

        let operand_at = chunk.len() - 2;
        let jump = chunk.read_i16(operand_at).unwrap();
        // ip 位于操作数之后
        let target = (chunk.len() as isize + jump as isize) as usize;
        assert_eq!(target, loop_start);
    }
}
