//! 操作码定义
//!
//! 按功能分段编号，同一段内连续。多字节操作数一律小端序。

/// 字节码操作码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    // ===== 常量 (0x00-0x0F) =====
    /// 加载常量 [idx:u8]
    Constant = 0x00,
    /// 加载常量 [idx:u16]
    ConstantWide = 0x01,
    Nil = 0x08,
    True = 0x09,
    False = 0x0A,

    // ===== 栈 (0x10-0x17) =====
    Pop = 0x10,

    // ===== 变量 (0x18-0x2F) =====
    /// [slot:u8]
    GetLocal = 0x18,
    /// [slot:u8]
    SetLocal = 0x19,
    /// [name_idx:u8]
    GetGlobal = 0x20,
    /// [name_idx:u8]
    DefineGlobal = 0x21,
    /// [name_idx:u8]
    SetGlobal = 0x22,

    // ===== 算术 (0x30-0x3F) =====
    Add = 0x30,
    Subtract = 0x31,
    Multiply = 0x32,
    Divide = 0x33,
    Negate = 0x38,

    // ===== 比较与逻辑 (0x40-0x4F) =====
    Equal = 0x40,
    NotEqual = 0x41,
    Greater = 0x42,
    GreaterEqual = 0x43,
    Less = 0x44,
    LessEqual = 0x45,
    Not = 0x48,

    // ===== 控制流 (0x50-0x5F) =====
    /// [offset:i16]
    Jump = 0x50,
    /// 条件为假时跳转，不弹出条件 [offset:i16]
    JumpIfFalse = 0x51,
    /// 向后跳转 [offset:i16]
    Loop = 0x52,

    // ===== 函数 (0x60-0x6F) =====
    /// [arg_count:u8]
    Call = 0x60,
    Return = 0x61,

    // ===== 输出 (0x70-0x7F) =====
    Print = 0x70,
}

impl OpCode {
    /// 解码一个字节，未知值返回 None
    pub fn from_byte(byte: u8) -> Option<Self> {
        use OpCode::*;
        let op = match byte {
            0x00 => Constant,
            0x01 => ConstantWide,
            0x08 => Nil,
            0x09 => True,
            0x0A => False,
            0x10 => Pop,
            0x18 => GetLocal,
            0x19 => SetLocal,
            0x20 => GetGlobal,
            0x21 => DefineGlobal,
            0x22 => SetGlobal,
            0x30 => Add,
            0x31 => Subtract,
            0x32 => Multiply,
            0x33 => Divide,
            0x38 => Negate,
            0x40 => Equal,
            0x41 => NotEqual,
            0x42 => Greater,
            0x43 => GreaterEqual,
            0x44 => Less,
            0x45 => LessEqual,
            0x48 => Not,
            0x50 => Jump,
            0x51 => JumpIfFalse,
            0x52 => Loop,
            0x60 => Call,
            0x61 => Return,
            0x70 => Print,
            _ => return None,
        };
        Some(op)
    }

    /// 获取操作码名称（用于反汇编）
    pub fn name(&self) -> &'static str {
        use OpCode::*;
        match self {
            Constant => "OP_CONSTANT",
            ConstantWide => "OP_CONSTANT_WIDE",
            Nil => "OP_NIL",
            True => "OP_TRUE",
            False => "OP_FALSE",
            Pop => "OP_POP",
            GetLocal => "OP_GET_LOCAL",
            SetLocal => "OP_SET_LOCAL",
            GetGlobal => "OP_GET_GLOBAL",
            DefineGlobal => "OP_DEFINE_GLOBAL",
            SetGlobal => "OP_SET_GLOBAL",
            Add => "OP_ADD",
            Subtract => "OP_SUBTRACT",
            Multiply => "OP_MULTIPLY",
            Divide => "OP_DIVIDE",
            Negate => "OP_NEGATE",
            Equal => "OP_EQUAL",
            NotEqual => "OP_NOT_EQUAL",
            Greater => "OP_GREATER",
            GreaterEqual => "OP_GREATER_EQUAL",
            Less => "OP_LESS",
            LessEqual => "OP_LESS_EQUAL",
            Not => "OP_NOT",
            Jump => "OP_JUMP",
            JumpIfFalse => "OP_JUMP_IF_FALSE",
            Loop => "OP_LOOP",
            Call => "OP_CALL",
            Return => "OP_RETURN",
            Print => "OP_PRINT",
        }
    }

    /// 操作数字节数
    pub fn operand_size(&self) -> usize {
        use OpCode::*;
        match self {
            Constant | GetLocal | SetLocal | GetGlobal | DefineGlobal | SetGlobal | Call => 1,
            ConstantWide | Jump | JumpIfFalse | Loop => 2,
            _ => 0,
        }
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        OpCode::from_byte(byte).ok_or(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_decode_roundtrip_all() {
        let mut known = 0;
        for byte in 0..=u8::MAX {
            if let Some(op) = OpCode::from_byte(byte) {
                assert_eq!(op as u8, byte);
                known += 1;
            }
        }
        assert_eq!(known, 29);
    }

    #[test]
    fn test_unknown_byte() {
        assert_eq!(OpCode::try_from(0xFF), Err(0xFF));
        assert_eq!(OpCode::from_byte(0x02), None);
    }

    #[test]
    fn test_operand_size() {
        assert_eq!(OpCode::Return.operand_size(), 0);
        assert_eq!(OpCode::Constant.operand_size(), 1);
        assert_eq!(OpCode::Loop.operand_size(), 2);
    }
}
