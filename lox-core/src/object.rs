//! 堆对象类型
//!
//! 每个对象都带有公共头（`next` 链接）和具体载荷。对象通过 [`ObjRef`]
//! 句柄引用，句柄相等即对象同一。

use crate::chunk::Chunk;
use crate::value::Value;

/// 堆对象句柄（对象槽位下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjRef(u32);

impl ObjRef {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// 对象类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjType {
    String,
    Function,
    Native,
}

/// 对象：公共头 + 载荷
#[derive(Debug)]
pub struct Obj {
    /// 全部对象链表中的下一个（更早分配的）对象
    pub(crate) next: Option<ObjRef>,
    pub kind: ObjKind,
}

impl Obj {
    pub fn obj_type(&self) -> ObjType {
        self.kind.obj_type()
    }
}

#[derive(Debug)]
pub enum ObjKind {
    String(ObjString),
    Function(ObjFunction),
    Native(ObjNative),
}

impl ObjKind {
    pub fn obj_type(&self) -> ObjType {
        match self {
            ObjKind::String(_) => ObjType::String,
            ObjKind::Function(_) => ObjType::Function,
            ObjKind::Native(_) => ObjType::Native,
        }
    }

    /// 估算对象占用的字节数（记账用）
    pub(crate) fn size_hint(&self) -> usize {
        let payload = match self {
            ObjKind::String(s) => s.chars.len(),
            ObjKind::Function(f) => {
                f.chunk.code.capacity()
                    + f.chunk.lines.capacity() * std::mem::size_of::<usize>()
                    + f.chunk.constants.capacity() * std::mem::size_of::<Value>()
            }
            ObjKind::Native(_) => 0,
        };
        std::mem::size_of::<Obj>() + payload
    }
}

/// 不可变字符串，创建时缓存哈希
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjString {
    pub chars: Box<str>,
    pub hash: u32,
}

impl ObjString {
    pub fn as_str(&self) -> &str {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

/// 编译后的函数
#[derive(Debug, Default)]
pub struct ObjFunction {
    pub arity: u8,
    pub chunk: Chunk,
    /// 函数名（驻留字符串），顶层脚本为 None
    pub name: Option<ObjRef>,
}

impl ObjFunction {
    pub fn new(name: Option<ObjRef>) -> Self {
        Self {
            arity: 0,
            chunk: Chunk::new(),
            name,
        }
    }
}

/// 原生函数签名
pub type NativeFn = fn(&[Value]) -> Value;

/// 宿主提供的原生函数
#[derive(Debug, Clone)]
pub struct ObjNative {
    pub name: &'static str,
    pub arity: u8,
    pub function: NativeFn,
}

/// FNV-1a 32 位哈希
pub fn hash_string(chars: &str) -> u32 {
    let mut hash: u32 = 2_166_136_261;
    for byte in chars.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(16_777_619);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_known_values() {
        assert_eq!(hash_string(""), 2_166_136_261);
        assert_eq!(hash_string("a"), 0xe40c_292c);
        assert_eq!(hash_string("foobar"), 0xbf9c_f968);
    }

    #[test]
    fn test_obj_type() {
        let kind = ObjKind::String(ObjString {
            chars: "x".into(),
            hash: hash_string("x"),
        });
        assert_eq!(kind.obj_type(), ObjType::String);
        assert_eq!(
            ObjKind::Function(ObjFunction::new(None)).obj_type(),
            ObjType::Function
        );
    }
}
