//! 对象堆
//!
//! 所有堆对象都在这里分配，并串在一条侵入式链表上（新对象在表头）。
//! 字符串在创建时驻留：内容相同的字符串只存在一份，
//! 因此字符串相等可以退化为句柄相等。

use std::fmt;

use tracing::trace;

use crate::memory;
use crate::object::{
    hash_string, NativeFn, Obj, ObjFunction, ObjKind, ObjNative, ObjRef, ObjString,
};
use crate::table::{Key, Table};
use crate::value::{format_number, Value};

/// 对象堆：对象槽位 + 全部对象链表 + 字符串驻留集
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<Option<Obj>>,
    /// 最近分配的对象
    head: Option<ObjRef>,
    /// 驻留集，只用键，值恒为 nil
    strings: Table,
    bytes_allocated: usize,
    live: usize,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self, kind: ObjKind) -> ObjRef {
        let size = kind.size_hint();
        let handle = ObjRef::new(self.objects.len() as u32);
        let obj = Obj {
            next: self.head,
            kind,
        };
        memory::push_grow(&mut self.objects, Some(obj));
        self.head = Some(handle);
        self.bytes_allocated += size;
        self.live += 1;
        trace!(target: "lox::vm", handle = handle.index(), size, "allocate object");
        handle
    }

    /// 复制字符内容创建字符串；已驻留则直接返回现有句柄
    pub fn copy_string(&mut self, chars: &str) -> ObjRef {
        let hash = hash_string(chars);
        if let Some(existing) = self.find_interned(chars, hash) {
            return existing;
        }
        self.intern(chars.into(), hash)
    }

    /// 接管已有缓冲区创建字符串；已驻留则丢弃缓冲区并返回现有句柄
    pub fn take_string(&mut self, chars: String) -> ObjRef {
        let hash = hash_string(&chars);
        if let Some(existing) = self.find_interned(&chars, hash) {
            return existing;
        }
        self.intern(chars.into_boxed_str(), hash)
    }

    fn find_interned(&self, chars: &str, hash: u32) -> Option<ObjRef> {
        let objects = &self.objects;
        self.strings.find_interned(hash, |candidate| {
            matches!(
                objects.get(candidate.index()),
                Some(Some(Obj { kind: ObjKind::String(s), .. })) if &*s.chars == chars
            )
        })
    }

    fn intern(&mut self, chars: Box<str>, hash: u32) -> ObjRef {
        let handle = self.allocate(ObjKind::String(ObjString { chars, hash }));
        self.strings.set(Key::new(handle, hash), Value::Nil);
        handle
    }

    pub fn new_function(&mut self, function: ObjFunction) -> ObjRef {
        self.allocate(ObjKind::Function(function))
    }

    pub fn new_native(&mut self, name: &'static str, arity: u8, function: NativeFn) -> ObjRef {
        self.allocate(ObjKind::Native(ObjNative {
            name,
            arity,
            function,
        }))
    }

    pub fn get(&self, handle: ObjRef) -> Option<&Obj> {
        self.objects.get(handle.index()).and_then(Option::as_ref)
    }

    pub fn string(&self, handle: ObjRef) -> Option<&ObjString> {
        match self.get(handle) {
            Some(Obj {
                kind: ObjKind::String(s),
                ..
            }) => Some(s),
            _ => None,
        }
    }

    pub fn function(&self, handle: ObjRef) -> Option<&ObjFunction> {
        match self.get(handle) {
            Some(Obj {
                kind: ObjKind::Function(f),
                ..
            }) => Some(f),
            _ => None,
        }
    }

    pub fn native(&self, handle: ObjRef) -> Option<&ObjNative> {
        match self.get(handle) {
            Some(Obj {
                kind: ObjKind::Native(n),
                ..
            }) => Some(n),
            _ => None,
        }
    }

    /// 字符串值对应的表键
    pub fn key(&self, handle: ObjRef) -> Option<Key> {
        self.string(handle).map(|s| Key::new(handle, s.hash))
    }

    pub fn is_string(&self, value: Value) -> bool {
        matches!(value, Value::Obj(h) if self.string(h).is_some())
    }

    /// 查找已驻留的字符串（不创建）
    pub fn interned(&self, chars: &str) -> Option<ObjRef> {
        self.find_interned(chars, hash_string(chars))
    }

    pub fn interned_count(&self) -> usize {
        self.strings.len()
    }

    /// 存活对象数
    pub fn object_count(&self) -> usize {
        self.live
    }

    pub fn bytes_allocated(&self) -> usize {
        self.bytes_allocated
    }

    /// 沿对象链表遍历，从最新分配的对象开始
    pub fn objects(&self) -> ObjectIter<'_> {
        ObjectIter {
            heap: self,
            cursor: self.head,
        }
    }

    /// 沿链表逐个释放全部对象，返回释放数量
    pub fn free_objects(&mut self) -> usize {
        let mut freed = 0;
        let mut cursor = self.head.take();
        while let Some(handle) = cursor {
            let Some(obj) = self.objects.get_mut(handle.index()).and_then(Option::take) else {
                break;
            };
            cursor = obj.next;
            self.bytes_allocated = self.bytes_allocated.saturating_sub(obj.kind.size_hint());
            freed += 1;
        }
        self.objects.clear();
        self.strings.clear();
        self.live = 0;
        trace!(target: "lox::vm", freed, "free objects");
        freed
    }

    /// 值的打印适配器
    pub fn display(&self, value: Value) -> ValueDisplay<'_> {
        ValueDisplay { heap: self, value }
    }
}

pub struct ObjectIter<'a> {
    heap: &'a Heap,
    cursor: Option<ObjRef>,
}

impl<'a> Iterator for ObjectIter<'a> {
    type Item = (ObjRef, &'a Obj);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.cursor?;
        let obj = self.heap.get(handle)?;
        self.cursor = obj.next;
        Some((handle, obj))
    }
}

/// 按语言的打印规则格式化值
pub struct ValueDisplay<'a> {
    heap: &'a Heap,
    value: Value,
}

impl fmt::Display for ValueDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(n)),
            Value::Obj(handle) => match self.heap.get(handle).map(|obj| &obj.kind) {
                Some(ObjKind::String(s)) => write!(f, "{}", s.chars),
                Some(ObjKind::Function(function)) => {
                    match function.name.and_then(|name| self.heap.string(name)) {
                        Some(name) => write!(f, "<fn {}>", name.chars),
                        None => write!(f, "<script>"),
                    }
                }
                Some(ObjKind::Native(_)) => write!(f, "<native fn>"),
                None => write!(f, "<freed object>"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjType;

    #[test]
    fn test_copy_string_interns() {
        let mut heap = Heap::new();
        let a = heap.copy_string("hello");
        let b = heap.copy_string("hello");
        let c = heap.copy_string("world");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(heap.interned_count(), 2);
        assert_eq!(heap.object_count(), 2);
    }

    #[test]
    fn test_take_string_returns_existing() {
        let mut heap = Heap::new();
        let a = heap.copy_string("abc");
        let b = heap.take_string(String::from("ab") + "c");
        assert_eq!(a, b);
        assert_eq!(heap.object_count(), 1);
    }

    #[test]
    fn test_empty_string_is_interned() {
        let mut heap = Heap::new();
        let a = heap.copy_string("");
        let b = heap.take_string(String::new());
        assert_eq!(a, b);
        assert_eq!(heap.string(a).map(|s| s.len()), Some(0));
    }

    #[test]
    fn test_object_list_newest_first() {
        let mut heap = Heap::new();
        let s = heap.copy_string("s");
        let f = heap.new_function(ObjFunction::new(Some(s)));
        let order: Vec<_> = heap.objects().map(|(h, o)| (h, o.obj_type())).collect();
        assert_eq!(order, vec![(f, ObjType::Function), (s, ObjType::String)]);
    }

    #[test]
    fn test_free_objects_walks_whole_list() {
        let mut heap = Heap::new();
        for i in 0..10 {
            heap.copy_string(&format!("s{i}"));
        }
        heap.new_function(ObjFunction::new(None));
        assert!(heap.bytes_allocated() > 0);

        assert_eq!(heap.free_objects(), 11);
        assert_eq!(heap.object_count(), 0);
        assert_eq!(heap.interned_count(), 0);
        assert_eq!(heap.bytes_allocated(), 0);
        assert_eq!(heap.objects().count(), 0);
        // 再次释放是空操作
        assert_eq!(heap.free_objects(), 0);
    }

    #[test]
    fn test_display() {
        let mut heap = Heap::new();
        let s = heap.copy_string("hi");
        let name = heap.copy_string("add");
        let f = heap.new_function(ObjFunction::new(Some(name)));
        let script = heap.new_function(ObjFunction::new(None));
        let native = heap.new_native("clock", 0, |_| Value::Nil);

        assert_eq!(heap.display(Value::Obj(s)).to_string(), "hi");
        assert_eq!(heap.display(Value::Obj(f)).to_string(), "<fn add>");
        assert_eq!(heap.display(Value::Obj(script)).to_string(), "<script>");
        assert_eq!(heap.display(Value::Obj(native)).to_string(), "<native fn>");
        assert_eq!(heap.display(Value::Number(7.0)).to_string(), "7");
        assert_eq!(heap.display(Value::TRUE).to_string(), "true");
        assert_eq!(heap.display(Value::Nil).to_string(), "nil");
    }

    #[test]
    fn test_typed_accessors() {
        let mut heap = Heap::new();
        let s = heap.copy_string("x");
        assert!(heap.string(s).is_some());
        assert!(heap.function(s).is_none());
        assert!(heap.is_string(Value::Obj(s)));
        assert!(!heap.is_string(Value::Number(1.0)));
        assert_eq!(heap.key(s).map(|k| k.hash), Some(hash_string("x")));
        assert_eq!(heap.interned("x"), Some(s));
        assert_eq!(heap.interned("y"), None);
    }
}
