//! 哈希表：开放寻址 + 线性探测 + 墓碑删除
//!
//! 键是驻留字符串，按句柄比较。容量总是 2 的幂，用掩码代替取模。
//! `count` 同时计入存活条目和墓碑，装载因子用它来算，
//! 这保证探测序列里总能遇到空槽。

use crate::memory;
use crate::object::ObjRef;
use crate::value::Value;

/// 最大装载因子
pub const TABLE_MAX_LOAD: f64 = 0.75;

/// 表键：驻留字符串句柄 + 其缓存哈希
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    pub handle: ObjRef,
    pub hash: u32,
}

impl Key {
    pub fn new(handle: ObjRef, hash: u32) -> Self {
        Self { handle, hash }
    }
}

#[derive(Debug, Clone, Copy)]
enum Entry {
    Empty,
    Tombstone,
    Occupied(Key, Value),
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    /// 存活条目 + 墓碑
    count: usize,
    /// 存活条目
    live: usize,
    entries: Vec<Entry>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// 存活条目数
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// 已占用的槽位数（含墓碑）
    pub fn used_slots(&self) -> usize {
        self.count
    }

    pub fn get(&self, key: Key) -> Option<Value> {
        if self.count == 0 {
            return None;
        }
        match self.entries[find_entry(&self.entries, key)] {
            Entry::Occupied(_, value) => Some(value),
            _ => None,
        }
    }

    pub fn contains(&self, key: Key) -> bool {
        self.get(key).is_some()
    }

    /// 插入或覆盖，返回键是否为新插入
    pub fn set(&mut self, key: Key, value: Value) -> bool {
        if (self.count + 1) as f64 > self.capacity() as f64 * TABLE_MAX_LOAD {
            let capacity = memory::grow_capacity(self.capacity());
            self.adjust_capacity(capacity);
        }

        let index = find_entry(&self.entries, key);
        let entry = &mut self.entries[index];
        let is_new = !matches!(entry, Entry::Occupied(..));
        // 复用墓碑时 count 不变
        if matches!(entry, Entry::Empty) {
            self.count += 1;
        }
        if is_new {
            self.live += 1;
        }
        *entry = Entry::Occupied(key, value);
        is_new
    }

    /// 删除键，留下墓碑以保持探测链完整
    pub fn delete(&mut self, key: Key) -> bool {
        if self.count == 0 {
            return false;
        }
        let index = find_entry(&self.entries, key);
        match self.entries[index] {
            Entry::Occupied(..) => {
                self.entries[index] = Entry::Tombstone;
                self.live -= 1;
                true
            }
            _ => false,
        }
    }

    /// 按内容查找驻留字符串
    ///
    /// 哈希相同的候选交给 `matches` 比较字符内容；墓碑跳过，遇到空槽即停。
    pub fn find_interned(&self, hash: u32, matches: impl Fn(ObjRef) -> bool) -> Option<ObjRef> {
        if self.count == 0 {
            return None;
        }
        let mask = self.capacity() - 1;
        let mut index = hash as usize & mask;
        loop {
            match self.entries[index] {
                Entry::Empty => return None,
                Entry::Tombstone => {}
                Entry::Occupied(key, _) => {
                    if key.hash == hash && matches(key.handle) {
                        return Some(key.handle);
                    }
                }
            }
            index = (index + 1) & mask;
        }
    }

    /// 遍历存活条目
    pub fn iter(&self) -> impl Iterator<Item = (Key, Value)> + '_ {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Occupied(key, value) => Some((*key, *value)),
            _ => None,
        })
    }

    /// 清空并释放槽位数组
    pub fn clear(&mut self) {
        self.entries = Vec::new();
        self.count = 0;
        self.live = 0;
    }

    fn adjust_capacity(&mut self, capacity: usize) {
        let mut entries = memory::allocate_slots(capacity, Entry::Empty);
        // 重新插入时丢弃墓碑
        self.count = 0;
        for entry in &self.entries {
            if let Entry::Occupied(key, value) = *entry {
                let index = find_entry(&entries, key);
                entries[index] = Entry::Occupied(key, value);
                self.count += 1;
            }
        }
        self.entries = entries;
    }
}

/// 返回键所在槽位，或应插入的槽位（优先复用遇到的第一个墓碑）
fn find_entry(entries: &[Entry], key: Key) -> usize {
    let mask = entries.len() - 1;
    let mut index = key.hash as usize & mask;
    let mut tombstone = None;
    loop {
        match entries[index] {
            Entry::Empty => return tombstone.unwrap_or(index),
            Entry::Tombstone => {
                if tombstone.is_none() {
                    tombstone = Some(index);
                }
            }
            Entry::Occupied(existing, _) => {
                if existing.handle == key.handle {
                    return index;
                }
            }
        }
        index = (index + 1) & mask;
    }
}
