//! 内存管理
//!
//! 所有可增长结构（Chunk 的 code/lines/constants、Table 的槽位数组、堆的对象槽）
//! 都经由这里决定何时扩容、扩到多大。这是将来接入垃圾回收或自定义分配器的唯一拦截点。

/// 首次分配的最小容量
pub const MIN_CAPACITY: usize = 8;

/// 计算下一个容量：不足 8 时取 8，否则翻倍
#[inline]
pub fn grow_capacity(capacity: usize) -> usize {
    if capacity < MIN_CAPACITY {
        MIN_CAPACITY
    } else {
        capacity * 2
    }
}

/// 追加一个元素，容量用尽时按 [`grow_capacity`] 扩容
///
/// 返回本次追加是否触发了扩容
#[inline]
pub fn push_grow<T>(vec: &mut Vec<T>, value: T) -> bool {
    let grew = vec.len() == vec.capacity();
    if grew {
        let new_capacity = grow_capacity(vec.capacity());
        vec.reserve_exact(new_capacity - vec.len());
    }
    vec.push(value);
    grew
}

/// 分配一个定长槽位数组，每个槽位以 `fill` 初始化
pub fn allocate_slots<T: Clone>(capacity: usize, fill: T) -> Vec<T> {
    vec![fill; capacity]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grow_capacity() {
        assert_eq!(grow_capacity(0), 8);
        assert_eq!(grow_capacity(7), 8);
        assert_eq!(grow_capacity(8), 16);
        assert_eq!(grow_capacity(16), 32);
    }

    #[test]
    fn test_push_grow_reports_growth() {
        let mut v: Vec<u8> = Vec::new();
        assert!(push_grow(&mut v, 1));
        assert!(v.capacity() >= 8);

        for i in 1..8 {
            assert!(!push_grow(&mut v, i));
        }
        // 第 9 个元素触发第二次扩容
        assert!(push_grow(&mut v, 9));
        assert!(v.capacity() >= 16);
        assert_eq!(v.len(), 9);
    }

    #[test]
    fn test_allocate_slots() {
        let slots = allocate_slots(8, 0u32);
        assert_eq!(slots.len(), 8);
        assert!(slots.iter().all(|s| *s == 0));
    }
}
