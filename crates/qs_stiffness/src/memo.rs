// crates/qs_stiffness/src/memo.rs
//! 单飞 (single-flight) 记忆化并发映射
//!
//! 键先按哈希分到若干分片，分片锁只在查找/插入单元格时持有；真正的计算在
//! 每键一个 `OnceCell` 内完成。同一键的并发调用者阻塞在单元格上直到首个
//! 计算结束，不同键互不阻塞，每个键至多成功计算一次。
//!
//! 计算失败时单元格保持为空，下一次调用会重新计算。

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

/// 分片数下限
const MIN_SHARDS: usize = 4;
/// 分片数上限
const MAX_SHARDS: usize = 20;

type Shard<K, V> = Mutex<HashMap<K, Arc<OnceCell<V>>>>;

/// 单飞记忆化映射
pub struct MemoMap<K, V> {
    shards: Vec<Shard<K, V>>,
}

impl<K, V> MemoMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// 按可用核数确定分片数（夹在 4..=20）
    #[must_use]
    pub fn new() -> Self {
        let cores = std::thread::available_parallelism().map_or(MIN_SHARDS, |n| n.get());
        Self::with_shards(cores.clamp(MIN_SHARDS, MAX_SHARDS))
    }

    /// 指定分片数
    #[must_use]
    pub fn with_shards(count: usize) -> Self {
        Self {
            shards: (0..count.max(1)).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    /// 分片数
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard(&self, key: &K) -> &Shard<K, V> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let idx = (hasher.finish() % self.shards.len() as u64) as usize;
        &self.shards[idx]
    }

    fn cell(&self, key: &K) -> Arc<OnceCell<V>> {
        let mut shard = self.shard(key).lock();
        Arc::clone(shard.entry(key.clone()).or_default())
    }

    /// 取已有值或计算
    pub fn get_or_try_insert<E>(&self, key: &K, compute: impl FnOnce() -> Result<V, E>) -> Result<V, E> {
        let cell = self.cell(key);
        cell.get_or_try_init(compute).cloned()
    }

    /// 已完成计算的值
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        let shard = self.shard(key).lock();
        shard.get(key).and_then(|cell| cell.get().cloned())
    }

    /// 已完成计算的键数
    #[must_use]
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock().values().filter(|c| c.get().is_some()).count())
            .sum()
    }

    /// 是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清空全部键
    pub fn clear(&self) {
        for shard in &self.shards {
            shard.lock().clear();
        }
    }
}

impl<K, V> Default for MemoMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_shard_bounds() {
        let memo: MemoMap<u32, u32> = MemoMap::new();
        assert!((MIN_SHARDS..=MAX_SHARDS).contains(&memo.shard_count()));
    }

    #[test]
    fn test_single_flight() {
        let memo: Arc<MemoMap<(usize, usize), Arc<f64>>> = Arc::new(MemoMap::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let memo = Arc::clone(&memo);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    memo.get_or_try_insert(&(1, 2), || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                        Ok::<_, Infallible>(Arc::new(42.0))
                    })
                    .unwrap()
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_failure_is_retried() {
        let memo: MemoMap<u8, u8> = MemoMap::with_shards(1);
        assert!(memo.get_or_try_insert(&1, || Err("boom")).is_err());
        assert!(memo.get(&1).is_none());
        assert_eq!(memo.get_or_try_insert(&1, || Ok::<_, &str>(7)), Ok(7));
        assert_eq!(memo.len(), 1);
        memo.clear();
        assert!(memo.is_empty());
    }
}
