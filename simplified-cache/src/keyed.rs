use std::sync::{Mutex, MutexGuard, PoisonError};

use ahash::{AHashMap, RandomState};
use moka::sync::Cache;

use crate::CacheKey;

/// One namespace of a [`KeyedCache`].
pub type CacheGroup<V> = Cache<CacheKey, V, RandomState>;

/// Namespaced memoization store.
///
/// Built without capacity or TTL: an entry lives until a write path clears its key or its
/// whole group. Coherence with the backing store depends entirely on those clears.
///
/// Every clear bumps its group's generation. A reader that fetched from the backing store
/// stores its result through [`KeyedCache::set_if_unchanged`] with the generation it saw
/// before the fetch, so a result read before a concurrent write is never kept.
pub struct KeyedCache<V> {
    groups: Cache<String, CacheGroup<V>, RandomState>,
    generations: Mutex<AHashMap<String, u64>>,
}

impl<V> KeyedCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            groups: Cache::builder().build_with_hasher(RandomState::new()),
            generations: Mutex::new(AHashMap::new()),
        }
    }

    fn generations(&self) -> MutexGuard<'_, AHashMap<String, u64>> {
        self.generations.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn group(&self, name: &str) -> CacheGroup<V> {
        self.groups.get_with(name.to_string(), || {
            Cache::builder().build_with_hasher(RandomState::new())
        })
    }

    pub fn get(&self, group: &str, key: &str) -> Option<V> {
        self.groups.get(group)?.get(key)
    }

    pub fn set(&self, group: &str, key: CacheKey, value: V) {
        self.group(group).insert(key, value);
    }

    /// Current generation of `group`; starts at zero and grows with every clear.
    pub fn generation(&self, group: &str) -> u64 {
        self.generations().get(group).copied().unwrap_or(0)
    }

    /// Stores `value` only if `group` has not been cleared since `generation` was read.
    /// Returns whether the value was kept.
    pub fn set_if_unchanged(&self, group: &str, key: CacheKey, value: V, generation: u64) -> bool {
        let generations = self.generations();
        if generations.get(group).copied().unwrap_or(0) != generation {
            return false;
        }
        self.group(group).insert(key, value);
        true
    }

    /// Removes one key from a group.
    pub fn clear(&self, group: &str, key: &str) {
        let mut generations = self.generations();
        *generations.entry(group.to_string()).or_default() += 1;
        if let Some(entries) = self.groups.get(group) {
            entries.invalidate(key);
        }
    }

    /// Removes a whole group.
    pub fn clear_group(&self, group: &str) {
        let mut generations = self.generations();
        *generations.entry(group.to_string()).or_default() += 1;
        self.groups.invalidate(group);
    }

    pub fn contains(&self, group: &str, key: &str) -> bool {
        self.get(group, key).is_some()
    }
}

impl<V> Default for KeyedCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for KeyedCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedCache")
            .field("groups", &self.groups.entry_count())
            .field("generations", &self.generations().len())
            .finish()
    }
}
