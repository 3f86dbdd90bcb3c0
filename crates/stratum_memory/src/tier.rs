// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The byte-bounded, LRU-ordered in-memory tier.
//!
//! All indices of one cache live behind a single mutex, so the whole insert-then-evict
//! sequence and the whole scan-then-expire sequence of tag invalidation are each one
//! critical section. Reads take the same lock because a hit reorders recency.

use std::{collections::HashMap, fmt, hash::Hash, sync::Arc};

use parking_lot::Mutex;
use stratum_tier::{ByteSize, CacheEntry, CacheTier, Error, Evicted, EvictionReason};

use crate::{
    budget::ByteBudget,
    builder::{L1CacheBuilder, L1Config},
    recency::{NodeIndex, RecencyList},
};

/// Bookkeeping for one resident key.
#[derive(Debug)]
struct Entry<T> {
    tag: Option<T>,
    node: NodeIndex,
    /// Bytes charged at insert time; released verbatim on removal.
    size: usize,
}

struct L1State<K, V, T> {
    values: HashMap<K, V>,
    entries: HashMap<K, Entry<T>>,
    recency: RecencyList<K>,
    budget: ByteBudget,
}

impl<K, V, T> L1State<K, V, T>
where
    K: Eq + Hash,
{
    fn remove(&mut self, key: &K) -> Option<(K, V, Entry<T>)> {
        let entry = self.entries.remove(key)?;
        let key = self.recency.remove(entry.node)?;
        let value = self.values.remove(&key)?;
        self.budget.release(entry.size);
        Some((key, value, entry))
    }
}

impl<K, V, T> L1State<K, V, T> {
    fn clear(&mut self) {
        self.values.clear();
        self.entries.clear();
        self.recency.clear();
        self.budget.reset();
    }
}

struct L1Shared<K, V, T> {
    name: Option<String>,
    state: Mutex<L1State<K, V, T>>,
}

/// An in-memory cache bounded by the total byte size of its values.
///
/// Values are measured with [`ByteSize`] when inserted. When the running total goes over
/// the limit, least recently used entries are evicted until it fits again; a value larger
/// than the whole limit is never stored. Entries may carry a tag, and
/// [`invalidate_by_tag`](Self::invalidate_by_tag) drops every entry with that tag at once.
///
/// Clones share the same storage.
///
/// # Examples
///
/// ```
/// use stratum_memory::L1Cache;
///
/// let cache = L1Cache::<String, String, &str>::with_max_bytes(1024);
///
/// let evicted = cache.insert(&"video:1".to_string(), "transcript".to_string(), Some("video_uploaded"));
/// assert!(evicted.is_empty());
/// assert_eq!(cache.get(&"video:1".to_string()).as_deref(), Some("transcript"));
///
/// assert_eq!(cache.invalidate_by_tag(&"video_uploaded"), 1);
/// assert!(cache.is_empty());
/// ```
pub struct L1Cache<K, V, T> {
    inner: Arc<L1Shared<K, V, T>>,
}

impl<K, V, T> Clone for L1Cache<K, V, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V, T> fmt::Debug for L1Cache<K, V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("L1Cache")
            .field("name", &self.inner.name)
            .field("len", &state.recency.len())
            .field("current_bytes", &state.budget.used())
            .field("max_bytes", &state.budget.max())
            .finish_non_exhaustive()
    }
}

impl<K, V, T> Default for L1Cache<K, V, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, T> L1Cache<K, V, T> {
    /// Creates a cache with the default 1 MiB budget.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a cache that holds at most `max_bytes` bytes of values.
    ///
    /// # Examples
    ///
    /// ```
    /// use stratum_memory::L1Cache;
    ///
    /// let cache = L1Cache::<String, Vec<u8>, ()>::with_max_bytes(64 * 1024);
    /// assert_eq!(cache.max_bytes(), 64 * 1024);
    /// ```
    #[must_use]
    pub fn with_max_bytes(max_bytes: usize) -> Self {
        Self::builder().max_bytes(max_bytes).build()
    }

    /// Creates a cache from deserialized configuration.
    #[must_use]
    pub fn from_config(config: &L1Config) -> Self {
        Self::builder().config(config).build()
    }

    /// Creates a builder for configuring a cache.
    ///
    /// # Examples
    ///
    /// ```
    /// use stratum_memory::L1Cache;
    ///
    /// let cache = L1Cache::<u64, String, ()>::builder()
    ///     .max_bytes(4096)
    ///     .initial_capacity(32)
    ///     .name("transcripts")
    ///     .build();
    /// assert_eq!(cache.name(), Some("transcripts"));
    /// ```
    #[must_use]
    pub fn builder() -> L1CacheBuilder<K, V, T> {
        L1CacheBuilder::new()
    }

    pub(crate) fn from_builder(builder: L1CacheBuilder<K, V, T>) -> Self {
        let capacity = builder.initial_capacity.unwrap_or(0);
        let state = L1State {
            values: HashMap::with_capacity(capacity),
            entries: HashMap::with_capacity(capacity),
            recency: RecencyList::with_capacity(capacity),
            budget: ByteBudget::new(builder.max_bytes),
        };
        Self {
            inner: Arc::new(L1Shared {
                name: builder.name,
                state: Mutex::new(state),
            }),
        }
    }

    /// Returns the name given at construction, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Returns the number of resident entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.lock().recency.len()
    }

    /// Returns `true` if no entry is resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the bytes charged by resident values.
    #[must_use]
    pub fn current_bytes(&self) -> usize {
        self.inner.state.lock().budget.used()
    }

    /// Returns the byte budget.
    #[must_use]
    pub fn max_bytes(&self) -> usize {
        self.inner.state.lock().budget.max()
    }

    /// Removes every entry and resets the byte total to zero.
    pub fn clear(&self) {
        self.inner.state.lock().clear();
    }
}

impl<K, V, T> L1Cache<K, V, T>
where
    K: Clone + Eq + Hash,
{
    /// Stores `value` under `key` and returns whatever no longer fits.
    ///
    /// A value larger than [`max_bytes`](Self::max_bytes) is not stored and comes straight
    /// back with [`EvictionReason::Oversized`]; an entry already resident under `key` is then
    /// left untouched. Otherwise the value replaces any previous one (together with its
    /// tag) and becomes the most recently used entry, after which least recently used
    /// entries are evicted until the total fits. Evictions are returned oldest first and
    /// never include `key` itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use stratum_memory::L1Cache;
    /// use stratum_tier::EvictionReason;
    ///
    /// let cache = L1Cache::<u32, u64, ()>::with_max_bytes(16);
    /// cache.insert(&1, 10, None);
    /// cache.insert(&2, 20, None);
    ///
    /// let evicted = cache.insert(&3, 30, None);
    /// assert_eq!(evicted.len(), 1);
    /// assert_eq!(*evicted[0].key(), 1);
    /// assert_eq!(evicted[0].reason(), EvictionReason::Capacity);
    /// ```
    pub fn insert(&self, key: &K, value: V, tag: Option<T>) -> Vec<Evicted<K, V, T>>
    where
        V: ByteSize,
    {
        let size = value.byte_size();
        let mut state = self.inner.state.lock();

        if !state.budget.admits(size) {
            return vec![Evicted::new(key.clone(), value, tag, EvictionReason::Oversized)];
        }

        let node = match state.entries.get(key).map(|entry| (entry.node, entry.size)) {
            Some((node, old_size)) => {
                state.budget.release(old_size);
                state.recency.move_to_back(node);
                node
            }
            None => state.recency.push_back(key.clone()),
        };
        state.entries.insert(key.clone(), Entry { tag, node, size });
        state.values.insert(key.clone(), value);
        state.budget.charge(size);

        let mut evicted = Vec::new();
        while state.budget.is_exceeded() {
            let Some(oldest) = state.recency.front().cloned() else {
                break;
            };
            match state.remove(&oldest) {
                Some((key, value, entry)) => {
                    evicted.push(Evicted::new(key, value, entry.tag, EvictionReason::Capacity));
                }
                None => break,
            }
        }
        evicted
    }

    /// Returns a clone of the value under `key` and marks it most recently used.
    ///
    /// A miss changes nothing.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let mut state = self.inner.state.lock();
        let node = state.entries.get(key)?.node;
        state.recency.move_to_back(node);
        state.values.get(key).cloned()
    }

    /// Like [`get`](Self::get), but also returns the tag the entry was stored with.
    #[must_use]
    pub fn get_entry(&self, key: &K) -> Option<CacheEntry<V, T>>
    where
        V: Clone,
        T: Clone,
    {
        let mut state = self.inner.state.lock();
        let (node, tag) = state.entries.get(key).map(|entry| (entry.node, entry.tag.clone()))?;
        state.recency.move_to_back(node);
        let value = state.values.get(key).cloned()?;
        Some(CacheEntry::with_tag(value, tag))
    }

    /// Returns `true` if `key` is resident, without touching recency.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.inner.state.lock().entries.contains_key(key)
    }

    /// Removes `key`, returning `true` if it was resident.
    ///
    /// Expiring an absent key is a no-op.
    pub fn expire(&self, key: &K) -> bool {
        self.inner.state.lock().remove(key).is_some()
    }

    /// Removes every entry tagged with `tag` and returns how many were removed.
    ///
    /// This scans all resident entries.
    pub fn invalidate_by_tag(&self, tag: &T) -> usize
    where
        T: PartialEq,
    {
        let mut state = self.inner.state.lock();
        let doomed: Vec<K> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.tag.as_ref() == Some(tag))
            .map(|(key, _)| key.clone())
            .collect();

        doomed.iter().filter(|key| state.remove(key).is_some()).count()
    }

    /// Returns the resident keys from least to most recently used.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.inner.state.lock().recency.iter().cloned().collect()
    }

    #[cfg(test)]
    fn assert_invariants(&self)
    where
        K: fmt::Debug,
        V: ByteSize,
    {
        let state = self.inner.state.lock();
        assert_eq!(state.values.len(), state.entries.len());
        assert_eq!(state.recency.len(), state.entries.len());
        for key in state.recency.iter() {
            assert!(state.values.contains_key(key));
            let entry = state.entries.get(key).expect("recency key has an entry");
            assert_eq!(state.recency.get(entry.node), Some(key));
        }

        let measured: usize = state.values.values().map(ByteSize::byte_size).sum();
        assert_eq!(state.budget.used(), measured);
        assert!(state.budget.used() <= state.budget.max() || state.recency.is_empty());
    }
}

/// The L1 can serve as a lower tier. Entries it evicts in that role are dropped.
impl<K, V, T> CacheTier<K, V, T> for L1Cache<K, V, T>
where
    K: Clone + Eq + Hash + Send,
    V: ByteSize + Clone + Send,
    T: Clone + PartialEq + Send,
{
    fn get(&self, key: &K) -> Result<Option<CacheEntry<V, T>>, Error> {
        Ok(self.get_entry(key))
    }

    fn insert(&self, key: &K, entry: CacheEntry<V, T>) -> Result<(), Error> {
        let (value, tag) = entry.into_parts();
        drop(Self::insert(self, key, value, tag));
        Ok(())
    }

    fn invalidate(&self, key: &K) -> Result<(), Error> {
        self.expire(key);
        Ok(())
    }

    fn invalidate_by_tag(&self, tag: &T) -> Result<(), Error> {
        Self::invalidate_by_tag(self, tag);
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        Self::clear(self);
        Ok(())
    }

    fn len(&self) -> Option<u64> {
        Some(Self::len(self) as u64)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    /// A value whose footprint is exactly its payload.
    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Blob(usize);

    impl ByteSize for Blob {
        fn byte_size(&self) -> usize {
            self.0
        }
    }

    fn blob_cache(max_bytes: usize) -> L1Cache<u8, Blob, u8> {
        L1Cache::with_max_bytes(max_bytes)
    }

    fn evicted_keys(evicted: &[Evicted<u8, Blob, u8>]) -> Vec<u8> {
        evicted.iter().map(|e| *e.key()).collect()
    }

    #[test]
    fn value_of_exactly_max_bytes_is_admitted() {
        let cache = blob_cache(100);
        assert!(cache.insert(&1, Blob(100), None).is_empty());
        assert!(cache.contains(&1));
        assert_eq!(cache.current_bytes(), 100);
        cache.assert_invariants();
    }

    #[test]
    fn oversized_value_leaves_existing_entry_alone() {
        let cache = blob_cache(100);
        cache.insert(&1, Blob(10), Some(3));

        let evicted = cache.insert(&1, Blob(101), None);
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].reason(), EvictionReason::Oversized);
        assert_eq!(cache.get(&1), Some(Blob(10)));
        assert_eq!(cache.invalidate_by_tag(&3), 1);
        cache.assert_invariants();
    }

    #[test]
    fn growing_reinsert_evicts_others_but_not_itself() {
        let cache = blob_cache(100);
        cache.insert(&1, Blob(30), None);
        cache.insert(&2, Blob(30), None);
        cache.insert(&3, Blob(30), None);

        let evicted = cache.insert(&2, Blob(90), None);
        assert_eq!(evicted_keys(&evicted), [1, 3]);
        assert_eq!(cache.keys(), [2]);
        assert_eq!(cache.current_bytes(), 90);
        cache.assert_invariants();
    }

    #[test]
    fn introspection_needs_no_key_bounds() {
        fn reset<K, V, T>(cache: &L1Cache<K, V, T>) -> (usize, usize) {
            cache.clear();
            (cache.len(), cache.current_bytes())
        }

        let cache = blob_cache(100);
        cache.insert(&1, Blob(40), Some(2));
        cache.insert(&2, Blob(40), None);

        assert_eq!(reset(&cache), (0, 0));
        assert!(cache.keys().is_empty());
        cache.assert_invariants();
    }

    #[test]
    fn reinsert_replaces_tag() {
        let cache = blob_cache(100);
        cache.insert(&1, Blob(1), Some(7));
        cache.insert(&1, Blob(2), Some(8));

        assert_eq!(cache.invalidate_by_tag(&7), 0);
        assert_eq!(cache.invalidate_by_tag(&8), 1);
    }

    #[test]
    fn eviction_carries_tag() {
        let cache = blob_cache(10);
        cache.insert(&1, Blob(6), Some(4));

        let evicted = cache.insert(&2, Blob(6), None);
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].tag(), Some(&4));
        assert_eq!(evicted[0].reason(), EvictionReason::Capacity);
    }

    #[test]
    fn get_miss_does_not_mutate() {
        let cache = blob_cache(10);
        cache.insert(&1, Blob(3), None);
        cache.insert(&2, Blob(3), None);

        assert_eq!(cache.get(&9), None);
        assert_eq!(cache.keys(), [1, 2]);
    }

    #[test]
    fn contains_does_not_touch_recency() {
        let cache = blob_cache(10);
        cache.insert(&1, Blob(3), None);
        cache.insert(&2, Blob(3), None);

        assert!(cache.contains(&1));
        assert_eq!(cache.keys(), [1, 2]);
    }

    #[test]
    fn clones_share_state() {
        let cache = blob_cache(10);
        let other = cache.clone();
        cache.insert(&1, Blob(3), None);

        assert_eq!(other.get(&1), Some(Blob(3)));
        other.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.current_bytes(), 0);
    }

    #[test]
    fn cache_tier_impl_delegates() {
        let cache = blob_cache(100);
        let tier: &dyn CacheTier<u8, Blob, u8> = &cache;

        tier.insert(&1, CacheEntry::tagged(Blob(5), 2)).unwrap();
        assert_eq!(tier.get(&1).unwrap(), Some(CacheEntry::tagged(Blob(5), 2)));
        assert_eq!(tier.len(), Some(1));

        tier.invalidate_by_tag(&2).unwrap();
        assert_eq!(tier.is_empty(), Some(true));
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert { key: u8, size: usize, tag: Option<u8> },
        Get(u8),
        Expire(u8),
        Invalidate(u8),
        Clear,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            6 => (0_u8..12, 0_usize..70, prop::option::of(0_u8..3))
                .prop_map(|(key, size, tag)| Op::Insert { key, size, tag }),
            3 => (0_u8..12).prop_map(Op::Get),
            2 => (0_u8..12).prop_map(Op::Expire),
            1 => (0_u8..3).prop_map(Op::Invalidate),
            1 => Just(Op::Clear),
        ]
    }

    /// Straightforward LRU over a vector ordered oldest first.
    #[derive(Default)]
    struct Model {
        entries: Vec<(u8, usize, Option<u8>)>,
    }

    impl Model {
        fn position(&self, key: u8) -> Option<usize> {
            self.entries.iter().position(|(k, _, _)| *k == key)
        }

        fn total(&self) -> usize {
            self.entries.iter().map(|(_, size, _)| size).sum()
        }

        fn insert(&mut self, key: u8, size: usize, tag: Option<u8>, max: usize) -> Vec<u8> {
            if size > max {
                return vec![key];
            }
            if let Some(index) = self.position(key) {
                self.entries.remove(index);
            }
            self.entries.push((key, size, tag));

            let mut evicted = Vec::new();
            while self.total() > max {
                evicted.push(self.entries.remove(0).0);
            }
            evicted
        }

        fn get(&mut self, key: u8) -> Option<usize> {
            let index = self.position(key)?;
            let entry = self.entries.remove(index);
            self.entries.push(entry);
            Some(entry.1)
        }

        fn expire(&mut self, key: u8) -> bool {
            self.position(key).map(|index| self.entries.remove(index)).is_some()
        }

        fn invalidate(&mut self, tag: u8) -> usize {
            let before = self.entries.len();
            self.entries.retain(|(_, _, t)| *t != Some(tag));
            before - self.entries.len()
        }

        fn keys(&self) -> Vec<u8> {
            self.entries.iter().map(|(k, _, _)| *k).collect()
        }
    }

    proptest! {
        #[test]
        fn matches_lru_model(ops in prop::collection::vec(op(), 1..120)) {
            const MAX: usize = 100;
            let cache = blob_cache(MAX);
            let mut model = Model::default();

            for op in ops {
                match op {
                    Op::Insert { key, size, tag } => {
                        let evicted = cache.insert(&key, Blob(size), tag);
                        prop_assert_eq!(evicted_keys(&evicted), model.insert(key, size, tag, MAX));
                    }
                    Op::Get(key) => {
                        prop_assert_eq!(cache.get(&key).map(|b| b.0), model.get(key));
                    }
                    Op::Expire(key) => {
                        let before = cache.current_bytes();
                        let removed = cache.expire(&key);
                        prop_assert_eq!(removed, model.expire(key));
                        if !removed {
                            prop_assert_eq!(cache.current_bytes(), before);
                        }
                    }
                    Op::Invalidate(tag) => {
                        prop_assert_eq!(cache.invalidate_by_tag(&tag), model.invalidate(tag));
                    }
                    Op::Clear => {
                        cache.clear();
                        model.entries.clear();
                    }
                }

                cache.assert_invariants();
                prop_assert_eq!(cache.keys(), model.keys());
                prop_assert_eq!(cache.current_bytes(), model.total());
            }
        }

        #[test]
        fn get_is_value_idempotent(sizes in prop::collection::vec(1_usize..30, 1..8)) {
            let cache = blob_cache(1_000);
            for (key, size) in sizes.iter().enumerate() {
                cache.insert(&u8::try_from(key).unwrap(), Blob(*size), None);
            }

            let first = cache.get(&0);
            let second = cache.get(&0);
            prop_assert_eq!(first, second);
            prop_assert_eq!(cache.keys().last().copied(), Some(0));
        }
    }
}
