// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock lower tier for testing.
//!
//! This module provides `MockTier`, an in-memory [`CacheTier`] that records every
//! operation and supports failure injection for testing error paths.

use std::{collections::HashMap, hash::Hash, sync::Arc};

use parking_lot::Mutex;

use crate::{CacheEntry, CacheTier, Error};

/// Recorded tier operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierOp<K, V, T> {
    /// A get operation was performed with the given key.
    Get(K),
    /// An insert operation was performed.
    Insert {
        /// The key that was inserted.
        key: K,
        /// The value that was inserted.
        value: V,
        /// The tag the value was inserted with.
        tag: Option<T>,
    },
    /// An invalidate operation was performed with the given key.
    Invalidate(K),
    /// A tag invalidation was performed with the given tag.
    InvalidateByTag(T),
    /// A clear operation was performed.
    Clear,
}

type FailPredicate<K, V, T> = Box<dyn Fn(&TierOp<K, V, T>) -> bool + Send + Sync>;
type Slots<K, V, T> = HashMap<K, CacheEntry<V, T>>;

/// A configurable mock tier for testing.
///
/// Entries are kept in a plain map together with their tags. Clones share storage, the
/// operation log and the failure predicate, so a test can keep a handle after
/// moving a clone into the cache under test.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "test-util")]
/// # fn main() {
/// use stratum_tier::{CacheEntry, CacheTier, testing::{MockTier, TierOp}};
///
/// let tier = MockTier::<String, i32, &str>::new();
/// tier.insert(&"key".to_string(), CacheEntry::tagged(42, "uploaded")).unwrap();
/// assert_eq!(tier.get(&"key".to_string()).unwrap().map(|e| e.into_value()), Some(42));
///
/// tier.fail_when(|op| matches!(op, TierOp::Get(_)));
/// assert!(tier.get(&"key".to_string()).is_err());
/// # }
/// # #[cfg(not(feature = "test-util"))]
/// # fn main() {}
/// ```
pub struct MockTier<K, V, T> {
    data: Arc<Mutex<Slots<K, V, T>>>,
    operations: Arc<Mutex<Vec<TierOp<K, V, T>>>>,
    fail_when: Arc<Mutex<Option<FailPredicate<K, V, T>>>>,
}

impl<K, V, T> std::fmt::Debug for MockTier<K, V, T>
where
    K: std::fmt::Debug,
    V: std::fmt::Debug,
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTier")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl<K, V, T> Clone for MockTier<K, V, T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl<K, V, T> Default for MockTier<K, V, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, T> MockTier<K, V, T> {
    /// Creates a new empty mock tier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }
}

impl<K, V, T> MockTier<K, V, T>
where
    K: Eq + Hash,
{
    /// Creates a mock tier with pre-populated, untagged data.
    #[must_use]
    pub fn with_data(data: impl IntoIterator<Item = (K, V)>) -> Self {
        let tier = Self::new();
        tier.data.lock().extend(data.into_iter().map(|(k, v)| (k, CacheEntry::new(v))));
        tier
    }

    /// Returns true if the tier holds the given key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.data.lock().contains_key(key)
    }
}

impl<K, V, T> MockTier<K, V, T>
where
    K: Clone,
    V: Clone,
    T: Clone,
{
    /// Sets a predicate that decides which operations fail.
    ///
    /// Failing operations are still recorded but leave the stored data untouched.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&TierOp<K, V, T>) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<TierOp<K, V, T>> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn record(&self, op: TierOp<K, V, T>) -> Result<(), Error> {
        let fail = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        self.operations.lock().push(op);
        if fail { Err(Error::from_message("mock: operation failed")) } else { Ok(()) }
    }
}

impl<K, V, T> CacheTier<K, V, T> for MockTier<K, V, T>
where
    K: Clone + Eq + Hash + Send,
    V: Clone + Send,
    T: Clone + PartialEq + Send,
{
    fn get(&self, key: &K) -> Result<Option<CacheEntry<V, T>>, Error> {
        self.record(TierOp::Get(key.clone()))?;
        Ok(self.data.lock().get(key).cloned())
    }

    fn insert(&self, key: &K, entry: CacheEntry<V, T>) -> Result<(), Error> {
        self.record(TierOp::Insert {
            key: key.clone(),
            value: entry.value().clone(),
            tag: entry.tag().cloned(),
        })?;
        self.data.lock().insert(key.clone(), entry);
        Ok(())
    }

    fn invalidate(&self, key: &K) -> Result<(), Error> {
        self.record(TierOp::Invalidate(key.clone()))?;
        self.data.lock().remove(key);
        Ok(())
    }

    fn invalidate_by_tag(&self, tag: &T) -> Result<(), Error> {
        self.record(TierOp::InvalidateByTag(tag.clone()))?;
        self.data.lock().retain(|_, entry| entry.tag() != Some(tag));
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        self.record(TierOp::Clear)?;
        self.data.lock().clear();
        Ok(())
    }

    fn len(&self) -> Option<u64> {
        Some(self.data.lock().len() as u64)
    }
}
