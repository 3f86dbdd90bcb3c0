// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The trait for tiers that sit below the in-memory L1.
//!
//! [`CacheTier`] is the single extension point of the tiered cache: entries the L1
//! evicts are handed to it, and L1 misses fall through to it before surfacing as a
//! miss.

use crate::{CacheEntry, Error};

/// Trait for cache tiers below the in-memory L1.
///
/// Every operation is synchronous and fallible. Entries carry their tag so that
/// event-driven invalidation reaches values that were demoted out of L1, and so that a
/// value promoted back into L1 stays invalidatable.
///
/// All five core methods are required. Only `len` and `is_empty` have default
/// implementations:
/// - `len`: Returns `None` (not all tiers track their entry count)
/// - `is_empty`: Delegates to `len`
pub trait CacheTier<K, V, T>: Send + Sync {
    /// Looks up an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the tier cannot be consulted.
    fn get(&self, key: &K) -> Result<Option<CacheEntry<V, T>>, Error>;

    /// Stores an entry, replacing any previous one under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tier rejects or fails the write.
    fn insert(&self, key: &K, entry: CacheEntry<V, T>) -> Result<(), Error>;

    /// Removes an entry. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the tier cannot be reached.
    fn invalidate(&self, key: &K) -> Result<(), Error>;

    /// Removes every entry stored with `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tier cannot be reached.
    fn invalidate_by_tag(&self, tag: &T) -> Result<(), Error>;

    /// Removes all entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the tier cannot be reached.
    fn clear(&self) -> Result<(), Error>;

    /// Returns the number of entries, if supported.
    ///
    /// Returns `None` for implementations that don't track size.
    fn len(&self) -> Option<u64> {
        None
    }

    /// Returns `true` if the tier contains no entries.
    ///
    /// Returns `None` for implementations that don't track size.
    fn is_empty(&self) -> Option<bool> {
        self.len().map(|len| len == 0)
    }
}
