// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::CacheEntry;

/// Why a tier let go of an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EvictionReason {
    /// The entry was the least recently used one while the tier was over its byte budget.
    Capacity,
    /// The offered value alone exceeds the tier's byte budget, so it was never stored.
    Oversized,
}

impl EvictionReason {
    /// Returns a stable name for logs and metric attributes.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Capacity => "capacity",
            Self::Oversized => "oversized",
        }
    }
}

/// An entry a tier handed back instead of keeping.
///
/// Returned by the L1 insert path: capacity evictions come out least recently used first,
/// and an oversized offer comes straight back with [`EvictionReason::Oversized`]. Carrying the
/// key and tag lets the caller forward the entry to a lower tier unchanged.
///
/// # Examples
///
/// ```
/// use stratum_tier::{Evicted, EvictionReason};
///
/// let evicted = Evicted::new("key", 42, Some("video_uploaded"), EvictionReason::Capacity);
/// assert_eq!(*evicted.key(), "key");
/// assert_eq!(evicted.into_value(), 42);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evicted<K, V, T> {
    key: K,
    value: V,
    tag: Option<T>,
    reason: EvictionReason,
}

impl<K, V, T> Evicted<K, V, T> {
    /// Creates a new eviction record.
    pub fn new(key: K, value: V, tag: Option<T>, reason: EvictionReason) -> Self {
        Self { key, value, tag, reason }
    }

    /// Returns the key the value was stored under.
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns the evicted value.
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the invalidation tag the entry carried, if any.
    #[must_use]
    pub fn tag(&self) -> Option<&T> {
        self.tag.as_ref()
    }

    /// Returns why the entry left the tier.
    #[must_use]
    pub fn reason(&self) -> EvictionReason {
        self.reason
    }

    /// Consumes the record and returns the value.
    #[must_use]
    pub fn into_value(self) -> V {
        self.value
    }

    /// Consumes the record and returns key, value and tag.
    #[must_use]
    pub fn into_parts(self) -> (K, V, Option<T>) {
        (self.key, self.value, self.tag)
    }

    /// Consumes the record and returns the key and an entry ready for a lower tier.
    #[must_use]
    pub fn into_entry(self) -> (K, CacheEntry<V, T>) {
        (self.key, CacheEntry::with_tag(self.value, self.tag))
    }
}
