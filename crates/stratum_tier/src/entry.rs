// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::ops::Deref;

/// A cached value together with its invalidation tag.
///
/// This is what travels between tiers: an entry demoted out of L1 keeps its tag in the
/// lower tier, and an entry promoted back up keeps it too, so event-driven invalidation
/// reaches the value wherever it lives.
///
/// # Examples
///
/// ```
/// use stratum_tier::CacheEntry;
///
/// let entry = CacheEntry::<_, &str>::new(42);
/// assert_eq!(*entry.value(), 42);
/// assert!(entry.tag().is_none());
///
/// let entry = CacheEntry::tagged("transcript".to_string(), "video_uploaded");
/// assert_eq!(entry.tag(), Some(&"video_uploaded"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry<V, T> {
    value: V,
    tag: Option<T>,
}

impl<V, T> CacheEntry<V, T> {
    /// Creates an untagged entry.
    pub fn new(value: V) -> Self {
        Self { value, tag: None }
    }

    /// Creates an entry invalidated by `tag`.
    pub fn tagged(value: V, tag: T) -> Self {
        Self { value, tag: Some(tag) }
    }

    /// Creates an entry from a value and an optional tag.
    pub fn with_tag(value: V, tag: Option<T>) -> Self {
        Self { value, tag }
    }

    /// Returns the cached value.
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the invalidation tag, if any.
    #[must_use]
    pub fn tag(&self) -> Option<&T> {
        self.tag.as_ref()
    }

    /// Consumes the entry and returns the value.
    #[must_use]
    pub fn into_value(self) -> V {
        self.value
    }

    /// Consumes the entry and returns the value and tag.
    #[must_use]
    pub fn into_parts(self) -> (V, Option<T>) {
        (self.value, self.tag)
    }
}

impl<V, T> Deref for CacheEntry<V, T> {
    type Target = V;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deref_reaches_value() {
        let entry = CacheEntry::<_, ()>::new("abc".to_string());
        assert_eq!(entry.len(), 3);
    }

    #[test]
    fn with_tag_keeps_both() {
        let (value, tag) = CacheEntry::with_tag(1_u8, Some("t")).into_parts();
        assert_eq!(value, 1);
        assert_eq!(tag, Some("t"));
    }
}
