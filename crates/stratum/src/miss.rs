// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// The key is resident in no tier.
///
/// Returned by [`Cache::get`](crate::Cache::get). A miss is recoverable: callers
/// typically load the value from its source and insert it. When a lower tier failed
/// during the lookup, the tier error is attached as the cause.
///
/// # Examples
///
/// ```
/// use stratum::Cache;
///
/// let cache = Cache::builder::<String, String, ()>().build_detached();
///
/// let miss = cache.get(&"video:42".to_string()).unwrap_err();
/// assert_eq!(miss.key(), "video:42");
/// assert!(miss.to_string().contains("cache miss for key: video:42"));
/// ```
#[ohno::error]
#[display("cache miss for key: {key}")]
pub struct CacheMiss {
    key: String,
}

impl CacheMiss {
    /// Returns the key that missed, as displayed by the cache.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}
