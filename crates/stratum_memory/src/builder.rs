// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder and configuration for [`L1Cache`].

use std::marker::PhantomData;

use crate::tier::L1Cache;

/// Byte budget used when none is configured: 1 MiB.
pub const DEFAULT_MAX_BYTES: usize = 1024 * 1024;

/// Deserializable settings for an [`L1Cache`].
///
/// With the `serde` feature enabled, the budget can be read from a host configuration
/// file. Missing fields fall back to their defaults, and `cache_size` is accepted as an
/// alternative spelling of `max_bytes`.
///
/// # Examples
///
/// ```
/// use stratum_memory::{L1Cache, L1Config};
///
/// let config = L1Config { max_bytes: 2048 };
/// let cache = L1Cache::<String, String, ()>::from_config(&config);
/// assert_eq!(cache.max_bytes(), 2048);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct L1Config {
    /// Upper bound on the total byte size of resident values.
    #[cfg_attr(feature = "serde", serde(alias = "cache_size"))]
    pub max_bytes: usize,
}

impl Default for L1Config {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// Builder for configuring an [`L1Cache`].
///
/// # Examples
///
/// ```
/// use stratum_memory::L1Cache;
///
/// let cache = L1Cache::<String, String, &str>::builder()
///     .max_bytes(10 * 1024)
///     .initial_capacity(64)
///     .name("permissions")
///     .build();
/// assert_eq!(cache.max_bytes(), 10 * 1024);
/// ```
#[derive(Debug)]
pub struct L1CacheBuilder<K, V, T> {
    pub(crate) max_bytes: usize,
    pub(crate) initial_capacity: Option<usize>,
    pub(crate) name: Option<String>,
    _phantom: PhantomData<fn() -> (K, V, T)>,
}

impl<K, V, T> Default for L1CacheBuilder<K, V, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, T> L1CacheBuilder<K, V, T> {
    /// Creates a builder with the default 1 MiB budget.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            initial_capacity: None,
            name: None,
            _phantom: PhantomData,
        }
    }

    /// Sets the byte budget.
    ///
    /// A budget of zero admits only values that measure zero bytes.
    #[must_use]
    pub fn max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Applies every setting from `config`.
    #[must_use]
    pub fn config(self, config: &L1Config) -> Self {
        self.max_bytes(config.max_bytes)
    }

    /// Sets how many entries to pre-allocate room for.
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Sets a name reported by [`L1Cache::name`] and in debug output.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds the configured cache.
    #[must_use]
    pub fn build(self) -> L1Cache<K, V, T> {
        L1Cache::from_builder(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_one_mebibyte() {
        assert_eq!(L1Config::default().max_bytes, 1_048_576);
        let cache = L1CacheBuilder::<u8, u8, ()>::new().build();
        assert_eq!(cache.max_bytes(), DEFAULT_MAX_BYTES);
        assert_eq!(cache.name(), None);
    }

    #[test]
    fn config_overrides_budget() {
        let cache = L1CacheBuilder::<u8, u8, ()>::new().config(&L1Config { max_bytes: 10 }).build();
        assert_eq!(cache.max_bytes(), 10);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_with_alias_and_defaults() {
        let config: L1Config = serde_json::from_str(r#"{"cache_size": 4096}"#).unwrap();
        assert_eq!(config.max_bytes, 4096);

        let config: L1Config = serde_json::from_str(r#"{"max_bytes": 512}"#).unwrap();
        assert_eq!(config.max_bytes, 512);

        let config: L1Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, L1Config::default());
    }
}
