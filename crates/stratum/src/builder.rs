// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for the tiered cache.

use std::{
    fmt,
    hash::Hash,
    sync::{Arc, Weak},
};

use stratum_events::{EventBroker, SubscriberError, SubscriptionId};
use stratum_memory::{L1Cache, L1Config};
use stratum_tier::{ByteSize, CacheTier};

use crate::{
    Cache,
    cache::{CacheInner, CacheName, Invalidations, LowerTier},
    telemetry::CacheTelemetry,
};

const DEFAULT_NAME: CacheName = "stratum";

/// Builder for constructing a [`Cache`].
///
/// Created by calling [`Cache::builder`]. Configures the L1 byte budget, an optional
/// lower tier and telemetry, then either subscribes the cache to an event broker
/// ([`build`](Self::build)) or leaves invalidation to the host
/// ([`build_detached`](Self::build_detached)).
///
/// # Examples
///
/// ```
/// use stratum::{Cache, EventBroker, L1Config};
///
/// let broker = EventBroker::<&'static str>::new();
/// let cache = Cache::builder::<u64, Vec<u8>, &'static str>()
///     .name("thumbnails")
///     .config(&L1Config::default())
///     .build(&broker);
///
/// assert_eq!(cache.name(), "thumbnails");
/// assert_eq!(broker.all_subscriber_count(), 1);
/// ```
pub struct CacheBuilder<K, V, T> {
    name: Option<CacheName>,
    max_bytes: Option<usize>,
    l1: Option<L1Cache<K, V, T>>,
    lower: Option<LowerTier<K, V, T>>,
    telemetry: Option<CacheTelemetry>,
}

impl<K, V, T> fmt::Debug for CacheBuilder<K, V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBuilder")
            .field("name", &self.name)
            .field("max_bytes", &self.max_bytes)
            .field("l1", &self.l1.is_some())
            .field("lower_tier", &self.lower.is_some())
            .field("telemetry", &self.telemetry)
            .finish()
    }
}

impl<K, V, T> CacheBuilder<K, V, T> {
    pub(crate) fn new() -> Self {
        Self {
            name: None,
            max_bytes: None,
            l1: None,
            lower: None,
            telemetry: default_telemetry(),
        }
    }

    /// Sets the name reported in logs and metrics.
    ///
    /// Defaults to `"stratum"`.
    #[must_use]
    pub fn name(mut self, name: CacheName) -> Self {
        self.name = Some(name);
        self
    }

    /// Sets the L1 byte budget.
    ///
    /// Defaults to [`DEFAULT_MAX_BYTES`](stratum_memory::DEFAULT_MAX_BYTES).
    #[must_use]
    pub fn max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Applies an L1 configuration, typically deserialized from the host's settings.
    #[must_use]
    pub fn config(self, config: &L1Config) -> Self {
        self.max_bytes(config.max_bytes)
    }

    /// Uses an already constructed L1 instead of building one.
    ///
    /// Overrides [`max_bytes`](Self::max_bytes) and [`config`](Self::config).
    #[must_use]
    pub fn l1(mut self, l1: L1Cache<K, V, T>) -> Self {
        self.l1 = Some(l1);
        self
    }

    /// Adds a tier below L1.
    ///
    /// L1 evictions are written to it and L1 misses fall through to it.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[cfg(feature = "test-util")]
    /// # fn main() {
    /// use stratum::{Cache, MockTier};
    ///
    /// let lower = MockTier::<u32, u64, ()>::new();
    /// let cache = Cache::builder::<u32, u64, ()>()
    ///     .max_bytes(8)
    ///     .lower_tier(lower.clone())
    ///     .build_detached();
    ///
    /// cache.insert(&1, 10, None);
    /// cache.insert(&2, 20, None);
    /// assert!(lower.contains_key(&1));
    /// # }
    /// # #[cfg(not(feature = "test-util"))]
    /// # fn main() {}
    /// ```
    #[must_use]
    pub fn lower_tier<L>(mut self, tier: L) -> Self
    where
        L: CacheTier<K, V, T> + 'static,
    {
        self.lower = Some(Box::new(tier));
        self
    }

    /// Replaces the telemetry collector.
    ///
    /// Without this call the cache logs through `tracing` when the `logs` feature is
    /// enabled. Pass `TelemetryConfig::new().build()` to silence it.
    #[must_use]
    pub fn telemetry(mut self, telemetry: CacheTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Builds the cache without subscribing it to any broker.
    ///
    /// The host is responsible for calling [`Cache::on_event`].
    #[must_use]
    pub fn build_detached(self) -> Cache<K, V, T> {
        Cache::from_inner(self.into_inner(None))
    }

    fn into_inner(self, subscription: Option<SubscriptionId>) -> CacheInner<K, V, T> {
        let name = self.name.unwrap_or(DEFAULT_NAME);
        let l1 = self.l1.unwrap_or_else(|| {
            let builder = L1Cache::builder().name(name);
            match self.max_bytes {
                Some(max_bytes) => builder.max_bytes(max_bytes),
                None => builder,
            }
            .build()
        });

        CacheInner {
            name,
            l1,
            lower: self.lower,
            telemetry: self.telemetry,
            invalidations: Invalidations::default(),
            subscription,
        }
    }
}

impl<K, V, T> CacheBuilder<K, V, T>
where
    K: Clone + Eq + Hash + Send + 'static,
    V: ByteSize + Clone + Send + 'static,
    T: Clone + PartialEq + Send + 'static,
{
    /// Builds the cache and subscribes it to every event published on `broker`.
    ///
    /// Each published event drops the entries tagged with it from all tiers. The
    /// subscription holds the cache weakly: once every clone of the cache is dropped it
    /// turns into a no-op, but it stays registered on the broker. Hosts that create and
    /// retire caches repeatedly should pass [`Cache::subscription`] to
    /// [`EventBroker::unsubscribe`] before dropping the cache.
    ///
    /// A lower-tier failure during invalidation is returned to the publisher as a
    /// [`SubscriberError`].
    #[must_use]
    pub fn build<P>(self, broker: &EventBroker<T, P>) -> Cache<K, V, T>
    where
        P: 'static,
    {
        let inner = Arc::new_cyclic(|weak: &Weak<CacheInner<K, V, T>>| {
            let weak = Weak::clone(weak);
            let subscription = broker.subscribe_all(move |event: &T, _payload: Option<&P>| {
                let Some(inner) = weak.upgrade() else {
                    return Ok(());
                };
                Cache { inner }
                    .on_event(event)
                    .map(|_| ())
                    .map_err(SubscriberError::from_message)
            });
            self.into_inner(Some(subscription))
        });

        Cache { inner }
    }
}

#[cfg(feature = "logs")]
fn default_telemetry() -> Option<CacheTelemetry> {
    Some(crate::TelemetryConfig::new().with_logs().build())
}

#[cfg(not(feature = "logs"))]
fn default_telemetry() -> Option<CacheTelemetry> {
    None
}
