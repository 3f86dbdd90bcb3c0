// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The tiered cache facade.

use std::{
    fmt::{self, Debug, Display},
    hash::Hash,
    sync::Arc,
};

use parking_lot::Mutex;
use stratum_events::SubscriptionId;
use stratum_memory::L1Cache;
use stratum_tier::{ByteSize, CacheEntry, CacheTier, Error, Evicted, EvictionReason};

use crate::{
    CacheMiss,
    builder::CacheBuilder,
    telemetry::{CacheActivity, CacheOperation, CacheTelemetry, ext::CacheTelemetryExt},
};

/// Type alias for cache names used in telemetry.
pub type CacheName = &'static str;

pub(crate) type LowerTier<K, V, T> = Box<dyn CacheTier<K, V, T>>;

pub(crate) struct CacheInner<K, V, T> {
    pub(crate) name: CacheName,
    pub(crate) l1: L1Cache<K, V, T>,
    pub(crate) lower: Option<LowerTier<K, V, T>>,
    pub(crate) telemetry: Option<CacheTelemetry>,
    pub(crate) invalidations: Invalidations,
    pub(crate) subscription: Option<SubscriptionId>,
}

/// Orders lower-tier promotions against invalidations.
///
/// Invalidation clears L1 first and the lower tier second. A promotion is only applied
/// when no invalidation is running and none started since the lower-tier read began.
#[derive(Debug, Default)]
pub(crate) struct Invalidations {
    state: Mutex<InvalidationState>,
}

#[derive(Debug, Default)]
struct InvalidationState {
    in_flight: usize,
    epoch: u64,
}

impl Invalidations {
    fn begin(&self) -> InvalidationGuard<'_> {
        {
            let mut state = self.state.lock();
            state.in_flight += 1;
            state.epoch = state.epoch.wrapping_add(1);
        }
        InvalidationGuard { invalidations: self }
    }

    fn epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    /// Runs `f` if nothing was invalidated since `epoch` was read.
    fn if_unchanged_since<R>(&self, epoch: u64, f: impl FnOnce() -> R) -> Option<R> {
        let state = self.state.lock();
        (state.in_flight == 0 && state.epoch == epoch).then(f)
    }
}

struct InvalidationGuard<'a> {
    invalidations: &'a Invalidations,
}

impl Drop for InvalidationGuard<'_> {
    fn drop(&mut self) {
        self.invalidations.state.lock().in_flight -= 1;
    }
}

/// The public entry point of the tiered cache.
///
/// `Cache` puts a byte-bounded [`L1Cache`] in front of an optional lower tier:
///
/// - [`insert`](Self::insert) stores into L1; whatever L1 evicts is forwarded to the lower
///   tier with its key and tag, and also returned to the caller
/// - [`get`](Self::get) reads L1, then the lower tier (promoting a hit back into L1), and
///   reports a [`CacheMiss`] when neither has the key
/// - [`on_event`](Self::on_event) drops every entry tagged with the event from both tiers;
///   [`CacheBuilder::build`] subscribes it to an [`EventBroker`](stratum_events::EventBroker)
///
/// Clones share the same tiers.
///
/// # Examples
///
/// ```
/// use stratum::{Cache, EventBroker};
///
/// #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// enum ServerEvent {
///     VideoUploaded,
/// }
///
/// let broker = EventBroker::<ServerEvent>::new();
/// let cache = Cache::builder::<String, String, ServerEvent>()
///     .name("transcripts")
///     .max_bytes(64 * 1024)
///     .build(&broker);
///
/// cache.insert(&"video:1".to_string(), "hello".to_string(), Some(ServerEvent::VideoUploaded));
/// assert_eq!(cache.get(&"video:1".to_string())?, "hello");
///
/// broker.publish(&ServerEvent::VideoUploaded, None)?;
/// assert!(cache.get(&"video:1".to_string()).is_err());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Cache<K, V, T> {
    pub(crate) inner: Arc<CacheInner<K, V, T>>,
}

impl<K, V, T> Clone for Cache<K, V, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V, T> Debug for Cache<K, V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("name", &self.inner.name)
            .field("l1", &self.inner.l1)
            .field("lower_tier", &self.inner.lower.is_some())
            .field("telemetry", &self.inner.telemetry.is_some())
            .finish()
    }
}

impl Cache<(), (), ()> {
    /// Creates a new cache builder.
    ///
    /// `K` is the key type, `V` the value type and `T` the invalidation tag, usually the
    /// host's domain event enum.
    ///
    /// # Examples
    ///
    /// ```
    /// use stratum::Cache;
    ///
    /// let cache = Cache::builder::<u64, String, ()>()
    ///     .max_bytes(1024)
    ///     .build_detached();
    /// assert_eq!(cache.max_bytes(), 1024);
    /// ```
    #[must_use]
    pub fn builder<K, V, T>() -> CacheBuilder<K, V, T> {
        CacheBuilder::new()
    }
}

/// Accessors.
impl<K, V, T> Cache<K, V, T> {
    pub(crate) fn from_inner(inner: CacheInner<K, V, T>) -> Self {
        Self { inner: Arc::new(inner) }
    }

    /// Returns the name of this cache for telemetry identification.
    #[must_use]
    pub fn name(&self) -> CacheName {
        self.inner.name
    }

    /// Returns the in-memory tier.
    #[must_use]
    pub fn l1(&self) -> &L1Cache<K, V, T> {
        &self.inner.l1
    }

    /// Returns the broker subscription created by [`CacheBuilder::build`].
    ///
    /// The subscription outlives the cache. Pass this id to
    /// [`EventBroker::unsubscribe`](stratum_events::EventBroker::unsubscribe) when the cache
    /// is retired. Detached caches return `None`.
    #[must_use]
    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.inner.subscription
    }

    /// Returns the lower tier, if one was configured.
    #[must_use]
    pub fn lower_tier(&self) -> Option<&dyn CacheTier<K, V, T>> {
        self.inner.lower.as_deref()
    }

    /// Returns the number of entries resident in L1.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.l1.len()
    }

    /// Returns `true` if L1 holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.l1.is_empty()
    }

    /// Returns the bytes charged by values resident in L1.
    #[must_use]
    pub fn current_bytes(&self) -> usize {
        self.inner.l1.current_bytes()
    }

    /// Returns the L1 byte budget.
    #[must_use]
    pub fn max_bytes(&self) -> usize {
        self.inner.l1.max_bytes()
    }
}

impl<K, V, T> Cache<K, V, T>
where
    K: Clone + Eq + Hash,
    V: ByteSize + Clone,
    T: Clone + PartialEq,
{
    /// Stores `value` under `key` in L1 and returns what L1 let go of.
    ///
    /// Evicted entries, and a value too large for L1 altogether, are forwarded to the
    /// lower tier when one is configured. A failure to forward is logged and skipped.
    ///
    /// A value too large for L1 also expires any older value L1 still holds under `key`,
    /// so reads see the new value.
    ///
    /// # Examples
    ///
    /// ```
    /// use stratum::Cache;
    ///
    /// let cache = Cache::builder::<u32, u64, ()>().max_bytes(16).build_detached();
    /// cache.insert(&1, 10, None);
    /// cache.insert(&2, 20, None);
    ///
    /// let evicted = cache.insert(&3, 30, None);
    /// assert_eq!(evicted.into_iter().map(|e| e.into_value()).collect::<Vec<_>>(), [10]);
    /// ```
    pub fn insert(&self, key: &K, value: V, tag: Option<T>) -> Vec<Evicted<K, V, T>> {
        let evicted = self.inner.l1.insert(key, value, tag);

        if evicted.first().is_some_and(|e| e.reason() == EvictionReason::Oversized) {
            self.record(CacheOperation::Insert, CacheActivity::Rejected, 1);
            if self.inner.l1.expire(key) {
                self.record(CacheOperation::Insert, CacheActivity::Expired, 1);
            }
        } else {
            self.record(CacheOperation::Insert, CacheActivity::Inserted, 1);
            if !evicted.is_empty() {
                self.record(CacheOperation::Insert, CacheActivity::Evicted, evicted.len());
            }
        }

        self.demote(evicted.iter());
        self.record_size();
        evicted
    }

    /// Returns `true` if `key` is resident in L1.
    ///
    /// The lower tier is not consulted and recency is not touched.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.inner.l1.contains(key)
    }

    /// Removes `key` from every tier, returning `true` if it was resident in L1.
    ///
    /// Expiring an absent key is a no-op. A lower-tier failure is logged and skipped.
    pub fn expire(&self, key: &K) -> bool {
        let _guard = self.inner.invalidations.begin();
        let removed = self.inner.l1.expire(key);
        if removed {
            self.record(CacheOperation::Expire, CacheActivity::Expired, 1);
        }

        if let Some(lower) = &self.inner.lower
            && lower.invalidate(key).is_err()
        {
            self.record(CacheOperation::Expire, CacheActivity::Error, 1);
        }

        self.record_size();
        removed
    }

    /// Drops every entry tagged with `tag` from every tier.
    ///
    /// Returns how many entries were removed from L1. This is the handler that
    /// [`CacheBuilder::build`] subscribes to the event broker, with the published event as
    /// the tag.
    ///
    /// # Errors
    ///
    /// Returns the lower tier's error if it could not invalidate. L1 has been
    /// invalidated by then.
    pub fn on_event(&self, tag: &T) -> Result<usize, Error> {
        let _guard = self.inner.invalidations.begin();
        let removed = self.inner.l1.invalidate_by_tag(tag);
        if removed > 0 {
            self.record(CacheOperation::Invalidate, CacheActivity::Invalidated, removed);
        } else {
            self.record(CacheOperation::Invalidate, CacheActivity::Ok, 1);
        }
        self.record_size();

        if let Some(lower) = &self.inner.lower
            && let Err(error) = lower.invalidate_by_tag(tag)
        {
            self.record(CacheOperation::Invalidate, CacheActivity::Error, 1);
            return Err(error);
        }
        Ok(removed)
    }

    /// Removes every entry from every tier.
    ///
    /// A lower-tier failure is logged and skipped.
    pub fn clear(&self) {
        let _guard = self.inner.invalidations.begin();
        self.inner.l1.clear();

        let activity = match &self.inner.lower {
            Some(lower) if lower.clear().is_err() => CacheActivity::Error,
            _ => CacheActivity::Ok,
        };
        self.record(CacheOperation::Clear, activity, 1);
        self.record_size();
    }

    /// Returns the cached value for `key`, or computes, inserts and returns it.
    ///
    /// A lower-tier failure during the lookup is treated as a miss.
    ///
    /// # Examples
    ///
    /// ```
    /// use stratum::Cache;
    ///
    /// let cache = Cache::builder::<u64, String, ()>().build_detached();
    ///
    /// let value = cache.get_or_insert_with(&7, None, || "computed".to_string());
    /// assert_eq!(value, "computed");
    ///
    /// let value = cache.get_or_insert_with(&7, None, || unreachable!());
    /// assert_eq!(value, "computed");
    /// ```
    pub fn get_or_insert_with<F>(&self, key: &K, tag: Option<T>, f: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Ok(Some(value)) = self.lookup(key) {
            return value;
        }
        let value = f();
        self.insert(key, value.clone(), tag);
        value
    }

    /// Like [`get_or_insert_with`](Self::get_or_insert_with), but the loader may fail.
    ///
    /// Nothing is inserted when the loader fails.
    ///
    /// # Errors
    ///
    /// Returns the loader's error unchanged.
    pub fn try_get_or_insert_with<F, E>(&self, key: &K, tag: Option<T>, f: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Ok(Some(value)) = self.lookup(key) {
            return Ok(value);
        }
        let value = f()?;
        self.insert(key, value.clone(), tag);
        Ok(value)
    }

    /// Reads L1, then the lower tier, promoting a lower-tier hit into L1.
    ///
    /// The hit is returned but not promoted when an invalidation overlapped the read.
    fn lookup(&self, key: &K) -> Result<Option<V>, Error> {
        if let Some(value) = self.inner.l1.get(key) {
            self.record(CacheOperation::Get, CacheActivity::Hit, 1);
            return Ok(Some(value));
        }

        let Some(lower) = &self.inner.lower else {
            self.record(CacheOperation::Get, CacheActivity::Miss, 1);
            return Ok(None);
        };

        self.record(CacheOperation::Get, CacheActivity::Fallback, 1);
        let epoch = self.inner.invalidations.epoch();
        match lower.get(key) {
            Ok(Some(entry)) => {
                let (value, tag) = entry.into_parts();
                self.promote(key, value.clone(), tag, epoch);
                Ok(Some(value))
            }
            Ok(None) => {
                self.record(CacheOperation::Get, CacheActivity::Miss, 1);
                Ok(None)
            }
            Err(error) => {
                self.record(CacheOperation::Get, CacheActivity::Error, 1);
                Err(error)
            }
        }
    }

    fn promote(&self, key: &K, value: V, tag: Option<T>, epoch: u64) {
        let Some(evicted) = self
            .inner
            .invalidations
            .if_unchanged_since(epoch, || self.inner.l1.insert(key, value, tag))
        else {
            self.record(CacheOperation::Get, CacheActivity::Rejected, 1);
            return;
        };

        // An oversized value simply stays where it is.
        if evicted.first().is_some_and(|e| e.reason() == EvictionReason::Oversized) {
            return;
        }

        self.record(CacheOperation::Get, CacheActivity::FallbackPromotion, 1);
        if !evicted.is_empty() {
            self.record(CacheOperation::Get, CacheActivity::Evicted, evicted.len());
        }
        self.demote(evicted.iter());
        self.record_size();
    }

    fn demote<'a>(&self, evicted: impl Iterator<Item = &'a Evicted<K, V, T>>)
    where
        K: 'a,
        V: 'a,
        T: 'a,
    {
        let Some(lower) = &self.inner.lower else {
            return;
        };

        for e in evicted {
            let entry = CacheEntry::with_tag(e.value().clone(), e.tag().cloned());
            if lower.insert(e.key(), entry).is_err() {
                self.record(CacheOperation::Insert, CacheActivity::Error, 1);
            }
        }
    }
}

impl<K, V, T> Cache<K, V, T>
where
    K: Clone + Eq + Hash + Display,
    V: ByteSize + Clone,
    T: Clone + PartialEq,
{
    /// Returns the value cached under `key`.
    ///
    /// L1 is consulted first, then the lower tier. A lower-tier hit is promoted into L1
    /// (if it fits) and returned.
    ///
    /// # Errors
    ///
    /// Returns [`CacheMiss`] carrying the key when no tier holds it. If the lower tier
    /// failed, its error is the miss's cause.
    ///
    /// # Examples
    ///
    /// ```
    /// use stratum::Cache;
    ///
    /// let cache = Cache::builder::<String, i32, ()>().build_detached();
    ///
    /// let miss = cache.get(&"missing".to_string()).unwrap_err();
    /// assert_eq!(miss.key(), "missing");
    /// ```
    pub fn get(&self, key: &K) -> Result<V, CacheMiss> {
        match self.lookup(key) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(CacheMiss::new(key.to_string())),
            Err(error) => Err(CacheMiss::caused_by(key.to_string(), error)),
        }
    }
}

/// Telemetry helpers.
impl<K, V, T> Cache<K, V, T> {
    fn record(&self, operation: CacheOperation, activity: CacheActivity, count: usize) {
        self.inner
            .telemetry
            .record(self.inner.name, operation, activity, u64::try_from(count).unwrap_or(u64::MAX));
    }

    fn record_size(&self) {
        let bytes = u64::try_from(self.inner.l1.current_bytes()).unwrap_or(u64::MAX);
        let entries = u64::try_from(self.inner.l1.len()).unwrap_or(u64::MAX);
        self.inner.telemetry.record_size(self.inner.name, bytes, entries);
    }
}

#[cfg(test)]
mod tests {
    use opentelemetry::KeyValue;
    use stratum_tier::testing::{MockTier, TierOp};

    use super::*;
    use crate::{
        TelemetryConfig,
        telemetry::{
            attributes,
            testing::{LogCapture, MetricTester},
        },
    };

    fn observed(tester: &MetricTester, max_bytes: usize) -> Cache<String, u64, u8> {
        Cache::builder()
            .name("observed")
            .max_bytes(max_bytes)
            .telemetry(TelemetryConfig::new().with_metrics(tester.meter_provider()).build())
            .build_detached()
    }

    #[test]
    fn hit_and_miss_are_counted() {
        let tester = MetricTester::new();
        let cache = observed(&tester, 1024);

        cache.insert(&"a".to_string(), 1, None);
        let _ = cache.get(&"a".to_string());
        let _ = cache.get(&"b".to_string());

        tester.assert_attributes_contain(&[
            KeyValue::new(attributes::CACHE_NAME, "observed"),
            KeyValue::new(attributes::CACHE_OPERATION_NAME, CacheOperation::Insert.as_str()),
            KeyValue::new(attributes::CACHE_ACTIVITY_NAME, CacheActivity::Inserted.as_str()),
            KeyValue::new(attributes::CACHE_ACTIVITY_NAME, CacheActivity::Hit.as_str()),
            KeyValue::new(attributes::CACHE_ACTIVITY_NAME, CacheActivity::Miss.as_str()),
        ]);
    }

    #[test]
    fn size_gauges_are_recorded() {
        let tester = MetricTester::new();
        let cache = observed(&tester, 1024);

        cache.insert(&"a".to_string(), 1, None);

        let names = tester.metric_names();
        assert!(names.iter().any(|n| n == "cache.size_bytes"), "got: {names:?}");
        assert!(names.iter().any(|n| n == "cache.entries"), "got: {names:?}");
        assert!(names.iter().any(|n| n == "cache.event.count"), "got: {names:?}");
    }

    #[test]
    fn eviction_and_rejection_are_counted() {
        let tester = MetricTester::new();
        let cache = observed(&tester, 8);

        cache.insert(&"a".to_string(), 1, None);
        cache.insert(&"b".to_string(), 2, None);
        cache.on_event(&3).unwrap();

        tester.assert_attributes_contain(&[
            KeyValue::new(attributes::CACHE_ACTIVITY_NAME, CacheActivity::Evicted.as_str()),
            KeyValue::new(attributes::CACHE_ACTIVITY_NAME, CacheActivity::Ok.as_str()),
        ]);

        let tiny: Cache<String, u64, u8> = Cache::builder()
            .max_bytes(4)
            .telemetry(TelemetryConfig::new().with_metrics(tester.meter_provider()).build())
            .build_detached();
        tiny.insert(&"big".to_string(), 1, None);
        tester.assert_attributes_contain(&[KeyValue::new(
            attributes::CACHE_ACTIVITY_NAME,
            CacheActivity::Rejected.as_str(),
        )]);
    }

    #[cfg(feature = "logs")]
    #[test]
    fn logs_are_enabled_by_default() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        let cache: Cache<String, u64, u8> = Cache::builder().name("logged").build_detached();
        cache.insert(&"a".to_string(), 1, Some(4));
        cache.on_event(&4).unwrap();

        capture.assert_contains("cache.event");
        capture.assert_contains("logged");
        capture.assert_contains(CacheActivity::Inserted.as_str());
        capture.assert_contains(CacheActivity::Invalidated.as_str());
    }

    #[test]
    fn disabled_telemetry_is_silent() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        let cache: Cache<String, u64, u8> = Cache::builder().telemetry(TelemetryConfig::new().build()).build_detached();
        cache.insert(&"a".to_string(), 1, None);
        let _ = cache.get(&"a".to_string());

        assert!(capture.output().is_empty());
    }

    #[cfg(feature = "logs")]
    #[test]
    fn failed_demotion_is_logged_and_skipped() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        let lower = MockTier::<String, u64, u8>::new();
        lower.fail_when(|op| matches!(op, TierOp::Insert { .. }));
        let cache: Cache<String, u64, u8> = Cache::builder().max_bytes(8).lower_tier(lower.clone()).build_detached();

        cache.insert(&"a".to_string(), 1, None);
        let evicted = cache.insert(&"b".to_string(), 2, None);

        assert_eq!(evicted.len(), 1);
        assert_eq!(lower.entry_count(), 0);
        capture.assert_contains(CacheActivity::Error.as_str());
        capture.assert_contains("ERROR");
    }
}
