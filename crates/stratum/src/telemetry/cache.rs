// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache telemetry implementation and recording.

#[cfg(any(feature = "metrics", test))]
use opentelemetry::{
    KeyValue,
    metrics::{Counter, Gauge},
};
#[cfg(any(feature = "logs", test))]
use opentelemetry::logs::Severity;

#[cfg(any(feature = "metrics", test))]
use crate::telemetry::attributes;
use crate::{
    cache::CacheName,
    telemetry::{CacheActivity, CacheOperation, CacheTelemetry},
};

#[derive(Clone, Debug)]
pub(crate) struct CacheTelemetryInner {
    #[cfg(any(feature = "logs", test))]
    pub(crate) logging_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    pub(crate) event_counter: Option<Counter<u64>>,
    #[cfg(any(feature = "metrics", test))]
    pub(crate) size_bytes: Option<Gauge<u64>>,
    #[cfg(any(feature = "metrics", test))]
    pub(crate) entries: Option<Gauge<u64>>,
}

impl CacheTelemetry {
    /// Records a cache operation.
    ///
    /// `count` is how many entries the activity touched: one for a hit, the number of
    /// victims for an eviction, the number of removed entries for a tag invalidation.
    pub(crate) fn record(&self, cache_name: CacheName, operation: CacheOperation, activity: CacheActivity, count: u64) {
        #[cfg(any(feature = "metrics", test))]
        if let Some(counter) = &self.inner.event_counter {
            let attrs = [
                KeyValue::new(attributes::CACHE_NAME, cache_name),
                KeyValue::new(attributes::CACHE_OPERATION_NAME, operation.as_str()),
                KeyValue::new(attributes::CACHE_ACTIVITY_NAME, activity.as_str()),
            ];
            counter.add(count, &attrs);
        }

        #[cfg(any(feature = "logs", test))]
        if self.inner.logging_enabled {
            Self::emit(cache_name, operation, activity, count);
        }
    }

    /// Records the current footprint of the in-memory tier.
    pub(crate) fn record_size(&self, cache_name: CacheName, bytes: u64, entries: u64) {
        #[cfg(any(feature = "metrics", test))]
        {
            let attrs = [KeyValue::new(attributes::CACHE_NAME, cache_name)];
            if let Some(gauge) = &self.inner.size_bytes {
                gauge.record(bytes, &attrs);
            }
            if let Some(gauge) = &self.inner.entries {
                gauge.record(entries, &attrs);
            }
        }
        #[cfg(not(any(feature = "metrics", test)))]
        let _ = (cache_name, bytes, entries);
    }

    #[cfg(any(feature = "logs", test))]
    fn emit(cache_name: CacheName, operation: CacheOperation, activity: CacheActivity, count: u64) {
        let op = operation.as_str();
        let act = activity.as_str();

        // Tracing levels must be constant, so the macro expands once per level.
        // Field names must match the constants in attributes.rs.
        macro_rules! emit_event {
            ($level:ident) => {
                tracing::$level!(
                    cache.name = cache_name,
                    cache.operation = op,
                    cache.activity = act,
                    cache.count = count,
                    "cache.event"
                )
            };
        }

        match activity.severity() {
            Severity::Error => emit_event!(error),
            Severity::Info => emit_event!(info),
            Severity::Debug => emit_event!(debug),
            _ => {}
        }
    }
}
