// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Extension trait for recording through optional telemetry.

use crate::{
    cache::CacheName,
    telemetry::{CacheActivity, CacheOperation, CacheTelemetry},
};

pub(crate) trait CacheTelemetryExt {
    /// Records a cache operation if telemetry is enabled.
    fn record(&self, name: CacheName, operation: CacheOperation, activity: CacheActivity, count: u64);

    /// Records the in-memory tier footprint if telemetry is enabled.
    fn record_size(&self, name: CacheName, bytes: u64, entries: u64);
}

impl CacheTelemetryExt for Option<CacheTelemetry> {
    #[allow(unused_variables, reason = "No-op when telemetry is disabled")]
    fn record(&self, name: CacheName, operation: CacheOperation, activity: CacheActivity, count: u64) {
        #[cfg(any(feature = "logs", feature = "metrics", test))]
        if let Some(t) = self {
            t.record(name, operation, activity, count);
        }
    }

    #[allow(unused_variables, reason = "No-op when telemetry is disabled")]
    fn record_size(&self, name: CacheName, bytes: u64, entries: u64) {
        #[cfg(any(feature = "logs", feature = "metrics", test))]
        if let Some(t) = self {
            t.record_size(name, bytes, entries);
        }
    }
}
