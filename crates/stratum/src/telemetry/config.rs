// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Telemetry configuration for cache operations.

#[cfg(any(feature = "logs", feature = "metrics", test))]
use std::sync::Arc;

#[cfg(any(feature = "metrics", test))]
use opentelemetry::metrics::{Meter, MeterProvider};

use crate::telemetry::CacheTelemetry;
#[cfg(any(feature = "logs", feature = "metrics", test))]
use crate::telemetry::cache::CacheTelemetryInner;

/// Configuration for cache telemetry.
///
/// Everything starts disabled. Enable logs and/or metrics, then pass the built
/// [`CacheTelemetry`] to [`CacheBuilder::telemetry`](crate::CacheBuilder::telemetry).
/// A cache built without an explicit telemetry setting logs through `tracing` whenever
/// the `logs` feature is on.
///
/// # Examples
///
/// ```
/// use stratum::TelemetryConfig;
///
/// // Silence a cache entirely.
/// let quiet = TelemetryConfig::new().build();
/// ```
///
/// ```ignore
/// // Logs and metrics (requires the `logs` and `metrics` features).
/// let telemetry = TelemetryConfig::new()
///     .with_logs()
///     .with_metrics(&meter_provider)
///     .build();
/// ```
#[derive(Clone, Debug, Default)]
pub struct TelemetryConfig {
    #[cfg(any(feature = "logs", test))]
    logs_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    meter: Option<Meter>,
}

impl TelemetryConfig {
    /// Creates a new telemetry configuration with everything disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables structured logging for cache operations.
    ///
    /// Each operation emits a `cache.event` record through the `tracing` crate, at debug
    /// level for lookups, info for mutations and error for failures.
    #[cfg(any(feature = "logs", test))]
    #[cfg_attr(docsrs, doc(cfg(feature = "logs")))]
    #[must_use]
    pub fn with_logs(self) -> Self {
        Self {
            logs_enabled: true,
            ..self
        }
    }

    /// Enables metrics collection using the provided meter provider.
    ///
    /// Records the `cache.event.count` counter and the `cache.size_bytes` and
    /// `cache.entries` gauges.
    #[cfg(any(feature = "metrics", test))]
    #[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
    #[must_use]
    pub fn with_metrics(mut self, provider: &dyn MeterProvider) -> Self {
        self.meter = Some(crate::telemetry::metrics::create_meter(provider));
        self
    }

    /// Builds the telemetry collector from this configuration.
    #[must_use]
    pub fn build(self) -> CacheTelemetry {
        #[cfg(not(any(feature = "logs", feature = "metrics", test)))]
        {
            CacheTelemetry {}
        }

        #[cfg(any(feature = "logs", feature = "metrics", test))]
        {
            #[cfg(any(feature = "metrics", test))]
            let (event_counter, size_bytes, entries) = {
                use crate::telemetry::metrics::{create_entries_gauge, create_event_counter, create_size_bytes_gauge};
                (
                    self.meter.as_ref().map(create_event_counter),
                    self.meter.as_ref().map(create_size_bytes_gauge),
                    self.meter.as_ref().map(create_entries_gauge),
                )
            };

            CacheTelemetry {
                inner: Arc::new(CacheTelemetryInner {
                    #[cfg(any(feature = "logs", test))]
                    logging_enabled: self.logs_enabled,
                    #[cfg(any(feature = "metrics", test))]
                    event_counter,
                    #[cfg(any(feature = "metrics", test))]
                    size_bytes,
                    #[cfg(any(feature = "metrics", test))]
                    entries,
                }),
            }
        }
    }
}
