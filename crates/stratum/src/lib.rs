// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A tiered, byte-bounded cache with event-driven invalidation.
//!
//! This crate provides:
//! - A byte-budgeted LRU in-memory tier ([`L1Cache`])
//! - Optional lower tiers behind the [`CacheTier`] trait, fed by L1 evictions and
//!   consulted on L1 misses
//! - Tag invalidation driven by domain events published on an [`EventBroker`]
//! - Structured logs through `tracing` and OpenTelemetry metrics
//!
//! # Examples
//!
//! ## Basic In-Memory Cache
//!
//! ```
//! use stratum::Cache;
//!
//! let cache = Cache::builder::<String, String, ()>()
//!     .max_bytes(1024)
//!     .build_detached();
//!
//! cache.insert(&"key".to_string(), "value".to_string(), None);
//! assert_eq!(cache.get(&"key".to_string())?, "value");
//! # Ok::<(), stratum::CacheMiss>(())
//! ```
//!
//! ## Event-Driven Invalidation
//!
//! ```
//! use stratum::{Cache, EventBroker};
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum ServerEvent {
//!     VideoUploaded,
//!     VideoStateChange,
//! }
//!
//! let broker = EventBroker::<ServerEvent>::new();
//! let cache = Cache::builder::<u64, String, ServerEvent>().build(&broker);
//!
//! cache.insert(&1, "transcript".to_string(), Some(ServerEvent::VideoUploaded));
//! cache.insert(&2, "state".to_string(), Some(ServerEvent::VideoStateChange));
//!
//! broker.publish(&ServerEvent::VideoUploaded, None)?;
//! assert!(!cache.contains(&1));
//! assert!(cache.contains(&2));
//! # Ok::<(), stratum::SubscriberError>(())
//! ```
//!
//! # Features
//!
//! - `logs` (default): emit a `cache.event` record per operation through `tracing`
//! - `metrics`: record OpenTelemetry counters and gauges
//! - `serde`: deserialize [`L1Config`] from host configuration
//! - `test-util`: expose [`MockTier`] for testing code that uses a lower tier

pub mod builder;
pub mod cache;
mod miss;
mod telemetry;

#[doc(inline)]
pub use builder::CacheBuilder;
#[doc(inline)]
pub use cache::{Cache, CacheName};
#[doc(inline)]
pub use miss::CacheMiss;
#[doc(inline)]
pub use stratum_events::{EventBroker, SubscriberError, SubscriptionId};
#[doc(inline)]
pub use stratum_memory::{DEFAULT_MAX_BYTES, L1Cache, L1CacheBuilder, L1Config};
#[doc(inline)]
pub use stratum_tier::{ByteSize, CacheEntry, CacheTier, Error, Evicted, EvictionReason, Result};
#[doc(inline)]
pub use telemetry::CacheTelemetry;
#[doc(inline)]
pub use telemetry::config::TelemetryConfig;

#[cfg(any(feature = "test-util", test))]
#[doc(inline)]
pub use stratum_tier::testing::{MockTier, TierOp};
