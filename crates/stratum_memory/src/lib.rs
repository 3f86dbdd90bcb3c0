// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Byte-bounded LRU in-memory tier for the stratum tiered cache.
//!
//! [`L1Cache`] keeps values in memory up to a byte budget. Each value is measured with
//! [`ByteSize`](stratum_tier::ByteSize) when inserted; when the total goes over budget the
//! least recently used entries are evicted and handed back to the caller, which can pass
//! them on to a lower tier. Entries may carry a tag so that a domain event can drop all of
//! them at once.
//!
//! # Quick Start
//!
//! ```
//! use stratum_memory::L1Cache;
//!
//! let cache = L1Cache::<String, String, &str>::builder()
//!     .max_bytes(100)
//!     .build();
//!
//! cache.insert(&"key1".to_string(), "value1".to_string(), Some("mission_updated"));
//! assert!(cache.contains(&"key1".to_string()));
//!
//! cache.invalidate_by_tag(&"mission_updated");
//! assert!(!cache.contains(&"key1".to_string()));
//! ```
//!
//! # Features
//!
//! - **Byte budget**: eviction is driven by measured size, not entry count
//! - **LRU order**: reads and writes both refresh recency
//! - **Tag invalidation**: drop every entry tied to an event in one call
//! - `serde`: derive `Deserialize`/`Serialize` for [`L1Config`]

mod budget;
pub mod builder;
mod recency;
pub mod tier;

#[doc(inline)]
pub use budget::ByteBudget;
#[doc(inline)]
pub use builder::{DEFAULT_MAX_BYTES, L1CacheBuilder, L1Config};
#[doc(inline)]
pub use recency::{Iter, NodeIndex, RecencyList};
#[doc(inline)]
pub use tier::L1Cache;
