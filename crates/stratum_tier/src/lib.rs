// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Shared vocabulary for the stratum tiered cache.
//!
//! This crate holds the pieces every tier agrees on:
//!
//! - [`CacheEntry`], a value paired with its invalidation tag
//! - [`ByteSize`], the capability a value type provides so a byte-bounded tier can account for it
//! - [`Evicted`] and [`EvictionReason`], the record a tier hands back when it lets go of an entry
//! - [`CacheTier`], the trait a tier below the in-memory L1 implements
//! - [`Error`], the opaque failure type of lower-tier operations
//!
//! # Implementing a Lower Tier
//!
//! ```
//! use stratum_tier::{CacheEntry, CacheTier, Error};
//! use std::collections::HashMap;
//! use std::sync::Mutex;
//!
//! struct MapTier<V>(Mutex<HashMap<String, CacheEntry<V, u32>>>);
//!
//! impl<V> CacheTier<String, V, u32> for MapTier<V>
//! where
//!     V: Clone + Send,
//! {
//!     fn get(&self, key: &String) -> Result<Option<CacheEntry<V, u32>>, Error> {
//!         Ok(self.0.lock().unwrap().get(key).cloned())
//!     }
//!
//!     fn insert(&self, key: &String, entry: CacheEntry<V, u32>) -> Result<(), Error> {
//!         self.0.lock().unwrap().insert(key.clone(), entry);
//!         Ok(())
//!     }
//!
//!     fn invalidate(&self, key: &String) -> Result<(), Error> {
//!         self.0.lock().unwrap().remove(key);
//!         Ok(())
//!     }
//!
//!     fn invalidate_by_tag(&self, tag: &u32) -> Result<(), Error> {
//!         self.0.lock().unwrap().retain(|_, entry| entry.tag() != Some(tag));
//!         Ok(())
//!     }
//!
//!     fn clear(&self) -> Result<(), Error> {
//!         self.0.lock().unwrap().clear();
//!         Ok(())
//!     }
//! }
//! ```

mod entry;
mod evicted;
pub mod error;
mod size;
#[cfg(any(feature = "test-util", test))]
pub mod testing;
pub(crate) mod tier;

#[doc(inline)]
pub use entry::CacheEntry;
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use evicted::{Evicted, EvictionReason};
#[doc(inline)]
pub use size::ByteSize;
#[doc(inline)]
pub use tier::CacheTier;
