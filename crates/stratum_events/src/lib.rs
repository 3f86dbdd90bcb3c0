// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Synchronous publish/subscribe for domain events.
//!
//! [`EventBroker`] delivers an event to the callbacks subscribed to it and then to every
//! subscribe-all callback, in registration order, on the publishing thread. The stratum
//! cache subscribes to all events and uses each one as an invalidation tag.
//!
//! # Quick Start
//!
//! ```
//! use stratum_events::{EventBroker, SubscriberError};
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum ServerEvent {
//!     VideoUploaded,
//!     VideoTranscriptCompleted,
//! }
//!
//! let broker = EventBroker::<ServerEvent, u64>::new();
//! broker.subscribe_all(|event, video_id| {
//!     println!("{event:?} for {video_id:?}");
//!     Ok(())
//! });
//! broker.subscribe(ServerEvent::VideoTranscriptCompleted, |_, _| {
//!     Err(SubscriberError::from_message("transcript store offline"))
//! });
//!
//! assert!(broker.publish(&ServerEvent::VideoUploaded, Some(&7)).is_ok());
//! assert!(broker.publish(&ServerEvent::VideoTranscriptCompleted, None).is_err());
//! ```

mod broker;
mod error;

#[doc(inline)]
pub use broker::{EventBroker, SubscriptionId};
#[doc(inline)]
pub use error::SubscriberError;
