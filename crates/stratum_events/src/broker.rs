// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The in-process event broker.

use std::{collections::HashMap, fmt, hash::Hash, sync::Arc};

use parking_lot::RwLock;

use crate::SubscriberError;

type Callback<E, P> = Arc<dyn Fn(&E, Option<&P>) -> Result<(), SubscriberError> + Send + Sync>;

/// Identifies one registered callback.
///
/// Returned by [`EventBroker::subscribe`] and [`EventBroker::subscribe_all`]; pass it to
/// [`EventBroker::unsubscribe`] to remove the callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription<E, P> {
    id: SubscriptionId,
    callback: Callback<E, P>,
}

struct Subscribers<E, P> {
    by_event: HashMap<E, Vec<Subscription<E, P>>>,
    all: Vec<Subscription<E, P>>,
    next_id: u64,
}

impl<E, P> Subscribers<E, P> {
    fn register<F>(&mut self, callback: F) -> Subscription<E, P>
    where
        F: Fn(&E, Option<&P>) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        Subscription {
            id,
            callback: Arc::new(callback),
        }
    }
}

/// Synchronous publish/subscribe hub for domain events.
///
/// Callbacks subscribe either to one event or to every event. [`publish`](Self::publish)
/// runs the callbacks for that event in registration order, then every subscribe-all
/// callback, on the publisher's thread. There is no buffering and no retry.
///
/// The subscriber table is only locked long enough to snapshot it, so a callback may
/// subscribe or publish again without deadlocking. Callbacks added during a publish take
/// effect from the next one.
///
/// Subscribing returns a [`SubscriptionId`]; callbacks stay registered until
/// [`unsubscribe`](Self::unsubscribe) is called with it.
///
/// `E` is the event vocabulary; `P` is an optional payload handed to every callback.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use stratum_events::EventBroker;
///
/// #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// enum ServerEvent {
///     VideoUploaded,
///     VideoStateChange,
/// }
///
/// let broker = EventBroker::<ServerEvent>::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
///
/// let log = Arc::clone(&seen);
/// broker.subscribe(ServerEvent::VideoUploaded, move |event, _| {
///     log.lock().unwrap().push(*event);
///     Ok(())
/// });
///
/// broker.publish(&ServerEvent::VideoUploaded, None).unwrap();
/// broker.publish(&ServerEvent::VideoStateChange, None).unwrap();
/// assert_eq!(*seen.lock().unwrap(), [ServerEvent::VideoUploaded]);
/// ```
pub struct EventBroker<E, P = ()> {
    subscribers: RwLock<Subscribers<E, P>>,
}

impl<E, P> fmt::Debug for EventBroker<E, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscribers = self.subscribers.read();
        f.debug_struct("EventBroker")
            .field("events", &subscribers.by_event.len())
            .field("all", &subscribers.all.len())
            .finish()
    }
}

impl<E, P> Default for EventBroker<E, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, P> EventBroker<E, P> {
    /// Creates a broker with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Subscribers {
                by_event: HashMap::new(),
                all: Vec::new(),
                next_id: 0,
            }),
        }
    }

    /// Registers `callback` for every published event.
    pub fn subscribe_all<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&E, Option<&P>) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        let mut subscribers = self.subscribers.write();
        let subscription = subscribers.register(callback);
        let id = subscription.id;
        subscribers.all.push(subscription);
        id
    }

    /// Removes the callback registered under `id`.
    ///
    /// Returns `false` if it was already removed. A publish that is already running may
    /// still invoke it once.
    ///
    /// # Examples
    ///
    /// ```
    /// use stratum_events::EventBroker;
    ///
    /// let broker = EventBroker::<u32>::new();
    /// let id = broker.subscribe_all(|_, _| Ok(()));
    ///
    /// assert!(broker.unsubscribe(id));
    /// assert!(!broker.unsubscribe(id));
    /// assert_eq!(broker.all_subscriber_count(), 0);
    /// ```
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();

        let before = subscribers.all.len();
        subscribers.all.retain(|s| s.id != id);
        let mut removed = subscribers.all.len() != before;

        subscribers.by_event.retain(|_, list| {
            let before = list.len();
            list.retain(|s| s.id != id);
            removed |= list.len() != before;
            !list.is_empty()
        });
        removed
    }

    /// Returns the number of subscribe-all callbacks.
    #[must_use]
    pub fn all_subscriber_count(&self) -> usize {
        self.subscribers.read().all.len()
    }
}

impl<E, P> EventBroker<E, P>
where
    E: Eq + Hash,
{
    /// Registers `callback` for `event`.
    ///
    /// An event may have any number of callbacks; they run in the order they were added.
    pub fn subscribe<F>(&self, event: E, callback: F) -> SubscriptionId
    where
        F: Fn(&E, Option<&P>) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        let mut subscribers = self.subscribers.write();
        let subscription = subscribers.register(callback);
        let id = subscription.id;
        subscribers.by_event.entry(event).or_default().push(subscription);
        id
    }

    /// Returns the number of callbacks registered for `event` alone.
    #[must_use]
    pub fn subscriber_count(&self, event: &E) -> usize {
        self.subscribers.read().by_event.get(event).map_or(0, Vec::len)
    }

    /// Delivers `event` to its subscribers, then to every subscribe-all callback.
    ///
    /// # Errors
    ///
    /// Returns the first error a callback reports. Callbacks after the failing one are
    /// not invoked.
    pub fn publish(&self, event: &E, payload: Option<&P>) -> Result<(), SubscriberError>
    where
        E: fmt::Debug,
    {
        let callbacks: Vec<Callback<E, P>> = {
            let subscribers = self.subscribers.read();
            subscribers
                .by_event
                .get(event)
                .into_iter()
                .flatten()
                .chain(&subscribers.all)
                .map(|s| Arc::clone(&s.callback))
                .collect()
        };

        tracing::debug!(
            event = ?event,
            subscribers = callbacks.len(),
            has_payload = payload.is_some(),
            "publishing event"
        );

        for callback in &callbacks {
            if let Err(error) = callback(event, payload) {
                tracing::warn!(event = ?event, error = %error, "event subscriber failed");
                return Err(error);
            }
        }
        Ok(())
    }
}
