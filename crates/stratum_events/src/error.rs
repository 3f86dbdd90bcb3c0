// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// A subscriber failed while handling a published event.
///
/// Returned by subscriber callbacks and passed back unchanged to the caller of
/// [`EventBroker::publish`](crate::EventBroker::publish).
///
/// # Examples
///
/// ```
/// use stratum_events::SubscriberError;
///
/// let error = SubscriberError::from_message("cache tier unreachable");
/// assert!(error.to_string().contains("cache tier unreachable"));
/// ```
#[ohno::error]
pub struct SubscriberError {}

impl SubscriberError {
    /// Creates a subscriber error from any type that can be converted to an error.
    ///
    /// This is how callbacks outside this crate report a failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use stratum_events::SubscriberError;
    ///
    /// let io = std::io::Error::other("disk full");
    /// let error = SubscriberError::from_message(io);
    /// assert!(error.to_string().contains("disk full"));
    /// ```
    pub fn from_message(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(cause)
    }
}
