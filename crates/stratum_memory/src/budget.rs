// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Running byte total of resident entries against a fixed budget.
///
/// The budget never refuses a charge on its own; the owning tier checks
/// [`admits`](Self::admits) before storing a value and evicts while
/// [`is_exceeded`](Self::is_exceeded) holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteBudget {
    used: usize,
    max: usize,
}

impl ByteBudget {
    /// Creates an empty budget with room for `max` bytes.
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self { used: 0, max }
    }

    /// Returns the configured limit.
    #[must_use]
    pub fn max(&self) -> usize {
        self.max
    }

    /// Returns the bytes currently charged.
    #[must_use]
    pub fn used(&self) -> usize {
        self.used
    }

    /// Returns the bytes left before the limit, zero when over it.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.max.saturating_sub(self.used)
    }

    /// Returns `true` if a value of `size` bytes could ever fit.
    ///
    /// A value exactly as large as the limit is admitted.
    #[must_use]
    pub fn admits(&self, size: usize) -> bool {
        size <= self.max
    }

    /// Adds `size` bytes to the running total.
    pub fn charge(&mut self, size: usize) {
        self.used = self.used.saturating_add(size);
    }

    /// Subtracts `size` bytes previously charged.
    pub fn release(&mut self, size: usize) {
        debug_assert!(size <= self.used, "releasing {size} bytes with only {} charged", self.used);
        self.used = self.used.saturating_sub(size);
    }

    /// Returns `true` while the total is over the limit.
    #[must_use]
    pub fn is_exceeded(&self) -> bool {
        self.used > self.max
    }

    /// Drops every charge.
    pub fn reset(&mut self) {
        self.used = 0;
    }
}
