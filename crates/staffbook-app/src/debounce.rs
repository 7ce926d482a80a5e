// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::{Duration, Instant};

pub const FILTER_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DebounceToken(u64);

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    due: Instant,
    token: DebounceToken,
}

/// A value that follows its input only after the input has been stable for
/// `delay`. The owner drives time by calling [`Debounced::poll`] from its
/// event loop; there is no background timer.
#[derive(Debug, Clone)]
pub struct Debounced<T> {
    delay: Duration,
    settled: T,
    pending: Option<Pending<T>>,
    next_token: u64,
}

impl<T: Clone> Debounced<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            delay,
            settled: initial,
            pending: None,
            next_token: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn value(&self) -> &T {
        &self.settled
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.due)
    }

    /// Replaces any pending value and restarts the wait. Only the most
    /// recently issued token can ever fire.
    pub fn schedule(&mut self, value: T, now: Instant) -> DebounceToken {
        self.next_token += 1;
        let token = DebounceToken(self.next_token);
        self.pending = Some(Pending {
            value,
            due: now + self.delay,
            token,
        });
        token
    }

    pub fn cancel(&mut self, token: DebounceToken) -> bool {
        if self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.token == token)
        {
            self.pending = None;
            return true;
        }
        false
    }

    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }

    /// Settles immediately, discarding anything pending.
    pub fn set_now(&mut self, value: T) {
        self.pending = None;
        self.settled = value;
    }

    /// Propagates the pending value once its deadline has passed. Returns the
    /// newly settled value, if any.
    pub fn poll(&mut self, now: Instant) -> Option<&T> {
        let due = self.pending.as_ref().is_some_and(|pending| now >= pending.due);
        if !due {
            return None;
        }
        let pending = self.pending.take()?;
        self.settled = pending.value;
        Some(&self.settled)
    }
}
