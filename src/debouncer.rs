//! Trailing-edge debounce of cache invalidations.
//!
//! Every event for a key pushes that key's deadline to `now + window`. A key
//! is released once its deadline passes with no newer event, so a burst of
//! any length produces exactly one invalidation, timed from its last event.
//! Deadlines are plain values owned by the debouncer; dropping the debouncer
//! (or calling [`Debouncer::cancel_all`]) cancels them.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache_key::CacheKey;

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: HashMap<CacheKey, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Restart the window for `key`. Returns `true` when an earlier pending
    /// deadline for the same key was replaced.
    pub fn schedule(&mut self, key: CacheKey, now: Instant) -> bool {
        self.pending.insert(key, now + self.window).is_some()
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    /// Remove and return every key whose deadline is at or before `now`,
    /// earliest first.
    pub fn take_expired(&mut self, now: Instant) -> Vec<CacheKey> {
        let mut expired: Vec<(Instant, CacheKey)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, deadline)| (*deadline, key.clone()))
            .collect();
        expired.sort();

        for (_, key) in &expired {
            self.pending.remove(key);
        }
        expired.into_iter().map(|(_, key)| key).collect()
    }

    /// Drop every pending deadline without releasing it.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    pub fn is_pending(&self, key: &CacheKey) -> bool {
        self.pending.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
