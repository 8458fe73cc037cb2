//! Connection state machine with bounded exponential backoff.
//!
//! ```text
//! Disconnected ──subscribe──▶ Connecting ──SUBSCRIBED──▶ Connected
//!                                 │  ▲                       │
//!                       failure   │  │ retry deadline        │ failure
//!                                 ▼  │                       │
//!                         ReconnectWait(attempt, delay) ◀────┘
//!                                 │
//!                                 └─ attempts exhausted ──▶ Failed
//! ```
//!
//! The controller does not own a timer. It records the retry deadline and the
//! registry task sleeps until it; discarding the controller discards the retry.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::models::{ChannelStatus, ConnectionStatus};
use crate::options::RealtimeOptions;

/// Detailed connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    ReconnectWait {
        attempt: u32,
        delay: Duration,
    },
    /// Retries exhausted; only an explicit reconnect leaves this state.
    Failed,
}

impl ConnectionState {
    pub fn status(&self) -> ConnectionStatus {
        match self {
            ConnectionState::Disconnected => ConnectionStatus::Disconnected,
            ConnectionState::Connecting | ConnectionState::ReconnectWait { .. } => {
                ConnectionStatus::Connecting
            },
            ConnectionState::Connected => ConnectionStatus::Connected,
            ConnectionState::Failed => ConnectionStatus::Error,
        }
    }
}

/// Outcome of feeding a transport status into the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Connected,
    RetryScheduled { attempt: u32, delay: Duration },
    Failed { attempts: u32 },
    /// Status did not change anything (duplicate report, or already failed).
    Ignored,
}

/// `min(base × 2^attempt, max)`, saturating on overflow.
pub fn backoff_delay(base: Duration, max: Duration, attempt: u32) -> Duration {
    let base_ms = base.as_millis().min(u64::MAX as u128) as u64;
    let factor = 2u64.saturating_pow(attempt);
    let delay = Duration::from_millis(base_ms.saturating_mul(factor));
    std::cmp::min(delay, max)
}

#[derive(Debug)]
pub struct ReconnectionController {
    state: ConnectionState,
    attempt: u32,
    delay: Duration,
    retry_at: Option<Instant>,
    base_delay: Duration,
    max_delay: Duration,
    max_attempts: u32,
    auto_reconnect: bool,
}

impl ReconnectionController {
    pub fn new(options: &RealtimeOptions) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            attempt: 0,
            delay: options.reconnect_delay(),
            retry_at: None,
            base_delay: options.reconnect_delay(),
            max_delay: options.max_reconnect_delay(),
            max_attempts: options.max_reconnect_attempts,
            auto_reconnect: options.auto_reconnect,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state.status()
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Delay used for the most recent retry, or the base delay after a reset.
    pub fn current_delay(&self) -> Duration {
        self.delay
    }

    pub fn retry_deadline(&self) -> Option<Instant> {
        self.retry_at
    }

    /// Record that a subscribe call was just issued.
    pub fn begin_connect(&mut self) {
        self.retry_at = None;
        self.state = ConnectionState::Connecting;
    }

    pub fn on_status(&mut self, status: ChannelStatus, now: Instant) -> Transition {
        if !status.is_retryable() {
            self.reset();
            self.state = ConnectionState::Connected;
            return Transition::Connected;
        }

        match self.state {
            // One failed attempt often reports twice (timeout, then close).
            ConnectionState::ReconnectWait { .. } | ConnectionState::Failed => {
                return Transition::Ignored;
            },
            _ => {},
        }

        if !self.auto_reconnect || self.attempt >= self.max_attempts {
            self.retry_at = None;
            self.state = ConnectionState::Failed;
            return Transition::Failed {
                attempts: self.attempt,
            };
        }

        let delay = backoff_delay(self.base_delay, self.max_delay, self.attempt);
        self.attempt += 1;
        self.delay = delay;
        self.retry_at = Some(now + delay);
        self.state = ConnectionState::ReconnectWait {
            attempt: self.attempt,
            delay,
        };
        Transition::RetryScheduled {
            attempt: self.attempt,
            delay,
        }
    }

    /// Returns `true` once the retry deadline has passed; the caller must
    /// then resubscribe. The controller moves to `Connecting`.
    pub fn poll_retry(&mut self, now: Instant) -> bool {
        match self.retry_at {
            Some(deadline) if deadline <= now => {
                self.begin_connect();
                true
            },
            _ => false,
        }
    }

    /// Explicit teardown: drop the pending retry without counting a failure.
    pub fn cancel(&mut self) {
        self.retry_at = None;
        self.state = ConnectionState::Disconnected;
    }

    fn reset(&mut self) {
        self.attempt = 0;
        self.delay = self.base_delay;
        self.retry_at = None;
    }
}
