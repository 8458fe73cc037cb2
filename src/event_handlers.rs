//! Lifecycle hooks for the subscription registry.
//!
//! UI code decides how to notify the user; the registry only reports what
//! happened:
//!
//! - [`on_connect`](EventHandlers::on_connect): the channel reported `SUBSCRIBED`
//! - [`on_disconnect`](EventHandlers::on_disconnect): the channel was closed or dropped
//! - [`on_error`](EventHandlers::on_error): a transport failure, retryable or terminal
//! - [`on_status`](EventHandlers::on_status): the coarse [`ConnectionStatus`] changed
//! - [`on_invalidate`](EventHandlers::on_invalidate): debug hook fired after each invalidation
//!
//! # Example
//!
//! ```rust
//! use booking_realtime::{ConnectionStatus, EventHandlers};
//!
//! let handlers = EventHandlers::new()
//!     .on_status(|status| {
//!         if status == ConnectionStatus::Error {
//!             eprintln!("Connection failed, please refresh");
//!         }
//!     })
//!     .on_error(|err| eprintln!("realtime error (recoverable={}): {}", err.recoverable, err));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::cache_key::CacheKey;
use crate::models::ConnectionStatus;

/// Reason for a disconnect event.
#[derive(Debug, Clone)]
pub struct DisconnectReason {
    /// Human-readable description of why the channel went away.
    pub message: String,
    /// Name of the channel that disconnected.
    pub channel: Option<String>,
}

impl DisconnectReason {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            channel: None,
        }
    }

    pub fn for_channel(message: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            channel: Some(channel.into()),
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.channel {
            Some(channel) => write!(f, "{} ({})", self.message, channel),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Error information passed to the `on_error` handler.
#[derive(Debug, Clone)]
pub struct ConnectionError {
    pub message: String,
    /// Whether a retry is scheduled. `false` means the registry gave up.
    pub recoverable: bool,
}

impl ConnectionError {
    pub fn new(message: impl Into<String>, recoverable: bool) -> Self {
        Self {
            message: message.into(),
            recoverable,
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

pub type OnConnectCallback = Arc<dyn Fn() + Send + Sync>;

pub type OnDisconnectCallback = Arc<dyn Fn(DisconnectReason) + Send + Sync>;

pub type OnErrorCallback = Arc<dyn Fn(ConnectionError) + Send + Sync>;

pub type OnStatusChangeCallback = Arc<dyn Fn(ConnectionStatus) + Send + Sync>;

pub type OnInvalidateCallback = Arc<dyn Fn(&CacheKey) + Send + Sync>;

/// Registry lifecycle hooks.
///
/// All handlers are optional. They run on the registry task, so they must
/// return quickly and must not call back into the registry and wait on it.
#[derive(Clone, Default)]
pub struct EventHandlers {
    pub(crate) on_connect: Option<OnConnectCallback>,
    pub(crate) on_disconnect: Option<OnDisconnectCallback>,
    pub(crate) on_error: Option<OnErrorCallback>,
    pub(crate) on_status: Option<OnStatusChangeCallback>,
    pub(crate) on_invalidate: Option<OnInvalidateCallback>,
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlers")
            .field("on_connect", &self.on_connect.is_some())
            .field("on_disconnect", &self.on_disconnect.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_status", &self.on_status.is_some())
            .field("on_invalidate", &self.on_invalidate.is_some())
            .finish()
    }
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked when the channel reports `SUBSCRIBED`.
    pub fn on_connect(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_connect = Some(Arc::new(f));
        self
    }

    /// Register a callback invoked when a connected channel is lost or closed.
    pub fn on_disconnect(mut self, f: impl Fn(DisconnectReason) + Send + Sync + 'static) -> Self {
        self.on_disconnect = Some(Arc::new(f));
        self
    }

    /// Register a callback invoked on every transport failure.
    ///
    /// [`ConnectionError::recoverable`] tells whether a retry was scheduled.
    pub fn on_error(mut self, f: impl Fn(ConnectionError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Register a callback invoked whenever the coarse status changes.
    pub fn on_status(mut self, f: impl Fn(ConnectionStatus) + Send + Sync + 'static) -> Self {
        self.on_status = Some(Arc::new(f));
        self
    }

    /// Register a **debug hook** invoked after each cache invalidation.
    pub fn on_invalidate(mut self, f: impl Fn(&CacheKey) + Send + Sync + 'static) -> Self {
        self.on_invalidate = Some(Arc::new(f));
        self
    }

    /// Returns `true` if any handler is registered.
    pub fn has_any(&self) -> bool {
        self.on_connect.is_some()
            || self.on_disconnect.is_some()
            || self.on_error.is_some()
            || self.on_status.is_some()
            || self.on_invalidate.is_some()
    }

    // ---------------------------------------------------------------
    // Internal dispatch helpers
    // ---------------------------------------------------------------

    pub(crate) fn emit_connect(&self) {
        if let Some(cb) = &self.on_connect {
            cb();
        }
    }

    pub(crate) fn emit_disconnect(&self, reason: DisconnectReason) {
        if let Some(cb) = &self.on_disconnect {
            cb(reason);
        }
    }

    pub(crate) fn emit_error(&self, error: ConnectionError) {
        if let Some(cb) = &self.on_error {
            cb(error);
        }
    }

    pub(crate) fn emit_status(&self, status: ConnectionStatus) {
        if let Some(cb) = &self.on_status {
            cb(status);
        }
    }

    pub(crate) fn emit_invalidate(&self, key: &CacheKey) {
        if let Some(cb) = &self.on_invalidate {
            cb(key);
        }
    }
}
