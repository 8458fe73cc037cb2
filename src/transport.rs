//! Capability contracts required from external collaborators.
//!
//! The registry never talks to a network or a cache directly. It needs:
//!
//! - a [`RealtimeTransport`] that opens and closes named channels,
//! - a [`TransportChannel`] that accepts event handlers and a status callback,
//! - a [`CacheInvalidator`] that drops one slice of cached data.
//!
//! Callbacks handed to the transport are cheap to call from any thread; they
//! only enqueue a message for the registry task.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::cache_key::CacheKey;
use crate::models::{ChannelStatus, SubscriptionSpec};

/// Handler invoked by the transport for every change matching a spec.
pub type OnEventCallback = Arc<dyn Fn(JsonValue) + Send + Sync>;

/// Callback invoked by the transport whenever the channel status changes,
/// with optional error text.
pub type OnStatusCallback = Arc<dyn Fn(ChannelStatus, Option<String>) + Send + Sync>;

/// One open logical subscription on the transport.
pub trait TransportChannel: Send + 'static {
    /// Register `handler` for changes matching `spec`. Chainable.
    fn on_event(&mut self, spec: SubscriptionSpec, handler: OnEventCallback) -> &mut Self;

    /// Start (or restart) the subscription; status is reported through
    /// `callback`. Chainable.
    fn subscribe(&mut self, callback: OnStatusCallback) -> &mut Self;
}

/// Backend change-stream transport.
pub trait RealtimeTransport: Send + 'static {
    type Channel: TransportChannel;

    fn open_channel(&self, name: &str) -> Self::Channel;

    fn close_channel(&self, channel: Self::Channel);
}

/// Data-fetching cache the registry invalidates.
pub trait CacheInvalidator: Send + 'static {
    fn invalidate(&self, key: &CacheKey);
}

impl<F> CacheInvalidator for F
where
    F: Fn(&CacheKey) + Send + 'static,
{
    fn invalidate(&self, key: &CacheKey) {
        self(key)
    }
}
