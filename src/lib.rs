//! # booking-realtime
//!
//! Real-time change-feed subscriptions for the booking application.
//!
//! A [`RealtimeRegistry`] opens one transport channel for the current actor
//! ([`Scope`]), turns bursts of row-change notifications into debounced cache
//! invalidations, and recovers from transport failures with bounded
//! exponential backoff. Callers observe a [`ConnectionStatus`]; nothing in
//! this crate raises transport failures as errors.
//!
//! ## Module Structure
//!
//! - [`scope`] / [`descriptor`]: what a scope subscribes to and how its channel is named
//! - [`dispatcher`] / [`debouncer`]: payload matching and trailing-edge coalescing
//! - [`reconnect`]: connection state machine and backoff policy
//! - [`registry`]: channel ownership and the task driving everything above
//! - [`transport`]: contracts for the transport and cache collaborators

pub mod cache_key;
pub mod debouncer;
pub mod descriptor;
pub mod dispatcher;
pub mod error;
pub mod event_handlers;
pub mod models;
pub mod options;
pub mod reconnect;
pub mod registry;
pub mod scope;
pub mod transport;

pub use cache_key::CacheKey;
pub use descriptor::SubscriptionDescriptor;
pub use error::{RealtimeError, Result};
pub use event_handlers::{ConnectionError, DisconnectReason, EventHandlers};
pub use models::{
    ChangeEvent, ChangeKind, ChannelStatus, ConnectionStatus, Entity, EventKind, RegistryInfo,
    RowFilter, SubscriptionSpec,
};
pub use options::RealtimeOptions;
pub use reconnect::ConnectionState;
pub use registry::{RealtimeRegistry, RealtimeRegistryBuilder};
pub use scope::Scope;
pub use transport::{
    CacheInvalidator, OnEventCallback, OnStatusCallback, RealtimeTransport, TransportChannel,
};
