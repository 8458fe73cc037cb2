//! Error types for booking-realtime

use thiserror::Error;

/// Errors raised by the subscription manager.
///
/// Transport failures are never reported through this type; they drive the
/// reconnection state machine and surface as a
/// [`ConnectionStatus`](crate::ConnectionStatus) instead.
#[derive(Error, Debug)]
pub enum RealtimeError {
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    #[error("Registry closed: {0}")]
    RegistryClosed(String),
}

/// Result type for subscription manager operations
pub type Result<T> = std::result::Result<T, RealtimeError>;
