//! Actor scopes a subscription is opened on behalf of.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RealtimeError, Result};
use crate::options::RealtimeOptions;

/// Logical identity a subscription is opened for.
///
/// The scope decides the channel name, the per-row filters and the debounce
/// window. It is immutable while a channel is open; switching scope tears the
/// channel down and opens a new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Scope {
    /// A student looking at their own bookings.
    User(String),
    /// An instructor looking at the bookings assigned to them.
    Instructor(String),
    /// System-wide administrator view.
    Admin,
}

impl Scope {
    pub fn user(id: impl Into<String>) -> Self {
        Scope::User(id.into())
    }

    pub fn instructor(id: impl Into<String>) -> Self {
        Scope::Instructor(id.into())
    }

    /// Identifier of the actor, `None` for the admin scope.
    pub fn scope_id(&self) -> Option<&str> {
        match self {
            Scope::User(id) | Scope::Instructor(id) => Some(id.as_str()),
            Scope::Admin => None,
        }
    }

    /// Deterministic channel name. Re-subscribing after a transient
    /// disconnect reuses the same name.
    pub fn channel_name(&self) -> String {
        match self {
            Scope::User(id) => format!("user-{}-updates", id),
            Scope::Instructor(id) => format!("instructor-{}-updates", id),
            Scope::Admin => "admin-system-updates".to_string(),
        }
    }

    /// Row column carrying the actor id in booking-related payloads.
    pub fn actor_column(&self) -> Option<&'static str> {
        match self {
            Scope::User(_) => Some("student_id"),
            Scope::Instructor(_) => Some("instructor_id"),
            Scope::Admin => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Scope::Admin)
    }

    /// Quiet period after the last event before an invalidation fires.
    pub fn debounce_window(&self, options: &RealtimeOptions) -> Duration {
        match self {
            Scope::User(_) | Scope::Instructor(_) => Duration::from_millis(options.debounce_ms),
            Scope::Admin => Duration::from_millis(options.admin_debounce_ms),
        }
    }

    /// Rejects scopes whose id would produce an ambiguous channel name.
    pub fn validate(&self) -> Result<()> {
        match self.scope_id() {
            Some(id) if id.trim().is_empty() => Err(RealtimeError::InvalidScope(format!(
                "{} scope requires a non-empty id",
                self.kind()
            ))),
            _ => Ok(()),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Scope::User(_) => "user",
            Scope::Instructor(_) => "instructor",
            Scope::Admin => "admin",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope_id() {
            Some(id) => write!(f, "{}:{}", self.kind(), id),
            None => write!(f, "{}", self.kind()),
        }
    }
}
