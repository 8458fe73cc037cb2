use std::fmt;

use serde::{Deserialize, Serialize};

/// Connection status exposed to the UI layer.
///
/// `Connecting` covers both the first subscribe and the wait before a retry,
/// so callers can render a transient "reconnecting" indicator. `Error` is
/// terminal until [`RealtimeRegistry::reconnect`](crate::RealtimeRegistry::reconnect)
/// is called or a new scope is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
        };
        f.write_str(s)
    }
}
