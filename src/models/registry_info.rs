//! Registry metadata exposed to callers.
//!
//! [`RegistryInfo`] is a read-only snapshot of the registry task's state,
//! useful for debugging, tests, and status panels.

use serde::{Deserialize, Serialize};

use crate::reconnect::ConnectionState;
use crate::scope::Scope;

use super::ConnectionStatus;

/// Read-only snapshot of the active subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryInfo {
    /// Scope the channel is open for, `None` when closed.
    pub scope: Option<Scope>,
    /// Name of the open transport channel.
    pub channel_name: Option<String>,
    /// Detailed reconnection state.
    pub state: ConnectionState,
    /// Coarse status as rendered by the UI.
    pub status: ConnectionStatus,
    /// Consecutive failed attempts since the last successful connection.
    pub reconnect_attempt: u32,
    /// Cache keys waiting for their debounce window to elapse.
    pub pending_invalidations: usize,
    /// Event handlers registered on the channel.
    pub handler_count: usize,
    /// Epoch tag of the active scope; bumped on every open.
    pub epoch: u64,
}

impl RegistryInfo {
    pub(crate) fn closed(epoch: u64) -> Self {
        Self {
            scope: None,
            channel_name: None,
            state: ConnectionState::Disconnected,
            status: ConnectionStatus::Disconnected,
            reconnect_attempt: 0,
            pending_invalidations: 0,
            handler_count: 0,
            epoch,
        }
    }

    pub fn is_open(&self) -> bool {
        self.scope.is_some()
    }
}
