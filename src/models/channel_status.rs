use std::fmt;

use serde::{Deserialize, Serialize};

/// Status reported by the transport through the subscribe callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelStatus {
    /// The channel is live and delivering events
    Subscribed,
    /// The subscribe handshake did not complete in time
    TimedOut,
    /// The transport reported a channel-level error
    ChannelError,
    /// The channel closed without being asked to
    Closed,
}

impl ChannelStatus {
    /// Whether this status is a failure the reconnection logic may retry.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ChannelStatus::Subscribed)
    }
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChannelStatus::Subscribed => "SUBSCRIBED",
            ChannelStatus::TimedOut => "TIMED_OUT",
            ChannelStatus::ChannelError => "CHANNEL_ERROR",
            ChannelStatus::Closed => "CLOSED",
        };
        f.write_str(s)
    }
}
