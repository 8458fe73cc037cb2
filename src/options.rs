use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning knobs for the subscription manager.
///
/// These options control:
/// - Automatic reconnection on transport failure
/// - Reconnection timing and retry limits
/// - Debounce windows per scope kind
///
/// # Example
///
/// ```rust
/// use booking_realtime::RealtimeOptions;
///
/// let options = RealtimeOptions::default()
///     .with_reconnect_delay_ms(500)
///     .with_max_reconnect_attempts(8)
///     .with_admin_debounce_ms(750);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeOptions {
    /// Retry retryable transport failures automatically.
    /// Default: true. When false the first failure is terminal.
    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,

    /// Delay before the first retry, doubled on every consecutive failure.
    /// Default: 1000ms
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Upper bound of the backoff delay.
    /// Default: 30000ms
    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,

    /// Retries allowed before the connection is declared failed.
    /// Default: 5
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Debounce window for user and instructor scopes.
    /// Default: 300ms
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Debounce window for the admin scope, which sees system-wide traffic.
    /// Default: 500ms
    #[serde(default = "default_admin_debounce_ms")]
    pub admin_debounce_ms: u64,

    /// Capacity of the command queue feeding the registry task.
    /// Default: 256
    #[serde(default = "default_command_channel_capacity")]
    pub command_channel_capacity: usize,
}

fn default_auto_reconnect() -> bool {
    true
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

fn default_max_reconnect_delay_ms() -> u64 {
    30000
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_admin_debounce_ms() -> u64 {
    500
}

fn default_command_channel_capacity() -> usize {
    256
}

impl Default for RealtimeOptions {
    fn default() -> Self {
        Self {
            auto_reconnect: default_auto_reconnect(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            max_reconnect_delay_ms: default_max_reconnect_delay_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            debounce_ms: default_debounce_ms(),
            admin_debounce_ms: default_admin_debounce_ms(),
            command_channel_capacity: default_command_channel_capacity(),
        }
    }
}

impl RealtimeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether retryable failures are retried
    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// Set the base backoff delay (in milliseconds)
    pub fn with_reconnect_delay_ms(mut self, delay_ms: u64) -> Self {
        self.reconnect_delay_ms = delay_ms;
        self
    }

    /// Set the backoff ceiling (in milliseconds)
    pub fn with_max_reconnect_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_reconnect_delay_ms = max_delay_ms;
        self
    }

    /// Set the number of retries before giving up
    pub fn with_max_reconnect_attempts(mut self, max_attempts: u32) -> Self {
        self.max_reconnect_attempts = max_attempts;
        self
    }

    pub fn with_debounce_ms(mut self, window_ms: u64) -> Self {
        self.debounce_ms = window_ms;
        self
    }

    pub fn with_admin_debounce_ms(mut self, window_ms: u64) -> Self {
        self.admin_debounce_ms = window_ms;
        self
    }

    pub fn with_command_channel_capacity(mut self, capacity: usize) -> Self {
        self.command_channel_capacity = capacity.max(1);
        self
    }

    pub(crate) fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub(crate) fn max_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.max_reconnect_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_default() {
        let opts = RealtimeOptions::default();

        assert!(opts.auto_reconnect, "auto_reconnect should default to true");
        assert_eq!(opts.reconnect_delay_ms, 1000);
        assert_eq!(opts.max_reconnect_delay_ms, 30000);
        assert_eq!(opts.max_reconnect_attempts, 5);
        assert_eq!(opts.debounce_ms, 300);
        assert_eq!(opts.admin_debounce_ms, 500);
    }

    #[test]
    fn test_options_builder_pattern() {
        let opts = RealtimeOptions::new()
            .with_auto_reconnect(false)
            .with_reconnect_delay_ms(2000)
            .with_max_reconnect_delay_ms(60000)
            .with_max_reconnect_attempts(9)
            .with_debounce_ms(100)
            .with_admin_debounce_ms(200)
            .with_command_channel_capacity(0);

        assert!(!opts.auto_reconnect);
        assert_eq!(opts.reconnect_delay(), Duration::from_secs(2));
        assert_eq!(opts.max_reconnect_delay(), Duration::from_secs(60));
        assert_eq!(opts.max_reconnect_attempts, 9);
        assert_eq!(opts.debounce_ms, 100);
        assert_eq!(opts.admin_debounce_ms, 200);
        assert_eq!(opts.command_channel_capacity, 1, "capacity is clamped to 1");
    }

    #[test]
    fn test_options_partial_json_uses_defaults() {
        let opts: RealtimeOptions =
            serde_json::from_value(json!({"max_reconnect_attempts": 3})).unwrap();
        assert_eq!(opts.max_reconnect_attempts, 3);
        assert_eq!(opts.reconnect_delay_ms, 1000);
        assert_eq!(opts.admin_debounce_ms, 500);
        assert!(opts.auto_reconnect);
    }
}
