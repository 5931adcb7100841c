//! WebSocket heartbeat configuration

use std::time::Duration;

/// Configuration for WebSocket heartbeats (ping/pong)
///
/// A managed stream pings the peer every `interval` and gives up on it once
/// nothing has been heard for `interval + timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WsHeartbeatConfig {
    /// Interval between ping messages
    pub interval: Duration,
    /// Grace period for the peer to answer
    pub timeout: Duration,
}

impl Default for WsHeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(25),
            timeout: Duration::from_secs(20),
        }
    }
}

impl WsHeartbeatConfig {
    /// Create a new heartbeat config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ping interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the pong timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Silence after which the peer is considered gone
    pub fn deadline(&self) -> Duration {
        self.interval + self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_deadline_is_interval_plus_timeout(
            interval_secs in 1u64..3600,
            timeout_secs in 1u64..3600,
        ) {
            let config = WsHeartbeatConfig::new()
                .interval(Duration::from_secs(interval_secs))
                .timeout(Duration::from_secs(timeout_secs));

            prop_assert_eq!(config.interval, Duration::from_secs(interval_secs));
            prop_assert_eq!(config.deadline(), Duration::from_secs(interval_secs + timeout_secs));
        }
    }
}
