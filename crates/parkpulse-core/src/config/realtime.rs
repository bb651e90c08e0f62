//! Real-time connection configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) connection configuration.
///
/// All reconnect and heartbeat tunables are overridable at construction
/// and default to the values the dashboard ships with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Base reconnect delay in milliseconds (first retry).
    #[serde(default = "default_reconnect_base_delay")]
    pub reconnect_base_delay_ms: u64,
    /// Multiplicative backoff factor applied per failed attempt.
    #[serde(default = "default_reconnect_backoff_factor")]
    pub reconnect_backoff_factor: f64,
    /// Maximum reconnect delay in milliseconds (backoff cap).
    #[serde(default = "default_reconnect_max_delay")]
    pub reconnect_max_delay_ms: u64,
    /// Maximum consecutive failed reconnect attempts before giving up.
    #[serde(default = "default_reconnect_max_attempts")]
    pub reconnect_max_attempts: u32,
    /// Maximum random jitter in milliseconds added to each reconnect delay.
    /// Zero disables jitter.
    #[serde(default)]
    pub reconnect_jitter_ms: u64,
    /// Heartbeat probe interval in seconds.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: u64,
    /// Seconds without a liveness reply before the connection is stale.
    /// Longer than one probe interval, so one missed reply is tolerated.
    #[serde(default = "default_stale_threshold")]
    pub stale_threshold_seconds: u64,
    /// Connect attempt timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl RealtimeConfig {
    /// Base reconnect delay as a [`Duration`].
    pub fn reconnect_base_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_base_delay_ms)
    }

    /// Maximum reconnect delay as a [`Duration`].
    pub fn reconnect_max_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_max_delay_ms)
    }

    /// Heartbeat probe interval as a [`Duration`].
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_seconds)
    }

    /// Stale threshold as a [`Duration`].
    pub fn stale_threshold(&self) -> Duration {
        Duration::from_secs(self.stale_threshold_seconds)
    }

    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            reconnect_base_delay_ms: default_reconnect_base_delay(),
            reconnect_backoff_factor: default_reconnect_backoff_factor(),
            reconnect_max_delay_ms: default_reconnect_max_delay(),
            reconnect_max_attempts: default_reconnect_max_attempts(),
            reconnect_jitter_ms: 0,
            heartbeat_interval_seconds: default_heartbeat_interval(),
            stale_threshold_seconds: default_stale_threshold(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

fn default_reconnect_base_delay() -> u64 {
    2000
}

fn default_reconnect_backoff_factor() -> f64 {
    1.5
}

fn default_reconnect_max_delay() -> u64 {
    30_000
}

fn default_reconnect_max_attempts() -> u32 {
    10
}

fn default_heartbeat_interval() -> u64 {
    30
}

fn default_stale_threshold() -> u64 {
    45
}

fn default_connect_timeout() -> u64 {
    10
}
