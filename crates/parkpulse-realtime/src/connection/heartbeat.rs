//! Ping/pong heartbeat liveness tracking.
//!
//! Detects connections that are technically open at the transport layer but
//! have stopped responding. The driver owns the probe timer; this module
//! only tracks the last liveness reply and decides, per tick, whether to
//! probe again or declare the connection stale.

use std::time::Duration;

use tokio::time::Instant;

use parkpulse_core::config::realtime::RealtimeConfig;

/// Decision returned by [`HeartbeatMonitor::check`] on each probe tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeDecision {
    /// The connection is live enough; send the next probe.
    SendProbe,
    /// No liveness reply within the stale threshold; treat as a failure.
    Stale,
}

/// Tracks the last-seen liveness reply for one connection.
///
/// The clock only has meaning while the connection is open; the driver
/// constructs a fresh monitor on every transition into the open state.
#[derive(Debug)]
pub struct HeartbeatMonitor {
    stale_threshold: Duration,
    last_reply: Instant,
}

impl HeartbeatMonitor {
    /// Create a monitor with the configured stale threshold, treating `now`
    /// as the moment the connection opened.
    pub fn new(config: &RealtimeConfig, now: Instant) -> Self {
        Self {
            stale_threshold: config.stale_threshold(),
            last_reply: now,
        }
    }

    /// Record a liveness reply.
    pub fn record_reply(&mut self, now: Instant) {
        self.last_reply = now;
    }

    /// Time since the last liveness reply.
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_reply)
    }

    /// Decide whether to probe again or give up, checked before each probe.
    pub fn check(&self, now: Instant) -> ProbeDecision {
        if self.elapsed(now) > self.stale_threshold {
            ProbeDecision::Stale
        } else {
            ProbeDecision::SendProbe
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor_at(start: Instant) -> HeartbeatMonitor {
        HeartbeatMonitor::new(&RealtimeConfig::default(), start)
    }

    #[test]
    fn test_fresh_connection_is_live() {
        let start = Instant::now();
        let monitor = monitor_at(start);
        assert_eq!(monitor.check(start), ProbeDecision::SendProbe);
    }

    #[test]
    fn test_one_missed_reply_is_tolerated() {
        let start = Instant::now();
        let monitor = monitor_at(start);
        // 31s elapsed: one probe interval passed without a reply, still under
        // the 45s threshold.
        let now = start + Duration::from_secs(31);
        assert_eq!(monitor.check(now), ProbeDecision::SendProbe);
    }

    #[test]
    fn test_stale_past_threshold() {
        let start = Instant::now();
        let monitor = monitor_at(start);
        let now = start + Duration::from_secs(46);
        assert_eq!(monitor.check(now), ProbeDecision::Stale);
    }

    #[test]
    fn test_reply_resets_the_clock() {
        let start = Instant::now();
        let mut monitor = monitor_at(start);
        monitor.record_reply(start + Duration::from_secs(40));
        let now = start + Duration::from_secs(60);
        assert_eq!(monitor.elapsed(now), Duration::from_secs(20));
        assert_eq!(monitor.check(now), ProbeDecision::SendProbe);
    }
}
