//! Exponential reconnect backoff.

use std::time::Duration;

use parkpulse_core::config::realtime::RealtimeConfig;

/// Pure backoff delay computation.
///
/// `delay(n) = min(base * factor^(n-1), cap)` for attempt `n >= 1`.
/// Deterministic and side-effect free; jitter, if configured, is applied by
/// the driver when it schedules the timer.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    base: Duration,
    factor: f64,
    cap: Duration,
}

impl BackoffPolicy {
    /// Create a policy from explicit parameters.
    pub fn new(base: Duration, factor: f64, cap: Duration) -> Self {
        Self { base, factor, cap }
    }

    /// Compute the delay before the given attempt number (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let millis = (self.base.as_millis() as f64) * self.factor.powi(exponent);
        let capped = millis.min(self.cap.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

impl From<&RealtimeConfig> for BackoffPolicy {
    fn from(config: &RealtimeConfig) -> Self {
        Self::new(
            config.reconnect_base_delay(),
            config.reconnect_backoff_factor,
            config.reconnect_max_delay(),
        )
    }
}

/// Retry bookkeeping for the connection driver.
///
/// Owns the consecutive-failure counter; the driver consults it for the
/// next delay and for the give-up decision.
#[derive(Debug)]
pub struct ReconnectBackoff {
    policy: BackoffPolicy,
    attempts: u32,
}

impl ReconnectBackoff {
    /// Create from the realtime configuration.
    pub fn new(config: &RealtimeConfig) -> Self {
        Self {
            policy: BackoffPolicy::from(config),
            attempts: 0,
        }
    }

    /// Record a failed or involuntary close. Returns the new attempt count.
    pub fn record_failure(&mut self) -> u32 {
        self.attempts = self.attempts.saturating_add(1);
        self.attempts
    }

    /// Reset the counter. Called on every successful open and on manual
    /// reconnect.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Consecutive failed attempts so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay to wait before the next attempt, based on the current counter.
    pub fn next_delay(&self) -> Duration {
        self.policy.delay(self.attempts.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> BackoffPolicy {
        BackoffPolicy::new(Duration::from_millis(2000), 1.5, Duration::from_millis(30_000))
    }

    #[test]
    fn test_delay_formula() {
        let p = policy();
        assert_eq!(p.delay(1), Duration::from_millis(2000));
        assert_eq!(p.delay(2), Duration::from_millis(3000));
        assert_eq!(p.delay(3), Duration::from_millis(4500));
        assert_eq!(p.delay(4), Duration::from_millis(6750));
    }

    #[test]
    fn test_delay_is_capped() {
        let p = policy();
        assert_eq!(p.delay(20), Duration::from_millis(30_000));
        assert_eq!(p.delay(u32::MAX), Duration::from_millis(30_000));
    }

    #[test]
    fn test_delay_is_non_decreasing() {
        let p = policy();
        let mut previous = Duration::ZERO;
        for attempt in 1..=32 {
            let delay = p.delay(attempt);
            assert!(delay >= previous, "delay shrank at attempt {attempt}");
            previous = delay;
        }
    }

    #[test]
    fn test_counter_increments_and_resets() {
        let config = RealtimeConfig::default();
        let mut backoff = ReconnectBackoff::new(&config);
        assert_eq!(backoff.attempts(), 0);
        assert_eq!(backoff.record_failure(), 1);
        assert_eq!(backoff.next_delay(), Duration::from_millis(2000));
        assert_eq!(backoff.record_failure(), 2);
        assert_eq!(backoff.next_delay(), Duration::from_millis(3000));
        backoff.reset();
        assert_eq!(backoff.attempts(), 0);
    }
}
