use rand::Rng;
use std::time::Duration;

/// Hard ceiling on any single backoff sleep.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Upper bound of the random jitter, as a fraction of the base delay.
pub const JITTER_FRACTION: f64 = 0.1;

/// Per-entry retry budget and exponential backoff schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; attempts run `0..=max_retries`.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: MAX_BACKOFF,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Whether a backoff sleep follows a failed `attempt`. Never after the last.
    pub fn should_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// `min(base * 2^attempt * (1 + jitter), max_delay)`, jitter in `[0, 0.1)`.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let jitter = if self.jitter {
            rand::rng().random_range(0.0..JITTER_FRACTION)
        } else {
            0.0
        };
        self.delay_with_jitter(attempt, jitter)
    }

    fn delay_with_jitter(&self, attempt: u32, jitter: f64) -> Duration {
        let cap = self.max_delay.min(MAX_BACKOFF);
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let millis = self.base_delay.as_millis() as f64 * 2f64.powi(exponent) * (1.0 + jitter);

        if !millis.is_finite() || millis >= cap.as_millis() as f64 {
            cap
        } else {
            Duration::from_nanos((millis * 1_000_000.0).round() as u64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(base_ms: u64, jitter: bool) -> RetryPolicy {
        RetryPolicy {
            max_retries: 10,
            base_delay: Duration::from_millis(base_ms),
            max_delay: MAX_BACKOFF,
            jitter,
        }
    }

    #[test]
    fn test_exponential_backoff_timing() {
        let policy = policy(100, false);
        let delays: Vec<Duration> = (0..5).map(|attempt| policy.calculate_delay(attempt)).collect();

        assert_eq!(delays[0], Duration::from_millis(100));
        assert_eq!(delays[1], Duration::from_millis(200));
        assert_eq!(delays[2], Duration::from_millis(400));
        assert_eq!(delays[3], Duration::from_millis(800));
        assert_eq!(delays[4], Duration::from_millis(1600));
    }

    #[test]
    fn test_jitter_stays_within_ten_percent() {
        let policy = policy(1000, true);
        for _ in 0..200 {
            let delay = policy.calculate_delay(1);
            assert!(delay >= Duration::from_millis(2000));
            assert!(delay < Duration::from_millis(2200));
        }
    }

    #[test]
    fn test_delay_is_non_decreasing_and_capped() {
        let policy = policy(250, true);
        let mut previous = Duration::ZERO;
        for attempt in 0..64 {
            let delay = policy.calculate_delay(attempt);
            assert!(delay >= previous, "attempt {attempt}: {delay:?} < {previous:?}");
            assert!(delay <= MAX_BACKOFF);
            previous = delay;
        }
        assert_eq!(policy.calculate_delay(u32::MAX), MAX_BACKOFF);
    }

    #[test]
    fn test_configured_cap_above_ceiling_is_clamped() {
        let policy = RetryPolicy {
            max_delay: Duration::from_secs(600),
            ..policy(1000, false)
        };
        assert_eq!(policy.calculate_delay(20), MAX_BACKOFF);
    }

    #[test]
    fn test_no_sleep_after_final_attempt() {
        let policy = RetryPolicy {
            max_retries: 3,
            ..Default::default()
        };
        assert_eq!(policy.total_attempts(), 4);
        assert!(policy.should_retry_after(2));
        assert!(!policy.should_retry_after(3));
    }
}
