//! Retry policy with unjittered exponential backoff.
//!
//! The policy itself is pure: [`RetryConfig::schedule`] lists the
//! `(attempt, delay)` pairs a fetch may go through. Actual suspension goes
//! through a [`Sleeper`] so tests can observe delays without waiting.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

/// Exponential delay between attempts: `base * factor^attempt`, capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    /// Delay after the first failed attempt.
    pub base: Duration,
    /// The multiplicative factor for each subsequent retry.
    pub factor: f64,
    /// The maximum duration to wait between retries.
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::doubling(Duration::from_secs(1))
    }
}

impl Backoff {
    /// Doubles from `base`, capped at one minute.
    pub const fn doubling(base: Duration) -> Self {
        Self {
            base,
            factor: 2.0,
            max: Duration::from_secs(60),
        }
    }

    /// Delay to wait after the failed attempt with index `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let seconds = self.base.as_secs_f64() * self.factor.powi(exponent);
        Duration::from_secs_f64(seconds.min(self.max.as_secs_f64()))
    }
}

/// One planned attempt: its index and the wait applied if it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryStep {
    pub attempt: u32,
    pub delay: Duration,
}

/// Configuration for the fetch retry loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total HTTP attempts per logical fetch. Treated as at least 1.
    pub max_retries: u32,
    /// The backoff strategy to use between retries.
    pub backoff: Backoff,
    /// Status codes treated as transient upstream throttling.
    pub retry_on_status: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Backoff::default(),
            retry_on_status: vec![429],
        }
    }
}

impl RetryConfig {
    /// Exponential backoff doubling from `base`.
    pub fn exponential(max_retries: u32, base: Duration) -> Self {
        Self {
            max_retries,
            backoff: Backoff::doubling(base),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Check if a given HTTP status code should trigger a retry.
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    /// Every attempt the loop may make, in order.
    pub fn schedule(&self) -> impl Iterator<Item = RetryStep> + '_ {
        (0..self.attempts()).map(|attempt| RetryStep {
            attempt,
            delay: self.delay_for_attempt(attempt),
        })
    }

    /// Upper bound on time spent sleeping when every attempt fails.
    ///
    /// The final attempt is not followed by a wait.
    pub fn max_total_sleep(&self) -> Duration {
        self.schedule()
            .take(self.attempts().saturating_sub(1) as usize)
            .map(|step| step.delay)
            .sum()
    }
}

/// Suspension used between attempts.
pub trait Sleeper: Send + Sync + Debug {
    fn sleep<'a>(&'a self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Real suspension on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep<'a>(&'a self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Records requested delays and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<Duration> {
        self.slept
            .lock()
            .expect("sleeper log is not poisoned")
            .clone()
    }

    pub fn total(&self) -> Duration {
        self.recorded().into_iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep<'a>(&'a self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        self.slept
            .lock()
            .expect("sleeper log is not poisoned")
            .push(duration);
        Box::pin(async {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backoff_is_powers_of_two_seconds() {
        let backoff = Backoff::default();

        assert_eq!(backoff.delay(0), Duration::from_secs(1));
        assert_eq!(backoff.delay(1), Duration::from_secs(2));
        assert_eq!(backoff.delay(2), Duration::from_secs(4));
        assert_eq!(backoff.delay(3), Duration::from_secs(8));
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let backoff = Backoff {
            max: Duration::from_secs(1),
            ..Backoff::doubling(Duration::from_millis(100))
        };

        assert_eq!(backoff.delay(3), Duration::from_millis(800));
        assert_eq!(backoff.delay(4), Duration::from_secs(1));
        assert_eq!(backoff.delay(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn test_default_retry_config() {
        let config = RetryConfig::default();

        assert_eq!(config.max_retries, 3);
        assert!(config.should_retry_status(429));
        assert!(!config.should_retry_status(500));
        assert!(!config.should_retry_status(503));
        assert!(!config.should_retry_status(404));
    }

    #[test]
    fn test_schedule_lists_each_attempt_with_its_delay() {
        let config = RetryConfig::default();
        let steps = config.schedule().collect::<Vec<_>>();

        assert_eq!(
            steps,
            vec![
                RetryStep {
                    attempt: 0,
                    delay: Duration::from_secs(1)
                },
                RetryStep {
                    attempt: 1,
                    delay: Duration::from_secs(2)
                },
                RetryStep {
                    attempt: 2,
                    delay: Duration::from_secs(4)
                },
            ]
        );
        assert_eq!(config.max_total_sleep(), Duration::from_secs(3));
    }

    #[test]
    fn test_configured_base_doubles_without_jitter() {
        let config = RetryConfig::exponential(4, Duration::from_millis(250));
        let delays = config.schedule().map(|step| step.delay).collect::<Vec<_>>();

        assert_eq!(
            delays,
            vec![
                Duration::from_millis(250),
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(2),
            ]
        );
        assert_eq!(config.max_total_sleep(), Duration::from_millis(1_750));
    }

    #[test]
    fn test_zero_retries_still_allows_one_attempt() {
        let config = RetryConfig::exponential(0, Duration::from_millis(500));

        assert_eq!(config.attempts(), 1);
        assert_eq!(
            config.schedule().collect::<Vec<_>>(),
            vec![RetryStep {
                attempt: 0,
                delay: Duration::from_millis(500)
            }]
        );
        assert_eq!(config.max_total_sleep(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_recording_sleeper_does_not_wait() {
        let sleeper = RecordingSleeper::new();
        sleeper.sleep(Duration::from_secs(3600)).await;
        sleeper.sleep(Duration::from_secs(2)).await;

        assert_eq!(sleeper.total(), Duration::from_secs(3602));
    }
}
