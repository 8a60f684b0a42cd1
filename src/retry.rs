//! Retry and backoff policy for external service calls.
//!
//! Wraps a single async call with bounded retries. Transient failures
//! (timeout, rate limit, 5xx, network) consume an attempt and wait an
//! exponentially growing delay; permanent failures surface immediately with
//! no retry and no delay. Exhausting the attempt budget surfaces
//! [`Error::MaxRetriesExceeded`].

use crate::{Error, Result};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first (not "retries after").
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Factor applied per successive retry. Must exceed 1.0 so every delay
    /// is strictly larger than the previous one.
    pub multiplier: f64,
    /// Upper bound on a single delay.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }
}

/// Successful run, with the attempt count and inter-attempt delays consumed.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub value: T,
    /// Attempts made, 1 = succeeded on the first try.
    pub attempts: u32,
    pub delays: Vec<Duration>,
}

/// Executes operations under a [`RetryConfig`].
///
/// The policy also records the delay sequence of its most recent run,
/// so exhausted runs stay observable too.
pub struct RetryPolicy {
    config: RetryConfig,
    last_delays: Mutex<Vec<Duration>>,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            last_delays: Mutex::new(Vec::new()),
        }
    }

    /// Delay to wait after the `attempt`-th failure (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.config.multiplier.powi(attempt.saturating_sub(1) as i32);
        let millis = (self.config.base_delay.as_millis() as f64 * factor) as u64;
        Duration::from_millis(millis).min(self.config.max_delay)
    }

    /// Inter-attempt delays of the most recent `run`.
    pub fn last_delays(&self) -> Vec<Duration> {
        self.last_delays.lock().unwrap().clone()
    }

    /// Run `op` until it succeeds, fails permanently, or exhausts attempts.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<RetryOutcome<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut delays = Vec::new();
        self.last_delays.lock().unwrap().clear();

        for attempt in 1..=max_attempts {
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(label, attempt, "call recovered after retries");
                    }
                    return Ok(RetryOutcome {
                        value,
                        attempts: attempt,
                        delays,
                    });
                }
                Err(err) if !err.is_transient() => {
                    debug!(label, attempt, error = %err, "permanent failure, not retrying");
                    return Err(err);
                }
                Err(err) if attempt == max_attempts => {
                    warn!(label, attempts = attempt, error = %err, "attempt budget exhausted");
                    return Err(Error::MaxRetriesExceeded {
                        attempts: attempt,
                        last_error: err.to_string(),
                    });
                }
                Err(err) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure, backing off"
                    );
                    delays.push(delay);
                    self.last_delays.lock().unwrap().push(delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
        unreachable!("loop returns on the final attempt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(
            RetryConfig::new()
                .with_max_attempts(max_attempts)
                .with_base_delay(Duration::from_millis(1)),
        )
    }

    #[tokio::test]
    async fn first_try_success_makes_one_attempt() {
        let policy = fast_policy(3);
        let outcome = policy
            .run("noop", || async { Ok::<_, Error>(7) })
            .await
            .unwrap();
        assert_eq!(outcome.value, 7);
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.delays.is_empty());
    }

    #[tokio::test]
    async fn fail_twice_then_succeed() {
        let policy = fast_policy(3);
        let calls = AtomicU32::new(0);
        let outcome = policy
            .run("flaky", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(Error::service_unavailable(503, "warming up"))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.delays.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_surfaces_max_retries() {
        let policy = fast_policy(3);
        let calls = AtomicU32::new(0);
        let err = policy
            .run("down", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Error::timeout("no answer")) }
            })
            .await
            .unwrap_err();
        match err {
            Error::MaxRetriesExceeded { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("expected MaxRetriesExceeded, got {other}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(policy.last_delays().len(), 2);
    }

    #[tokio::test]
    async fn permanent_failure_not_retried() {
        let policy = fast_policy(5);
        let calls = AtomicU32::new(0);
        let err = policy
            .run("broken", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Error::malformed("text-gen", "not json")) }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(policy.last_delays().is_empty());
    }

    #[test]
    fn delays_strictly_increase() {
        let policy = RetryPolicy::new(
            RetryConfig::new()
                .with_max_attempts(5)
                .with_base_delay(Duration::from_millis(100)),
        );
        let mut previous = Duration::ZERO;
        for attempt in 1..=4 {
            let delay = policy.delay_for(attempt);
            assert!(
                delay > previous,
                "delay for attempt {attempt} ({delay:?}) not above {previous:?}"
            );
            previous = delay;
        }
    }

    #[test]
    fn delay_capped_at_max() {
        let policy = RetryPolicy::new(RetryConfig {
            max_attempts: 10,
            base_delay: Duration::from_secs(10),
            multiplier: 10.0,
            max_delay: Duration::from_secs(30),
        });
        assert_eq!(policy.delay_for(5), Duration::from_secs(30));
    }
}
