//! Bounded retry with backoff for calls to unreliable remote backends.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::application::ports::StorageError;

/// Longest single sleep between attempts
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Errors that know whether another attempt could succeed
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for StorageError {
    fn is_retryable(&self) -> bool {
        match self {
            StorageError::Io(_)
            | StorageError::Transport(_)
            | StorageError::Timeout(_)
            | StorageError::RemoteStatus { .. } => true,
            StorageError::InvalidResponse(_)
            | StorageError::Auth(_)
            | StorageError::Internal(_) => false,
        }
    }
}

/// Retry policy: up to `max_attempts` calls, sleeping `initial_delay`
/// after the first failure and multiplying the delay by
/// `backoff_multiplier` after each subsequent one. No sleep exceeds
/// `max_delay`.
///
/// The final attempt is unguarded: whatever it returns is what the caller
/// sees, including its error.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    backoff_multiplier: f64,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 1.0,
            max_delay: MAX_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, backoff_multiplier: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            backoff_multiplier: if backoff_multiplier.is_finite() && backoff_multiplier >= 1.0 {
                backoff_multiplier
            } else {
                1.0
            },
            max_delay: MAX_RETRY_DELAY,
        }
    }

    /// Lower the ceiling on a single sleep
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    /// Delay after `current`, saturating at `max_delay`
    pub(crate) fn next_delay(&self, current: Duration) -> Duration {
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff_multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Run `operation` under this policy.
    ///
    /// Non-retryable errors are returned immediately without sleeping.
    pub async fn run<T, E, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let mut remaining = self.max_attempts;
        let mut delay = self.initial_delay.min(self.max_delay);

        while remaining > 1 {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    remaining -= 1;
                    warn!(
                        operation = operation_name,
                        attempts_left = remaining,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Remote call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = self.next_delay(delay);
                }
                Err(e) => return Err(e),
            }
        }

        operation().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Flaky(u32),
        Fatal,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Flaky(_))
        }
    }

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::from_millis(1), 1.0)
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = fast_policy(3);

        let result = policy
            .run("flaky", || {
                let calls = Arc::clone(&calls);
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(TestError::Flaky(n))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_budget_surfaces_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = fast_policy(3);

        let result: Result<(), TestError> = policy
            .run("always_fails", || {
                let calls = Arc::clone(&calls);
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Err(TestError::Flaky(n))
                }
            })
            .await;

        // the error from the final (third) attempt is the one returned
        assert_eq!(result, Err(TestError::Flaky(3)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = fast_policy(5);

        let result: Result<(), TestError> = policy
            .run("fatal", || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::Fatal)
                }
            })
            .await;

        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_attempt_is_unguarded() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(0, Duration::from_secs(60), 1.0);
        assert_eq!(policy.max_attempts(), 1);

        let started = Instant::now();
        let result: Result<(), TestError> = policy
            .run("once", || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::Flaky(1))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_backoff_grows_delay() {
        let policy = RetryPolicy::new(3, Duration::from_millis(20), 2.0);
        let started = Instant::now();

        let _: Result<(), TestError> = policy
            .run("backoff", || async { Err(TestError::Flaky(0)) })
            .await;

        // 20ms + 40ms of sleeping before the final attempt
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn test_next_delay_saturates() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1), 1e300);
        assert_eq!(policy.next_delay(Duration::from_millis(1)), MAX_RETRY_DELAY);
        assert_eq!(policy.next_delay(MAX_RETRY_DELAY), MAX_RETRY_DELAY);

        let doubling = RetryPolicy::new(3, Duration::from_secs(1), 2.0);
        assert_eq!(doubling.next_delay(Duration::from_secs(1)), Duration::from_secs(2));
        assert_eq!(doubling.next_delay(Duration::from_secs(40)), MAX_RETRY_DELAY);
    }

    #[tokio::test]
    async fn test_huge_backoff_surfaces_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(4, Duration::from_millis(1), 1e300)
            .with_max_delay(Duration::from_millis(5));

        let started = Instant::now();
        let result: Result<(), TestError> = policy
            .run("huge_backoff", || {
                let calls = Arc::clone(&calls);
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Err(TestError::Flaky(n))
                }
            })
            .await;

        assert_eq!(result, Err(TestError::Flaky(4)));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_initial_delay_is_capped() {
        let policy = RetryPolicy::new(2, Duration::from_secs(3600), 1.0)
            .with_max_delay(Duration::from_millis(10));
        assert_eq!(policy.next_delay(Duration::from_secs(3600)), Duration::from_millis(10));
    }

    #[test]
    fn test_storage_error_classification() {
        assert!(StorageError::Timeout("upload".into()).is_retryable());
        assert!(StorageError::RemoteStatus {
            operation: "upload",
            status: 503
        }
        .is_retryable());
        assert!(!StorageError::Auth("bad password".into()).is_retryable());
        assert!(!StorageError::InvalidResponse("no etag".into()).is_retryable());
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.initial_delay(), Duration::from_secs(1));
        assert_eq!(policy.backoff_multiplier(), 1.0);
    }
}
