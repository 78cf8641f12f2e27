//! Bounded retry of fallible asynchronous operations

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Bounded retry schedule with exponential backoff
///
/// The schedule covers a total number of attempts, so a policy with one
/// attempt never retries. The delay before each retry starts at the base
/// backoff and doubles after every failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Creates a new policy covering `attempts` total attempts
    ///
    /// A value of zero is treated as one since an operation that may
    /// never run cannot produce a result.
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// Total number of attempts the policy permits
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Runs the operation until it succeeds, fails terminally, or the attempts are exhausted
    ///
    /// The `retryable` predicate decides whether a given error is worth another
    /// attempt; errors it rejects are returned immediately.
    pub async fn run<T, E, Op, Fut, C>(&self, mut operation: Op, mut retryable: C) -> Result<T, E>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: FnMut(&E) -> bool,
    {
        let mut delay = self.backoff;
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt < self.attempts && retryable(&error) => {
                    debug!(attempt, delay = ?delay, "Retrying failed operation");
                    sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const SHORT_BACKOFF: Duration = Duration::from_millis(1);

    async fn failing_until(counter: &AtomicU32, successful_attempt: u32) -> Result<u32, &str> {
        let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;

        if attempt < successful_attempt {
            Err("transient")
        } else {
            Ok(attempt)
        }
    }

    #[tokio::test]
    async fn succeed_after_transient_failures() {
        let counter = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, SHORT_BACKOFF);

        let result = policy
            .run(|| failing_until(&counter, 3), |_| true)
            .await
            .unwrap();

        assert_eq!(result, 3);
    }

    #[tokio::test]
    async fn give_up_after_exhaustion() {
        let counter = AtomicU32::new(0);
        let policy = RetryPolicy::new(2, SHORT_BACKOFF);

        let result = policy.run(|| failing_until(&counter, 5), |_| true).await;

        assert_eq!(result, Err("transient"));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn bail_on_terminal_errors() {
        let counter = AtomicU32::new(0);
        let policy = RetryPolicy::new(5, SHORT_BACKOFF);

        let result = policy.run(|| failing_until(&counter, 5), |_| false).await;

        assert_eq!(result, Err("transient"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn treat_zero_attempts_as_one() {
        assert_eq!(RetryPolicy::new(0, SHORT_BACKOFF).attempts(), 1);
    }
}
