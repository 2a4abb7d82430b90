//! Fixed-delay retry for transient failures.

use std::future::Future;
use std::time::Duration;

use crate::error::TychoError;

/// Retry policy: a fixed pause between attempts, retrying only errors that
/// report themselves retryable.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first one fails.
    pub max_retries: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Execute an async operation with retry. Non-retryable errors are
    /// returned immediately without sleeping.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, TychoError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TychoError>>,
    {
        let max_attempts = self.max_retries.saturating_add(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if !e.is_retryable() || attempt >= max_attempts {
                        return Err(e);
                    }

                    tracing::warn!(
                        attempt,
                        max_attempts,
                        error = %e,
                        "Retrying after error"
                    );

                    tokio::time::sleep(self.delay).await;
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| TychoError::Timeout(0)))
    }
}

/// Simple pseudo-random factor [0, 1) without pulling in the rand crate.
pub(crate) fn rand_factor() -> f64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
        .hash(&mut hasher);
    std::thread::current().id().hash(&mut hasher);

    let hash = hasher.finish();
    (hash % 10000) as f64 / 10000.0
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn retries_retryable_errors_up_to_the_budget() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        let attempts = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&attempts);
        let result: Result<(), TychoError> = policy
            .execute(|| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(TychoError::Timeout(100))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_errors_fail_immediately() {
        let policy = RetryPolicy::new(5, Duration::from_secs(2));
        let attempts = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&attempts);
        let result: Result<(), TychoError> = policy
            .execute(|| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(TychoError::Authentication("bad key".into()))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn success_after_transient_failures() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        let attempts = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&attempts);
        let result = policy
            .execute(|| {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(TychoError::Timeout(100))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn rand_factor_stays_in_unit_interval() {
        for _ in 0..100 {
            let f = rand_factor();
            assert!((0.0..1.0).contains(&f));
        }
    }
}
