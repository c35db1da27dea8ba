//! Request pacing and retry for Gmail calls.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use super::GmailError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_requests_per_window: u32,
    pub window: Duration,
    pub retry_delay: Duration,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_requests_per_window: 20,
            window: Duration::from_secs(1),
            retry_delay: Duration::from_millis(1000),
            max_retries: 3,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.retry_delay * 2u32.saturating_pow(attempt)
    }

    fn should_retry(&self, error: &GmailError, attempt: u32) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        matches!(error.status(), Some(status) if status == 429 || (500..600).contains(&status))
    }
}

struct Window {
    started: Instant,
    count: u32,
}

pub struct RateLimiter {
    policy: RetryPolicy,
    window: Mutex<Window>,
}

impl RateLimiter {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            window: Mutex::new(Window {
                started: Instant::now(),
                count: 0,
            }),
        }
    }

    /// Counts one request, sleeping when the current window is over budget.
    pub async fn acquire(&self) {
        let over_budget = {
            let mut window = self.window.lock().await;
            let now = Instant::now();
            if now.duration_since(window.started) < self.policy.window {
                window.count += 1;
                window.count > self.policy.max_requests_per_window
            } else {
                window.started = now;
                window.count = 1;
                false
            }
        };

        if over_budget {
            tracing::debug!("Gmail request budget exhausted, pausing");
            tokio::time::sleep(self.policy.retry_delay).await;
        }
    }

    /// Runs `call` under the limiter, retrying rate-limit and server errors.
    pub async fn execute<T, F, Fut>(&self, mut call: F) -> Result<T, GmailError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GmailError>>,
    {
        self.acquire().await;

        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if self.policy.should_retry(&e, attempt) => {
                    attempt += 1;
                    let delay = self.policy.backoff(attempt);
                    tracing::warn!(
                        "Gmail call failed ({}), retry {} in {:?}",
                        e,
                        attempt,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            retry_delay: Duration::from_millis(1),
            ..RetryPolicy::default()
        }
    }

    fn api(status: u16) -> GmailError {
        GmailError::Api {
            status,
            message: "error".to_string(),
        }
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn retries_server_errors_then_succeeds() {
        let limiter = RateLimiter::new(fast_policy());
        let calls = AtomicU32::new(0);

        let result = limiter
            .execute(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(api(503))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let limiter = RateLimiter::new(fast_policy());
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = limiter
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(api(429)) }
            })
            .await;

        assert_eq!(result.unwrap_err().status(), Some(429));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let limiter = RateLimiter::new(fast_policy());
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = limiter
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(api(404)) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn window_budget_is_enforced() {
        let limiter = RateLimiter::new(RetryPolicy {
            max_requests_per_window: 2,
            window: Duration::from_secs(60),
            retry_delay: Duration::from_millis(20),
            max_retries: 0,
        });

        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(20));

        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
