use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

use leadscan_common::BudgetConfig;
use reddit_client::RedditError;
use youtube_client::YouTubeError;

/// Upstream `Retry-After` hints longer than this are ignored in favour of
/// the policy's own backoff.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Errors that can signal "slow down" from an upstream.
pub trait Throttled {
    fn is_throttled(&self) -> bool;

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl Throttled for RedditError {
    fn is_throttled(&self) -> bool {
        self.is_rate_limited()
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            RedditError::RateLimited {
                retry_after_secs: Some(secs),
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

impl Throttled for YouTubeError {
    fn is_throttled(&self) -> bool {
        self.is_rate_limited()
    }
}

#[derive(Debug)]
pub enum RetryError<E> {
    /// Throttled on every attempt.
    Exhausted { attempts: u32, last: E },
    /// A non-throttling failure; never retried.
    Failed(E),
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted { attempts, last } => {
                write!(f, "throttled on all {attempts} attempts: {last}")
            }
            RetryError::Failed(e) => write!(f, "{e}"),
        }
    }
}

/// Exponential backoff: `base`, `2 * base`, `4 * base`, ... plus jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base: Duration,
    pub jitter: Duration,
}

impl RetryPolicy {
    /// Deterministic part of the wait before retry number `retry` (0-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base.saturating_mul(2u32.saturating_pow(retry))
    }

    fn jitter(&self) -> Duration {
        let max = self.jitter.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max))
    }
}

/// Per-adapter request budget: minimum spacing between upstream calls and
/// bounded retry on throttling. Each adapter owns its own budget.
#[derive(Debug)]
pub struct RequestBudget {
    delay: Duration,
    policy: RetryPolicy,
    last_request: Mutex<Option<Instant>>,
}

impl RequestBudget {
    pub fn new(delay: Duration, policy: RetryPolicy) -> Self {
        Self {
            delay,
            policy,
            last_request: Mutex::new(None),
        }
    }

    pub fn from_config(config: &BudgetConfig) -> Self {
        Self::new(
            config.request_delay(),
            RetryPolicy {
                max_attempts: config.max_attempts.max(1),
                base: config.backoff_base(),
                jitter: config.jitter(),
            },
        )
    }

    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.delay {
                tokio::time::sleep(self.delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Run `op` under the budget, retrying throttled attempts with backoff.
    pub async fn call<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Throttled + fmt::Display,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            self.pace().await;

            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_throttled() => {
                    if attempt >= self.policy.max_attempts {
                        warn!(label, attempts = attempt, error = %e, "Throttled on every attempt, giving up");
                        return Err(RetryError::Exhausted { attempts: attempt, last: e });
                    }
                    let mut backoff = self.policy.backoff(attempt - 1);
                    if let Some(hint) = e.retry_after().filter(|d| *d <= MAX_RETRY_AFTER) {
                        backoff = backoff.max(hint);
                    }
                    let backoff = backoff + self.policy.jitter();
                    warn!(
                        label,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "Throttled by upstream, retrying after backoff"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(RetryError::Failed(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn budget(max_attempts: u32) -> RequestBudget {
        RequestBudget::new(
            Duration::ZERO,
            RetryPolicy {
                max_attempts,
                base: Duration::ZERO,
                jitter: Duration::ZERO,
            },
        )
    }

    fn throttled() -> RedditError {
        RedditError::RateLimited {
            retry_after_secs: None,
        }
    }

    #[test]
    fn backoff_doubles_from_base() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base: Duration::from_secs(1),
            jitter: Duration::from_millis(250),
        };
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        for _ in 0..20 {
            assert!(policy.jitter() <= Duration::from_millis(250));
        }
    }

    #[tokio::test]
    async fn throttling_that_clears_within_the_cap_succeeds() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = budget(4)
            .call("test", || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(throttled())
                } else {
                    Ok("listing")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "listing");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn persistent_throttling_stops_at_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = budget(4)
            .call("test", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(throttled())
            })
            .await;

        assert!(matches!(result, Err(RetryError::Exhausted { attempts: 4, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn other_failures_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = budget(4)
            .call("test", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(YouTubeError::QuotaExceeded("daily quota".into()))
            })
            .await;

        assert!(matches!(result, Err(RetryError::Failed(YouTubeError::QuotaExceeded(_)))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn successive_calls_are_spaced_by_the_delay() {
        let budget = RequestBudget::new(
            Duration::from_secs(2),
            RetryPolicy {
                max_attempts: 1,
                base: Duration::ZERO,
                jitter: Duration::ZERO,
            },
        );
        let start = Instant::now();
        for _ in 0..3 {
            let _: Result<(), RetryError<RedditError>> = budget.call("test", || async { Ok(()) }).await;
        }
        assert!(start.elapsed() >= Duration::from_secs(4));
    }
}
