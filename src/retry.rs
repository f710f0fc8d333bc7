//! Retry-with-backoff as a policy value, not a decorator.
//!
//! `retry(policy, op)` runs `op` until it succeeds, the policy's attempt
//! bound is hit, or the total time budget is exhausted. Only errors the
//! caller marks transient via `should_retry` are retried; anything else
//! (and the final transient failure) is returned immediately.

use rand::Rng;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_tries: u32,
    pub total_budget: Duration,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub factor: f64,
}

impl RetryPolicy {
    pub const fn new(max_tries: u32, total_budget: Duration) -> Self {
        Self {
            max_tries,
            total_budget,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            factor: 2.0,
        }
    }

    /// Adapter-specific constants from the design: narrative retries up to
    /// 5 attempts, trade and macro up to 3, each inside a 60s budget.
    pub const NARRATIVE: Self = Self::new(5, Duration::from_secs(60));
    pub const TRADE: Self = Self::new(3, Duration::from_secs(60));
    pub const MACRO: Self = Self::new(3, Duration::from_secs(60));
    pub const AI_GENERATION: Self = {
        let mut p = Self::new(3, Duration::from_secs(120));
        p.base_delay = Duration::from_millis(500);
        p
    };

    /// Delay before attempt `attempt` (0-indexed), jittered uniformly in
    /// `[0.5x, 1.5x]` around the exponential base, matching the reference
    /// implementation's `backoff.expo` usage.
    fn delay_for(&self, attempt: u32) -> Duration {
        let raw = self.base_delay.as_secs_f64() * self.factor.powi(attempt as i32);
        let capped = raw.min(self.max_delay.as_secs_f64());
        let jitter = rand::thread_rng().gen_range(0.5..1.5);
        Duration::from_secs_f64(capped * jitter)
    }
}

pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    op_name: &str,
    should_retry: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let start = Instant::now();
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                attempt += 1;
                let exhausted_tries = attempt >= policy.max_tries;
                let exhausted_budget = start.elapsed() >= policy.total_budget;
                if !should_retry(&e) || exhausted_tries || exhausted_budget {
                    return Err(e);
                }
                let delay = policy.delay_for(attempt - 1);
                warn!(op_name, attempt, delay_ms = delay.as_millis() as u64, error = %e, "retrying after transient error");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(5, Duration::from_secs(5));
        let result: Result<u32, &str> = retry(&policy, "test", |_| true, || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err("transient")
            } else {
                Ok(42)
            }
        })
        .await;
        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_retrying_when_should_retry_is_false() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(5, Duration::from_secs(5));
        let result: Result<u32, &str> = retry(&policy, "test", |_| false, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("permanent")
        })
        .await;
        assert_eq!(result, Err("permanent"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_max_tries() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            ..RetryPolicy::new(3, Duration::from_secs(5))
        };
        let result: Result<u32, &str> = retry(&policy, "test", |_| true, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("transient")
        })
        .await;
        assert_eq!(result, Err("transient"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
