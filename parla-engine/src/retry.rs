use parla_core::config::RetrySettings;
use std::future::Future;
use std::time::Duration;

/// Bounded exponential backoff: `max_attempts` tries total, sleeping
/// `base_delay * backoff_factor^(n-1)` before retry n+1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            backoff_factor: 2,
        }
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(s: RetrySettings) -> Self {
        Self {
            max_attempts: s.max_attempts.max(1),
            base_delay: Duration::from_millis(s.base_delay_ms),
            backoff_factor: s.backoff_factor.max(1),
        }
    }
}

impl RetryPolicy {
    /// Delay slept after `failed_attempts` failures (1-based).
    pub fn delay_after(&self, failed_attempts: u32) -> Duration {
        let exp = failed_attempts.saturating_sub(1);
        let mult = self.backoff_factor.saturating_pow(exp);
        self.base_delay.saturating_mul(mult)
    }
}

/// Runs `op` up to `policy.max_attempts` times, retrying only errors for
/// which `is_transient` holds. Kept separate from any provider so the loop
/// can be unit-tested without a network.
pub async fn with_retry<T, E, F, Fut, P>(
    policy: RetryPolicy,
    is_transient: P,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && is_transient(&e) => {
                tokio::time::sleep(policy.delay_after(attempt)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
