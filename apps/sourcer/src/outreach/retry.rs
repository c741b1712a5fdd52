//! Bounded-retry execution for outreach actions.

use std::future::Future;

use rand::Rng;
use thiserror::Error;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Failure classification reported by an outreach action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Transient failure (timeout, transport hiccup). Retried until the
    /// budget runs out.
    #[error("retryable action failure: {0}")]
    Retryable(String),

    /// Permanent failure (rejected by the platform, invalid target). Never
    /// retried.
    #[error("fatal action failure: {0}")]
    Fatal(String),
}

/// Lifecycle of one outreach action. The non-terminal states are implicit
/// in the retry loop; only terminal states are reported to the guard.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Pending,
    InFlight,
    Success,
    RetryableFailure,
    FatalFailure,
}

/// Backoff schedule: `base_delay * 2^retry` plus a uniform random jitter
/// drawn from `[0, jitter]`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            jitter: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (zero-based).
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let base = self.base_delay.saturating_mul(2u32.saturating_pow(retry));
        if self.jitter.is_zero() {
            return base;
        }
        let jitter_ms = rand::thread_rng().gen_range(0..=self.jitter.as_millis() as u64);
        base + Duration::from_millis(jitter_ms)
    }
}

/// Runs an action through the retry state machine and returns the terminal
/// state plus the number of attempts made. A fatal error or an exhausted
/// retry budget both terminate in `FatalFailure`.
pub async fn run_with_retry<F, Fut>(policy: &RetryPolicy, mut action: F) -> (ActionState, u32)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), ActionError>>,
{
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match action().await {
            Ok(()) => return (ActionState::Success, attempts),
            Err(ActionError::Fatal(msg)) => {
                warn!("Outreach action failed fatally after {attempts} attempt(s): {msg}");
                return (ActionState::FatalFailure, attempts);
            }
            Err(ActionError::Retryable(msg)) => {
                let retry = attempts - 1;
                if retry >= policy.max_retries {
                    warn!("Outreach action exhausted {} retries: {msg}", policy.max_retries);
                    return (ActionState::FatalFailure, attempts);
                }
                let delay = policy.backoff_delay(retry);
                debug!(
                    "Outreach action attempt {attempts} failed ({msg}); retrying in {}ms",
                    delay.as_millis()
                );
                sleep(delay).await;
            }
        }
    }
}
