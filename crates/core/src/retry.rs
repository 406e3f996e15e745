//! Declarative retry policy and the async loop that applies it.

use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How often and how patiently an operation is retried.
///
/// Attempt `n` (1-based) that fails is followed by a pause of
/// `backoff_ms * n` before attempt `n + 1`. No pause follows the last attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_ms: u64,
    /// Deadline for each individual attempt.
    pub timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            backoff_ms: 250,
            timeout_ms: 12_000,
        }
    }
}

impl RetryPolicy {
    /// Pause after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(u64::from(attempt)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Attempts actually made; a zero setting still runs the operation once.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Errors the retry loop knows how to classify.
pub trait RetryableError: Sized {
    /// The error produced when an attempt exceeds its deadline.
    fn timed_out(after: Duration) -> Self;

    fn is_retryable(&self) -> bool {
        true
    }
}

impl RetryableError for crate::FetchError {
    fn timed_out(after: Duration) -> Self {
        crate::FetchError::Timeout(after)
    }

    fn is_retryable(&self) -> bool {
        crate::FetchError::is_retryable(self)
    }
}

/// Runs `operation` under `policy`.
///
/// Each attempt is cancelled when it exceeds the policy timeout. The closure
/// receives the 1-based attempt number. Returns the first success, or the
/// error of the last attempt made.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, label: &str, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError + Display,
{
    let attempts = policy.attempts();
    let timeout = policy.timeout();
    let mut attempt = 1;
    loop {
        let outcome = match tokio::time::timeout(timeout, operation(attempt)).await {
            Ok(result) => result,
            Err(_) => Err(E::timed_out(timeout)),
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts && e.is_retryable() => {
                let delay = policy.backoff(attempt);
                warn!("{label}: attempt {attempt}/{attempts} failed: {e}. Retrying in {delay:?}.");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!("{label}: giving up after attempt {attempt}/{attempts}: {e}");
                return Err(e);
            }
        }
    }
}
