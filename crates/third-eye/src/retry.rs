//! Capped exponential backoff for completion calls.
//!
//! The policy is a plain value consumed by the completion client. The retry
//! loop takes an injected sleep function so tests can record backoff
//! durations instead of waiting them out.

use std::future::Future;
use std::time::Duration;

use anyhow::{bail, Result};
use tracing::warn;

use crate::results::excerpt;

/// Failure cause for a single attempt. Chooses the backoff flavor.
#[derive(Debug)]
pub enum AttemptError {
    /// Non-success HTTP status from the endpoint, with response body.
    Status { code: u16, body: String },
    /// Transport-level failure (connect, timeout, body read).
    Transport(anyhow::Error),
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status { code, body } => write!(f, "HTTP {}: {}", code, excerpt(body, 80)),
            Self::Transport(source) => write!(f, "transport error: {}", source),
        }
    }
}

/// Retry policy for completion calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts before giving up
    pub max_attempts: u32,
    /// First backoff after an error status
    pub base_delay: Duration,
    /// Ceiling for the exponential backoff
    pub max_delay: Duration,
    /// Flat backoff after a transport failure
    pub transport_delay: Duration,
    /// Courtesy pause after every successful call
    pub post_success_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(120),
            transport_delay: Duration::from_secs(10),
            post_success_delay: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retrying after a failed attempt (0-based).
    ///
    /// Error statuses back off exponentially from `base_delay`, doubling per
    /// attempt, capped at `max_delay`. Transport failures wait a flat
    /// `transport_delay`.
    pub fn backoff(&self, attempt: u32, error: &AttemptError) -> Duration {
        match error {
            AttemptError::Status { .. } => self
                .base_delay
                .saturating_mul(2u32.saturating_pow(attempt))
                .min(self.max_delay),
            AttemptError::Transport(_) => self.transport_delay,
        }
    }
}

/// Run `call` until it succeeds or the attempt limit is exhausted.
///
/// `call` receives the 0-based attempt number. Between failed attempts the
/// loop sleeps per [`RetryPolicy::backoff`]; no sleep follows the final
/// failure. Returns the success value or an error naming the last failure.
pub async fn call_with_retry<T, C, CFut>(
    policy: &RetryPolicy,
    label: &str,
    call: C,
) -> Result<T>
where
    C: FnMut(u32) -> CFut,
    CFut: Future<Output = std::result::Result<T, AttemptError>>,
{
    call_with_retry_using(policy, label, call, tokio::time::sleep).await
}

/// Retry loop core with an injected sleep function.
pub async fn call_with_retry_using<T, C, CFut, S, SFut>(
    policy: &RetryPolicy,
    label: &str,
    mut call: C,
    mut sleep: S,
) -> Result<T>
where
    C: FnMut(u32) -> CFut,
    CFut: Future<Output = std::result::Result<T, AttemptError>>,
    S: FnMut(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    let mut last_error: Option<AttemptError> = None;

    for attempt in 0..policy.max_attempts {
        match call(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => {
                match &error {
                    AttemptError::Status { code, body } => warn!(
                        label = label,
                        attempt = attempt + 1,
                        max_attempts = policy.max_attempts,
                        code = *code,
                        body = %excerpt(body, 80),
                        "call returned error status"
                    ),
                    AttemptError::Transport(source) => warn!(
                        label = label,
                        attempt = attempt + 1,
                        max_attempts = policy.max_attempts,
                        error = %source,
                        "call failed in transport"
                    ),
                }

                if attempt + 1 < policy.max_attempts {
                    sleep(policy.backoff(attempt, &error)).await;
                }
                last_error = Some(error);
            }
        }
    }

    let detail = last_error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "no attempts were made".to_string());
    bail!(
        "{} failed after {} attempts: {}",
        label,
        policy.max_attempts,
        detail
    )
}
