//! Retry-until-ready combinator for catalog calls.
//!
//! The catalog answers bursts of requests with "too many requests". Callers
//! wrap each remote operation in [`until_ready`], which sleeps and re-issues
//! the exact same call until it either succeeds or fails for another reason.
//! There is no attempt limit: the user is expected to get unblocked eventually.

use std::{future::Future, time::Duration};

use tokio::time::sleep;

use crate::{catalog::CatalogError, warning};

/// Server-requested waits above this are reported before sleeping.
const LONG_WAIT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Pause used when the server does not say how long to wait.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(backoff: Duration) -> Self {
        Self { backoff }
    }

    /// A policy that retries without pausing.
    pub fn immediate() -> Self {
        Self {
            backoff: Duration::ZERO,
        }
    }
}

/// Re-issues `call` while `retry_worthy` classifies its error as transient.
pub async fn retry_while<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    retry_worthy: P,
    wait_hint: impl Fn(&E) -> Option<Duration>,
    mut call: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    loop {
        match call().await {
            Err(err) if retry_worthy(&err) => {
                let wait = wait_hint(&err).unwrap_or(policy.backoff);
                if wait > LONG_WAIT {
                    warning!(
                        "Rate limit asks for an abnormally long wait of {} seconds.",
                        wait.as_secs()
                    );
                }
                sleep(wait).await;
            }
            other => return other,
        }
    }
}

/// [`retry_while`] specialised to catalog calls and their rate-limit errors.
pub async fn until_ready<T, F, Fut>(policy: &RetryPolicy, call: F) -> Result<T, CatalogError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CatalogError>>,
{
    retry_while(
        policy,
        CatalogError::is_retry_worthy,
        CatalogError::retry_after,
        call,
    )
    .await
}
