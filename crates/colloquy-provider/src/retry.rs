//! Retry and deadline enforcement for completion calls.
//!
//! `RetryingClient` wraps any `CompletionClient` with the policy the
//! orchestrator relies on: a single wall-clock deadline spanning all
//! attempts, exponential backoff between retries, and retries only on
//! transient failures.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, timeout};
use tracing::warn;

use crate::client::{Completion, CompletionClient, CompletionRequest, ProviderError};

/// Retry policy parameters.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total attempts (initial try plus retries).
    pub max_attempts: u32,
    /// Delay before the first retry, doubled for each subsequent one.
    pub backoff_base: Duration,
    /// Overall wall-clock budget spanning all attempts and backoffs.
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(500),
            deadline: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (1-based): base * 2^(attempt-1).
    fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// A completion client that applies a `RetryPolicy` around an inner client.
///
/// Deadline expiry cancels the in-flight attempt and any pending backoff,
/// so no completion can surface after `Timeout` has been returned.
pub struct RetryingClient {
    inner: Arc<dyn CompletionClient>,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(inner: Arc<dyn CompletionClient>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn run_attempts(&self, request: &CompletionRequest) -> Result<Completion, ProviderError> {
        let mut attempt = 1u32;
        loop {
            match self.inner.complete(request).await {
                Ok(completion) => return Ok(completion),
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.backoff_for(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        backoff_ms = delay.as_millis() as u64,
                        error = %e,
                        "Completion attempt failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl CompletionClient for RetryingClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderError> {
        match timeout(self.policy.deadline, self.run_attempts(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    deadline_ms = self.policy.deadline.as_millis() as u64,
                    "Completion deadline elapsed"
                );
                Err(ProviderError::Timeout)
            }
        }
    }
}
