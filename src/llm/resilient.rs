use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use super::GenerativeModel;
use super::error::{ModelCallFailed, ModelError};
use crate::config::Config;
use crate::constants::{
    DEFAULT_ATTEMPT_TIMEOUT_SECS, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_UNIT_MS,
    DEFAULT_MAX_ATTEMPTS,
};

/// Attempt budget and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: u32,
    pub backoff_unit: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_unit: Duration::from_millis(DEFAULT_BACKOFF_UNIT_MS),
            attempt_timeout: Duration::from_secs(DEFAULT_ATTEMPT_TIMEOUT_SECS),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff_base: config.backoff_base,
            backoff_unit: config.backoff_unit,
            attempt_timeout: config.attempt_timeout,
        }
    }

    /// Wait after failed attempt `attempt` (0-indexed): `unit × base^attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self.backoff_base.saturating_pow(attempt);
        self.backoff_unit.saturating_mul(factor)
    }
}

/// A successful model reply and how many attempts it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    pub text: String,
    pub attempts: u32,
}

/// Wraps a [`GenerativeModel`] with a per-attempt timeout and exponential backoff.
#[derive(Clone)]
pub struct ResilientModelClient {
    model: Arc<dyn GenerativeModel>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for ResilientModelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientModelClient")
            .field("model", &self.model.name())
            .field("policy", &self.policy)
            .finish()
    }
}

impl ResilientModelClient {
    pub fn new(model: Arc<dyn GenerativeModel>, policy: RetryPolicy) -> Self {
        Self { model, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Calls the model until one attempt succeeds or the budget runs out.
    ///
    /// Attempts run strictly one after another. Neither prompt nor response text is logged.
    #[instrument(skip(self, system, user), fields(model = %self.model.name()))]
    pub async fn invoke(&self, system: &str, user: &str) -> Result<ModelReply, ModelCallFailed> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = ModelError::EmptyResponse;

        for attempt in 0..max_attempts {
            let timeout = self.policy.attempt_timeout;
            let outcome = tokio::time::timeout(timeout, self.model.complete(system, user))
                .await
                .unwrap_or(Err(ModelError::Timeout { after: timeout }));

            match outcome {
                Ok(text) => {
                    debug!(attempts = attempt + 1, "Model call succeeded");
                    return Ok(ModelReply {
                        text,
                        attempts: attempt + 1,
                    });
                }
                Err(e) => last_error = e,
            }

            if attempt + 1 < max_attempts {
                let wait = self.policy.backoff(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    wait_ms = wait.as_millis() as u64,
                    error = %last_error,
                    "Model call failed, retrying"
                );
                tokio::time::sleep(wait).await;
            }
        }

        warn!(
            attempts = max_attempts,
            error = %last_error,
            "Model call failed, retries exhausted"
        );
        Err(ModelCallFailed {
            attempts: max_attempts,
            last_error,
        })
    }
}
