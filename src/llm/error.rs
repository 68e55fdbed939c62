use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
/// A single failed call to the generative model.
pub enum ModelError {
    /// The provider returned an error (connection refused, HTTP failure, bad model name).
    #[error("model provider error: {message}")]
    Provider {
        /// Provider message.
        message: String,
    },

    /// The attempt exceeded its time budget.
    #[error("model call timed out after {after:?}")]
    Timeout {
        /// Budget that elapsed.
        after: Duration,
    },

    /// The provider answered without any text.
    #[error("model returned no text")]
    EmptyResponse,
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("model call failed after {attempts} attempt(s): {last_error}")]
/// Every attempt failed.
pub struct ModelCallFailed {
    /// Attempts made.
    pub attempts: u32,
    /// Error from the final attempt.
    #[source]
    pub last_error: ModelError,
}
