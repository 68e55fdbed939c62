//! Generative fallback: the model seam, its retrying wrapper, and the prompt.

pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod prompt;
pub mod provider;
pub mod resilient;


pub use error::{ModelCallFailed, ModelError};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockModel;
pub use prompt::{SYSTEM_PROMPT, user_prompt};
pub use provider::GenaiModel;
pub use resilient::{ModelReply, ResilientModelClient, RetryPolicy};

use async_trait::async_trait;

/// A text-in, text-out chat model.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// One attempt: system prompt plus one user turn, returning the raw reply text.
    async fn complete(&self, system: &str, user: &str) -> Result<String, ModelError>;

    /// Model identifier, for logs.
    fn name(&self) -> &str;
}
