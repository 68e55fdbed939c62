use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use tracing::{debug, instrument};

use super::GenerativeModel;
use super::error::ModelError;

/// [`GenerativeModel`] backed by a `genai` client.
///
/// The provider is resolved from the model name (`qwen3-coder:30b` routes to a local Ollama).
#[derive(Clone)]
pub struct GenaiModel {
    client: Client,
    model: String,
    options: ChatOptions,
}

impl std::fmt::Debug for GenaiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiModel")
            .field("model", &self.model)
            .finish()
    }
}

impl GenaiModel {
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_client(Client::default(), model)
    }

    pub fn with_client(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            options: ChatOptions::default().with_temperature(0.0),
        }
    }
}

#[async_trait]
impl GenerativeModel for GenaiModel {
    #[instrument(skip(self, system, user), fields(model = %self.model, user_len = user.len()))]
    async fn complete(&self, system: &str, user: &str) -> Result<String, ModelError> {
        let request = ChatRequest::new(vec![ChatMessage::user(user)]).with_system(system);

        let response = self
            .client
            .exec_chat(&self.model, request, Some(&self.options))
            .await
            .map_err(|e| ModelError::Provider {
                message: e.to_string(),
            })?;

        let text = response
            .first_text()
            .map(str::to_string)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ModelError::EmptyResponse)?;

        debug!(response_len = text.len(), "Model responded");
        Ok(text)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
