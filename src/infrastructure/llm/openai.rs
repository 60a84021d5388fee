use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::openai;

use crate::domain::{ports::LlmService, DomainError};
use crate::infrastructure::config::LlmConfig;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Fails when the OpenAI key is absent. The rig client reads the key from the
/// environment and panics without it, so callers check this at startup.
pub fn require_api_key() -> Result<(), DomainError> {
    match std::env::var(OPENAI_API_KEY) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        _ => Err(DomainError::configuration(format!(
            "{OPENAI_API_KEY} is not set"
        ))),
    }
}

pub struct OpenAiLlm {
    model: String,
}

impl OpenAiLlm {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(&config.model)
    }
}

#[async_trait]
impl LlmService for OpenAiLlm {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        require_api_key()?;
        let client = openai::Client::from_env();
        let agent = client.agent(&self.model).build();
        agent
            .prompt(prompt)
            .await
            .map_err(|e| DomainError::external(e.to_string()))
    }
}
