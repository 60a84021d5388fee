use async_trait::async_trait;
use rig::client::ProviderClient;
use rig::prelude::TranscriptionClient;
use rig::providers::openai;
use rig::transcription::TranscriptionModel;

use crate::domain::{ports::TranscriptionService, DomainError};
use crate::infrastructure::config::TranscriptionConfig;
use crate::infrastructure::llm::require_api_key;

/// OpenAI Whisper through rig.
pub struct WhisperTranscription {
    model: String,
}

impl WhisperTranscription {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    pub fn from_config(config: &TranscriptionConfig) -> Self {
        Self::new(&config.model)
    }
}

#[async_trait]
impl TranscriptionService for WhisperTranscription {
    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<String, DomainError> {
        require_api_key()?;
        let client = openai::Client::from_env();
        let model = client.transcription_model(&self.model);

        let response = model
            .transcription_request()
            .data(audio)
            .filename(Some(filename.to_string()))
            .send()
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        Ok(response.text)
    }
}
