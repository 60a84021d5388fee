use crate::domain::errors::DomainError;
use async_trait::async_trait;

#[async_trait]
pub trait TranscriptionService: Send + Sync {
    /// Speech-to-text for an uploaded audio file. `filename` carries the
    /// container format (`.webm`, `.wav`, ...).
    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<String, DomainError>;
}
