pub mod config;
pub mod embedding;
pub mod knowledge;
pub mod llm;
pub mod risk_model;
pub mod transcription;
pub mod vector_store;

pub use config::{AppConfig, Config, ConfigError, PromptsConfig};
pub use embedding::TextEmbedding;
pub use knowledge::{ingest_directory, IngestStats};
pub use llm::{require_api_key, OpenAiLlm};
pub use risk_model::LinearRiskModel;
pub use transcription::WhisperTranscription;
pub use vector_store::InMemoryVectorStore;
