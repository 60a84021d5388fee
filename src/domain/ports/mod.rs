mod embedding;
mod llm;
mod risk_model;
mod transcription;
mod vector_store;

pub use embedding::EmbeddingService;
pub use llm::LlmService;
pub use risk_model::RiskModel;
pub use transcription::TranscriptionService;
pub use vector_store::VectorStore;
