mod conversation;
mod document;
mod embedding;
mod prediction;

pub use conversation::{ChatMode, Message, MessageRole};
pub use document::{chunk_content, ChunkMetadata, Document, DocumentChunk, SearchResult};
pub use embedding::Embedding;
pub use prediction::{
    Gender, PredictionInput, PredictionOutput, RawPrediction, ReferralSource, FEATURE_COUNT,
};
