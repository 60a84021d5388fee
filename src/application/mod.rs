//! Application layer - Use cases and orchestration.
//!
//! Services here depend on domain ports (traits) rather than concrete
//! providers, so each sub-application can be exercised with in-memory fakes.

pub mod services;

pub use services::{
    PredictionService, PromptTemplates, RagAnswer, RagQuery, RagService, RagSettings, SourceRef,
};
