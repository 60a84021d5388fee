mod features;
mod prediction;
mod prompt;
mod rag;

pub use features::preprocess;
pub use prediction::PredictionService;
pub use prompt::PromptTemplates;
pub use rag::{RagAnswer, RagQuery, RagService, RagSettings, SourceRef};

#[cfg(test)]
pub(crate) use prediction::tests as prediction_fakes;
#[cfg(test)]
pub(crate) use rag::tests as rag_fakes;
