use crate::domain::{errors::DomainError, RawPrediction, FEATURE_COUNT};

/// Scores a preprocessed feature row. Synchronous: models are held in memory.
pub trait RiskModel: Send + Sync {
    fn predict(&self, features: &[f64; FEATURE_COUNT]) -> Result<RawPrediction, DomainError>;
}
