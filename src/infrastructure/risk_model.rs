use serde::Deserialize;
use std::path::Path;

use crate::domain::{ports::RiskModel, DomainError, RawPrediction, FEATURE_COUNT};

#[derive(Debug, Deserialize)]
struct HeadFile {
    intercept: f64,
    weights: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ModelFile {
    breach: Option<HeadFile>,
    admission: Option<HeadFile>,
    waiting: Option<HeadFile>,
}

#[derive(Debug, Clone, PartialEq)]
struct Head {
    intercept: f64,
    weights: [f64; FEATURE_COUNT],
}

impl Head {
    fn from_file(name: &str, file: HeadFile) -> Result<Self, DomainError> {
        let weights: [f64; FEATURE_COUNT] = file.weights.try_into().map_err(|w: Vec<f64>| {
            DomainError::configuration(format!(
                "{name} head has {} weights, expected {FEATURE_COUNT}",
                w.len()
            ))
        })?;
        if !file.intercept.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(DomainError::configuration(format!(
                "{name} head contains non-finite coefficients"
            )));
        }
        Ok(Self {
            intercept: file.intercept,
            weights,
        })
    }

    fn linear(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        self.intercept
            + self
                .weights
                .iter()
                .zip(features.iter())
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }

    fn logistic(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        1.0 / (1.0 + (-self.linear(features)).exp())
    }
}

/// Two logistic heads (breach, admission) and a linear waiting-time head,
/// read from a JSON coefficients file.
#[derive(Debug, Clone)]
pub struct LinearRiskModel {
    breach: Option<Head>,
    admission: Option<Head>,
    waiting: Option<Head>,
}

impl LinearRiskModel {
    pub fn from_json(raw: &str) -> Result<Self, DomainError> {
        let file: ModelFile = serde_json::from_str(raw)
            .map_err(|e| DomainError::configuration(format!("invalid model file: {e}")))?;

        let model = Self {
            breach: file.breach.map(|h| Head::from_file("breach", h)).transpose()?,
            admission: file
                .admission
                .map(|h| Head::from_file("admission", h))
                .transpose()?,
            waiting: file.waiting.map(|h| Head::from_file("waiting", h)).transpose()?,
        };

        if model.breach.is_none() && model.admission.is_none() && model.waiting.is_none() {
            return Err(DomainError::configuration("model file defines no heads"));
        }
        Ok(model)
    }

    pub fn load(path: &Path) -> Result<Self, DomainError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DomainError::configuration(format!("cannot read model {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }
}

impl RiskModel for LinearRiskModel {
    fn predict(&self, features: &[f64; FEATURE_COUNT]) -> Result<RawPrediction, DomainError> {
        Ok(RawPrediction {
            breach_probability: self.breach.as_ref().map(|h| h.logistic(features)),
            admission_probability: self.admission.as_ref().map(|h| h.logistic(features)),
            wait_minutes: self.waiting.as_ref().map(|h| h.linear(features)),
        })
    }
}
