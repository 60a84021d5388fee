use std::sync::Arc;
use tracing::instrument;

use super::features::preprocess;
use crate::domain::{ports::RiskModel, DomainError, PredictionInput, PredictionOutput};

/// Lower bound on a reported wait when the waiting-time head is present.
const MIN_WAIT_MINUTES: i64 = 5;

/// Breach probability scaling for the 3h, 4h, 5h and 6h horizons.
const HORIZON_FACTORS: [f64; 4] = [0.8, 0.9, 1.0, 1.1];

pub struct PredictionService {
    model: Arc<dyn RiskModel>,
}

impl PredictionService {
    pub fn new(model: Arc<dyn RiskModel>) -> Self {
        Self { model }
    }

    #[instrument(skip(self, input), fields(triage = input.triage_code))]
    pub fn predict(&self, input: &PredictionInput) -> Result<PredictionOutput, DomainError> {
        input.validate()?;

        let features = preprocess(input);
        let raw = self.model.predict(&features)?;

        let breach = raw.breach_probability.map_or(0.0, |p| p * 100.0);
        let admission = raw.admission_probability.map_or(0.0, |p| p * 100.0);
        let wait_minutes = raw
            .wait_minutes
            .map_or(0, |w| (w.round() as i64).max(MIN_WAIT_MINUTES));

        let [w3, w4, w5, w6] = HORIZON_FACTORS.map(|f| percent(breach * f));

        Ok(PredictionOutput {
            wait3h: w3,
            wait4h: w4,
            wait5h: w5,
            wait6h: w6,
            admission_likelihood: percent(admission),
            predicted_wait_minutes: wait_minutes,
        })
    }
}

fn percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}
