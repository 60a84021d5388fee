//! Emergency-department wait and admission forecasts, served under
//! `/predictive`.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::api::docs::{self, ApiDocs};
use crate::api::error::{self, ApiError};
use crate::application::PredictionService;
use crate::domain::{PredictionInput, PredictionOutput};

#[derive(Clone)]
pub struct PredictiveState {
    pub service: Arc<PredictionService>,
}

pub fn router(service: Arc<PredictionService>) -> Router {
    Router::new()
        .route("/api/predict", post(predict))
        .with_state(PredictiveState { service })
        .merge(docs::router(Arc::new(api_docs())))
        .fallback(error::not_found)
        .method_not_allowed_fallback(error::method_not_allowed)
}

pub async fn predict(
    State(state): State<PredictiveState>,
    payload: Result<Json<PredictionInput>, JsonRejection>,
) -> Result<Json<PredictionOutput>, ApiError> {
    let Json(input) = payload?;
    let output = state.service.predict(&input)?;
    tracing::info!(
        triage = input.triage_code,
        admission = output.admission_likelihood,
        wait_minutes = output.predicted_wait_minutes,
        "prediction served"
    );
    Ok(Json(output))
}

fn api_docs() -> ApiDocs {
    ApiDocs {
        title: "Clinical Assistant Prediction API",
        description: "API to predict ED wait times, admission likelihood, etc.",
        version: "1.3.0",
        paths: json!({
            "/api/predict": {
                "post": {
                    "summary": "Predict breach risk, admission likelihood and waiting time",
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": {
                            "schema": {
                                "type": "object",
                                "required": [
                                    "age", "dateTime", "gender", "referralSource", "triageCode",
                                    "patientsAhead", "patientsInED", "alteredMentalStatus",
                                    "isAccident", "hasFever"
                                ],
                                "properties": {
                                    "age": { "type": "integer", "exclusiveMinimum": 0 },
                                    "dateTime": { "type": "string", "format": "date-time" },
                                    "gender": { "type": "string", "enum": ["male", "female", "other", "unknown"] },
                                    "referralSource": { "type": "string", "enum": ["gp", "self", "ambulance", "clinic", "other"] },
                                    "triageCode": { "type": "integer", "minimum": 1, "maximum": 5 },
                                    "patientsAhead": { "type": "integer", "minimum": 0 },
                                    "patientsInED": { "type": "integer", "minimum": 0 },
                                    "alteredMentalStatus": { "type": "boolean" },
                                    "isAccident": { "type": "boolean" },
                                    "hasFever": { "type": "boolean" }
                                }
                            },
                            "example": {
                                "age": 55,
                                "dateTime": "2024-04-06T10:30:00",
                                "gender": "female",
                                "referralSource": "gp",
                                "triageCode": 3,
                                "patientsAhead": 4,
                                "patientsInED": 50,
                                "alteredMentalStatus": false,
                                "isAccident": true,
                                "hasFever": false
                            }
                        }}
                    },
                    "responses": {
                        "200": { "description": "wait3h..wait6h and admissionLikelihood in percent, predictedWaitMinutes" },
                        "422": { "description": "Invalid input" },
                        "500": { "description": "Model failure" }
                    }
                }
            }
        }),
    }
}
