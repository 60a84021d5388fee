use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::DomainError;

/// Number of features the risk models are trained on.
pub const FEATURE_COUNT: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferralSource {
    Gp,
    #[serde(rename = "self")]
    SelfReferral,
    Ambulance,
    Clinic,
    Other,
}

/// Patient arrival details submitted for an emergency-department forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionInput {
    pub age: i64,
    #[serde(deserialize_with = "deserialize_arrival")]
    pub date_time: NaiveDateTime,
    pub gender: Gender,
    pub referral_source: ReferralSource,
    pub triage_code: i64,
    pub patients_ahead: i64,
    #[serde(rename = "patientsInED")]
    pub patients_in_ed: i64,
    pub altered_mental_status: bool,
    pub is_accident: bool,
    pub has_fever: bool,
}

impl PredictionInput {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.age <= 0 {
            return Err(DomainError::validation("age must be greater than 0"));
        }
        if !(1..=5).contains(&self.triage_code) {
            return Err(DomainError::validation(
                "triageCode must be between 1 and 5",
            ));
        }
        if self.patients_ahead < 0 {
            return Err(DomainError::validation("patientsAhead must not be negative"));
        }
        if self.patients_in_ed < 0 {
            return Err(DomainError::validation("patientsInED must not be negative"));
        }
        Ok(())
    }
}

/// Accepts ISO 8601 timestamps with or without an offset and keeps the
/// wall-clock time at the arrival site.
fn deserialize_arrival<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&raw, fmt).ok())
        .ok_or_else(|| serde::de::Error::custom(format!("invalid dateTime: {raw}")))
}

/// Raw model outputs. A head the model does not provide is `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawPrediction {
    pub breach_probability: Option<f64>,
    pub admission_probability: Option<f64>,
    pub wait_minutes: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionOutput {
    pub wait3h: f64,
    pub wait4h: f64,
    pub wait5h: f64,
    pub wait6h: f64,
    pub admission_likelihood: f64,
    pub predicted_wait_minutes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn sample(date_time: &str) -> String {
        format!(
            r#"{{
                "age": 55,
                "dateTime": "{date_time}",
                "gender": "female",
                "referralSource": "self",
                "triageCode": 3,
                "patientsAhead": 4,
                "patientsInED": 50,
                "alteredMentalStatus": false,
                "isAccident": true,
                "hasFever": false
            }}"#
        )
    }

    #[test]
    fn test_deserialize_naive_timestamp() {
        let input: PredictionInput = serde_json::from_str(&sample("2024-04-06T10:30:00")).unwrap();
        assert_eq!(input.date_time.month(), 4);
        assert_eq!(input.date_time.hour(), 10);
        assert_eq!(input.referral_source, ReferralSource::SelfReferral);
        assert_eq!(input.patients_in_ed, 50);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_deserialize_offset_keeps_local_hour() {
        let input: PredictionInput =
            serde_json::from_str(&sample("2024-04-06T22:15:00+02:00")).unwrap();
        assert_eq!(input.date_time.hour(), 22);
    }

    #[test]
    fn test_deserialize_rejects_garbage_timestamp() {
        assert!(serde_json::from_str::<PredictionInput>(&sample("yesterday")).is_err());
    }

    #[test]
    fn test_validate_ranges() {
        let mut input: PredictionInput =
            serde_json::from_str(&sample("2024-04-06T10:30:00")).unwrap();
        input.triage_code = 6;
        assert!(input.validate().unwrap_err().is_validation());

        input.triage_code = 1;
        input.age = 0;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_output_field_names() {
        let out = PredictionOutput {
            wait3h: 1.0,
            wait4h: 2.0,
            wait5h: 3.0,
            wait6h: 4.0,
            admission_likelihood: 5.0,
            predicted_wait_minutes: 6,
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["wait3h"], 1.0);
        assert_eq!(json["admissionLikelihood"], 5.0);
        assert_eq!(json["predictedWaitMinutes"], 6);
    }
}
