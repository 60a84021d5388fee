use chrono::{Datelike, Timelike};
use std::f64::consts::PI;

use crate::domain::{Gender, PredictionInput, ReferralSource, FEATURE_COUNT};

// Column positions in the trained feature order.
const AGE: usize = 0;
const SEX: usize = 1;
const PATIENTS_IN_ED: usize = 2;
const AHEAD_IN_QUEUE: usize = 3;
const MONTH_SIN: usize = 4;
const DAY_SIN: usize = 6;
const HOUR_SIN: usize = 8;
const TRIAGE_ONE: usize = 10;
const ACCIDENT: usize = 15;
const AMBULANCE: usize = 16;
const SELF_REFERRAL: usize = 17;
const GENERAL_PRACTITIONER: usize = 18;
const MEDICAL_CENTRE: usize = 19;
// Civilian (20) and Hospital (21) are never produced by the input form.
const OTHER_REFERRAL: usize = 22;
const FEVER: usize = 23;
const ALTERED_MENTAL_STATUS: usize = 24;

/// Builds the model feature row for one arrival.
///
/// Calendar fields are encoded cyclically: month over 12, ISO weekday
/// (Monday = 1) over 7, hour over 24.
pub fn preprocess(input: &PredictionInput) -> [f64; FEATURE_COUNT] {
    let mut row = [0.0; FEATURE_COUNT];

    row[AGE] = input.age as f64;
    row[SEX] = flag(input.gender == Gender::Male);
    row[PATIENTS_IN_ED] = input.patients_in_ed as f64;
    row[AHEAD_IN_QUEUE] = input.patients_ahead as f64;

    let dt = input.date_time;
    write_cyclic(&mut row, MONTH_SIN, dt.month() as f64, 12.0);
    write_cyclic(&mut row, DAY_SIN, dt.weekday().number_from_monday() as f64, 7.0);
    write_cyclic(&mut row, HOUR_SIN, dt.hour() as f64, 24.0);

    if let Ok(code) = usize::try_from(input.triage_code) {
        if (1..=5).contains(&code) {
            row[TRIAGE_ONE + code - 1] = 1.0;
        }
    }

    row[ACCIDENT] = flag(input.is_accident);
    let referral = match input.referral_source {
        ReferralSource::Ambulance => AMBULANCE,
        ReferralSource::SelfReferral => SELF_REFERRAL,
        ReferralSource::Gp => GENERAL_PRACTITIONER,
        ReferralSource::Clinic => MEDICAL_CENTRE,
        ReferralSource::Other => OTHER_REFERRAL,
    };
    row[referral] = 1.0;
    row[FEVER] = flag(input.has_fever);
    row[ALTERED_MENTAL_STATUS] = flag(input.altered_mental_status);

    row
}

fn write_cyclic(row: &mut [f64; FEATURE_COUNT], at: usize, value: f64, period: f64) {
    let angle = 2.0 * PI * value / period;
    row[at] = angle.sin();
    row[at + 1] = angle.cos();
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
