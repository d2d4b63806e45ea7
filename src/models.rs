use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::recovery::RecoveryZone;

/// Biological sex recorded on the user profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BiologicalSex {
    Female,
    Male,
    Other,
    NotSet,
}

impl BiologicalSex {
    pub fn as_str(&self) -> &'static str {
        match self {
            BiologicalSex::Female => "female",
            BiologicalSex::Male => "male",
            BiologicalSex::Other => "other",
            BiologicalSex::NotSet => "notSet",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "female" => Some(BiologicalSex::Female),
            "male" => Some(BiologicalSex::Male),
            "other" => Some(BiologicalSex::Other),
            "notSet" => Some(BiologicalSex::NotSet),
            _ => None,
        }
    }
}

/// User profile supplying the physiological parameters the engines need
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique profile identifier
    pub id: Uuid,

    /// Display name
    pub display_name: String,

    /// Date of birth for age-based max HR estimation
    pub date_of_birth: Option<NaiveDate>,

    pub biological_sex: BiologicalSex,

    /// Height in centimeters
    pub height_cm: Option<f64>,

    /// Weight in kilograms
    pub weight_kg: Option<f64>,

    /// Body fat percentage, used for lean-mass derivation
    pub body_fat_pct: Option<f64>,

    /// Explicitly measured maximum heart rate, overrides the age estimate
    pub max_heart_rate: Option<u16>,

    /// Personal baseline sleep need in hours
    pub sleep_baseline_hours: f64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(display_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            date_of_birth: None,
            biological_sex: BiologicalSex::NotSet,
            height_cm: None,
            weight_kg: None,
            body_fat_pct: None,
            max_heart_rate: None,
            sleep_baseline_hours: 7.5,
            created_at: now,
            updated_at: now,
        }
    }

    /// Age in whole years as of the given date
    pub fn age_on(&self, date: NaiveDate) -> Option<u32> {
        self.date_of_birth.and_then(|dob| date.years_since(dob))
    }

    /// Max HR used for zone math: explicit value, else 220 minus age,
    /// else a conservative 190
    pub fn estimated_max_hr(&self, today: NaiveDate) -> u16 {
        if let Some(max_hr) = self.max_heart_rate {
            return max_hr;
        }
        match self.age_on(today) {
            Some(age) => (220 - age.min(120) as i32).max(100) as u16,
            None => 190,
        }
    }
}

/// Single heart-rate reading from the platform health store
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSample {
    /// Sample timestamp in epoch milliseconds
    pub timestamp_millis: i64,

    /// Instantaneous heart rate in beats per minute
    pub bpm: f64,

    /// Observed sample coverage in seconds, estimated from gaps when absent
    pub duration_seconds: Option<f64>,
}

impl HeartRateSample {
    pub fn new(timestamp_millis: i64, bpm: f64) -> Self {
        Self {
            timestamp_millis,
            bpm,
            duration_seconds: None,
        }
    }
}

/// Heart-rate-variability reading; platforms report RMSSD, SDNN, or both
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HrvSample {
    pub timestamp_millis: i64,
    pub rmssd_ms: Option<f64>,
    pub sdnn_ms: Option<f64>,
}

/// Raw exercise session as reported by the platform health store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSession {
    /// Platform-assigned identifier, stable across refetches
    pub external_uuid: String,

    /// Platform activity type string, e.g. "running"
    pub exercise_type: String,

    pub title: Option<String>,
    pub start_millis: i64,
    pub end_millis: i64,
    pub duration_minutes: f64,
    pub active_calories: Option<f64>,
    pub average_heart_rate: Option<f64>,
    pub max_heart_rate: Option<f64>,
    /// Perceived exertion 1-10 when the user logged one
    pub rpe: Option<u8>,
}

/// Processed workout stored per day with its strain contribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    /// Unique identifier for the stored workout
    pub id: Uuid,

    /// Platform identifier used for dedupe across pipeline runs
    pub external_uuid: Option<String>,

    pub date: NaiveDate,
    pub workout_type: String,
    pub name: Option<String>,
    pub start_millis: i64,
    pub end_millis: i64,
    pub duration_minutes: f64,

    /// Cardiovascular strain for this session
    pub strain: f64,

    pub average_heart_rate: Option<f64>,
    pub max_heart_rate: Option<f64>,
    pub active_calories: Option<f64>,

    /// Minutes spent in each of the five heart-rate zones
    pub zone_minutes: [f64; 5],

    /// Muscular load for strength-style sessions
    pub muscular_load: Option<f64>,
}

/// One row per calendar date per user; the sink for every pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetric {
    pub date: NaiveDate,

    pub recovery_score: Option<f64>,
    pub recovery_zone: Option<RecoveryZone>,
    pub recovery_insight: Option<String>,

    pub strain_score: Option<f64>,
    pub peak_workout_strain: Option<f64>,

    pub sleep_duration_hours: Option<f64>,
    pub sleep_need_hours: Option<f64>,
    pub sleep_debt_hours: Option<f64>,
    /// Duration over need, uncapped above 100
    pub sleep_performance: Option<f64>,
    pub sleep_consistency: Option<f64>,
    pub sleep_efficiency: Option<f64>,
    pub restorative_sleep_pct: Option<f64>,
    /// Weighted quality composite on a 0-100 scale
    pub sleep_quality: Option<f64>,

    pub hrv_rmssd: Option<f64>,
    pub hrv_sdnn: Option<f64>,
    pub resting_heart_rate: Option<f64>,
    pub respiratory_rate: Option<f64>,
    pub spo2: Option<f64>,
    pub skin_temperature_deviation: Option<f64>,

    pub steps: Option<u64>,
    pub active_calories: Option<f64>,
    pub vo2_max: Option<f64>,
    pub lean_body_mass_pct: Option<f64>,

    pub stress_average: Option<f64>,

    /// Set once every pipeline step has been attempted for the date
    pub is_computed: bool,
    pub computed_at: Option<DateTime<Utc>>,
}

impl DailyMetric {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            recovery_score: None,
            recovery_zone: None,
            recovery_insight: None,
            strain_score: None,
            peak_workout_strain: None,
            sleep_duration_hours: None,
            sleep_need_hours: None,
            sleep_debt_hours: None,
            sleep_performance: None,
            sleep_consistency: None,
            sleep_efficiency: None,
            restorative_sleep_pct: None,
            sleep_quality: None,
            hrv_rmssd: None,
            hrv_sdnn: None,
            resting_heart_rate: None,
            respiratory_rate: None,
            spo2: None,
            skin_temperature_deviation: None,
            steps: None,
            active_calories: None,
            vo2_max: None,
            lean_body_mass_pct: None,
            stress_average: None,
            is_computed: false,
            computed_at: None,
        }
    }
}
