//! Platform health-store collaborator contract
//!
//! The pipeline reads raw samples through this trait; HealthKit and Health
//! Connect adapters implement it outside this crate. Absent data comes back
//! as `None` or an empty list, never as an error. Errors mean the store
//! itself could not be read.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{ExerciseSession, HeartRateSample, HrvSample};
use crate::sleep::SleepStageSegment;

/// Failure reading from the platform health store
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The store cannot serve this data right now
    #[error("health data {what} is unavailable")]
    Unavailable { what: String },

    /// The user has not granted read access
    #[error("health data access denied: {0}")]
    PermissionDenied(String),

    /// Any other adapter failure
    #[error("health data provider failure: {0}")]
    Other(String),
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Read access to the platform health store.
///
/// Range queries take epoch milliseconds; single-day queries take the
/// calendar date and resolve their own day bounds. Implementations must be
/// shareable across threads since pipeline triggers arrive from anywhere.
pub trait HealthDataProvider: Send + Sync {
    fn resting_heart_rate(&self, date: NaiveDate) -> ProviderResult<Option<f64>>;

    fn respiratory_rate(&self, date: NaiveDate) -> ProviderResult<Option<f64>>;

    fn spo2(&self, date: NaiveDate) -> ProviderResult<Option<f64>>;

    fn skin_temperature_deviation(&self, date: NaiveDate) -> ProviderResult<Option<f64>>;

    /// HRV readings recorded inside the window
    fn hrv_samples(&self, start_millis: i64, end_millis: i64) -> ProviderResult<Vec<HrvSample>>;

    /// Heart-rate samples recorded inside the window
    fn heart_rate_samples(
        &self,
        start_millis: i64,
        end_millis: i64,
    ) -> ProviderResult<Vec<HeartRateSample>>;

    /// Raw sleep stage segments overlapping the window
    fn sleep_segments(
        &self,
        start_millis: i64,
        end_millis: i64,
    ) -> ProviderResult<Vec<SleepStageSegment>>;

    /// Workout sessions recorded inside the window
    fn exercise_sessions(
        &self,
        start_millis: i64,
        end_millis: i64,
    ) -> ProviderResult<Vec<ExerciseSession>>;

    fn steps(&self, date: NaiveDate) -> ProviderResult<Option<u64>>;

    fn active_calories(&self, date: NaiveDate) -> ProviderResult<Option<f64>>;

    fn vo2_max(&self, date: NaiveDate) -> ProviderResult<Option<f64>>;

    fn body_fat_percentage(&self, date: NaiveDate) -> ProviderResult<Option<f64>>;
}
