//! Persistence contracts between the metric pipeline and the storage layer.
//!
//! The pipeline never talks to SQLite directly. It borrows these traits so
//! tests can substitute in-memory fakes and so the storage backend can evolve
//! without touching the computation code. All methods take `&self` and
//! implementations must be thread-shareable; the SQLite implementation
//! serializes access internally.

use chrono::NaiveDate;

use crate::baseline::{BaselineMetric, BaselineMetricType};
use crate::models::{DailyMetric, UserProfile, WorkoutRecord};
use crate::sleep::SleepSessionData;
use crate::storage::StorageError;

/// Access to the per-day metric rows produced by pipeline runs.
pub trait DailyMetricRepository: Send + Sync {
    /// Load the metric row for one date, if any run has written it yet.
    fn metric_for_date(&self, date: NaiveDate) -> Result<Option<DailyMetric>, StorageError>;

    /// Insert the row for `metric.date`, or replace it if one exists.
    fn upsert_metric(&self, metric: &DailyMetric) -> Result<(), StorageError>;

    /// All stored rows with `start <= date <= end`, ordered by date ascending.
    fn metrics_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyMetric>, StorageError>;

    /// HRV RMSSD values from the `days` dates strictly before `before`,
    /// oldest first. Days without a reading are skipped.
    fn recent_hrv(&self, before: NaiveDate, days: usize) -> Result<Vec<f64>, StorageError>;

    /// Resting heart rate values from the `days` dates strictly before
    /// `before`, oldest first.
    fn recent_resting_heart_rate(
        &self,
        before: NaiveDate,
        days: usize,
    ) -> Result<Vec<f64>, StorageError>;

    /// Day strain values from the `days` dates strictly before `before`,
    /// oldest first.
    fn recent_strain(&self, before: NaiveDate, days: usize) -> Result<Vec<f64>, StorageError>;

    /// Sleep performance values from the `days` dates strictly before
    /// `before`, oldest first.
    fn recent_sleep_performance(
        &self,
        before: NaiveDate,
        days: usize,
    ) -> Result<Vec<f64>, StorageError>;

    /// Sleep durations in hours from the `days` dates strictly before
    /// `before`, oldest first. Only days that also carry a sleep need are
    /// returned, so the series stays paired with [`recent_sleep_needs`]
    /// for the same arguments.
    ///
    /// [`recent_sleep_needs`]: DailyMetricRepository::recent_sleep_needs
    fn recent_sleep_hours(&self, before: NaiveDate, days: usize)
        -> Result<Vec<f64>, StorageError>;

    /// Sleep needs in hours from the `days` dates strictly before `before`,
    /// oldest first, restricted to days that also carry a duration.
    fn recent_sleep_needs(&self, before: NaiveDate, days: usize)
        -> Result<Vec<f64>, StorageError>;
}

/// Access to assembled sleep sessions.
pub trait SleepRepository: Send + Sync {
    /// Persist one assembled session under the date it counts toward.
    fn store_session(&self, date: NaiveDate, session: &SleepSessionData)
        -> Result<(), StorageError>;

    /// Sessions recorded for `date`, main sleep and naps alike.
    fn sessions_for_date(&self, date: NaiveDate) -> Result<Vec<SleepSessionData>, StorageError>;

    /// Bedtimes of the most recent `count` main sessions before `before`,
    /// newest first, as minutes relative to midnight. Evening bedtimes are
    /// stored wrapped negative so that times spanning midnight average
    /// sensibly.
    fn recent_bedtimes(&self, before: NaiveDate, count: usize)
        -> Result<Vec<f64>, StorageError>;

    /// Wake times of the most recent `count` main sessions before `before`,
    /// newest first, as minutes after midnight.
    fn recent_wake_times(&self, before: NaiveDate, count: usize)
        -> Result<Vec<f64>, StorageError>;
}

/// Access to scored workouts.
pub trait WorkoutRepository: Send + Sync {
    /// Persist one scored workout, replacing any row with the same id.
    fn store_workout(&self, workout: &WorkoutRecord) -> Result<(), StorageError>;

    /// Look up a stored workout by the platform identifier, used to skip
    /// re-scoring sessions the pipeline has already processed.
    fn workout_by_external_uuid(&self, uuid: &str)
        -> Result<Option<WorkoutRecord>, StorageError>;

    /// All workouts recorded for `date`, ordered by start time.
    fn workouts_for_date(&self, date: NaiveDate) -> Result<Vec<WorkoutRecord>, StorageError>;
}

/// Access to rolling baseline snapshots.
pub trait BaselineRepository: Send + Sync {
    /// Latest stored baseline for the metric type, if one has been computed.
    fn baseline_for(
        &self,
        metric_type: BaselineMetricType,
    ) -> Result<Option<BaselineMetric>, StorageError>;

    /// Store the baseline, replacing the previous snapshot for its type.
    fn store_baseline(&self, baseline: &BaselineMetric) -> Result<(), StorageError>;
}

/// Access to the user profile.
pub trait UserProfileRepository: Send + Sync {
    fn load_profile(&self) -> Result<Option<UserProfile>, StorageError>;

    fn store_profile(&self, profile: &UserProfile) -> Result<(), StorageError>;
}
