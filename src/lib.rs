//! Biometric wellness scoring engines and the daily pipeline that drives
//! them: recovery, strain, sleep performance and need, stress, and rolling
//! personal baselines, with SQLite persistence behind repository traits.

pub mod baseline;
pub mod config;
pub mod correlations;
pub mod error;
pub mod hrv;
pub mod logging;
pub mod models;
pub mod muscular_load;
pub mod pipeline;
pub mod planner;
pub mod provider;
pub mod recovery;
pub mod repository;
pub mod sleep;
pub mod storage;
pub mod strain;
pub mod stress;
pub mod zones;

// Re-export commonly used types for convenience
pub use models::*;
pub use config::ScoringConfig;
pub use error::{Result, VitalrsError};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use pipeline::{DailyRunReport, MetricPipeline, RunOutcome, StepStatus};
pub use provider::HealthDataProvider;
pub use recovery::{RecoveryEngine, RecoveryZone};
pub use sleep::SleepEngine;
pub use storage::Database;
pub use strain::StrainEngine;
