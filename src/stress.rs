//! Intraday stress from heart-rate elevation
//!
//! Stress reads each daytime heart-rate sample against the 14-day resting
//! heart rate baseline and maps the elevation onto a 0-10 scale with a
//! logistic curve. A resting reading scores 5, sustained elevation pushes
//! toward 10.

use serde::{Deserialize, Serialize};

use crate::baseline::{compute_baseline, z_score, BaselineResult};
use crate::config::ScoringConfig;
use crate::models::{DailyMetric, HeartRateSample};

/// Stress baselines look back further than a recovery night but less than
/// the 28-day metric window
pub const STRESS_BASELINE_WINDOW_DAYS: usize = 14;

/// Rolling statistics the stress timeline is scored against
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StressBaselines {
    pub resting_heart_rate: Option<BaselineResult>,
}

/// One scored moment of the intraday timeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressPoint {
    pub timestamp_millis: i64,

    /// Stress level on the 0-10 scale
    pub level: f64,
}

fn stress_level(z: f64) -> f64 {
    10.0 / (1.0 + (-z).exp())
}

/// Scores heart-rate samples into a stress timeline
#[derive(Debug, Clone)]
pub struct StressEngine {
    minimum_samples: usize,
}

impl StressEngine {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            minimum_samples: config.baselines.minimum_samples,
        }
    }

    /// Build the resting-HR baseline from prior daily records, oldest first
    pub fn compute_baselines(&self, prior_days: &[DailyMetric]) -> StressBaselines {
        let resting_values: Vec<f64> = prior_days
            .iter()
            .filter_map(|m| m.resting_heart_rate)
            .collect();

        StressBaselines {
            resting_heart_rate: compute_baseline(
                &resting_values,
                STRESS_BASELINE_WINDOW_DAYS,
                self.minimum_samples,
            ),
        }
    }

    /// Score every sample against the resting-HR baseline.
    ///
    /// Without a valid baseline there is nothing to compare against and the
    /// timeline is empty.
    pub fn stress_timeline(
        &self,
        samples: &[HeartRateSample],
        baselines: &StressBaselines,
    ) -> Vec<StressPoint> {
        let Some(baseline) = baselines.resting_heart_rate.as_ref() else {
            return Vec::new();
        };

        samples
            .iter()
            .map(|sample| StressPoint {
                timestamp_millis: sample.timestamp_millis,
                level: stress_level(z_score(sample.bpm, baseline)),
            })
            .collect()
    }

    pub fn daily_average(&self, timeline: &[StressPoint]) -> Option<f64> {
        if timeline.is_empty() {
            return None;
        }
        Some(timeline.iter().map(|p| p.level).sum::<f64>() / timeline.len() as f64)
    }
}
