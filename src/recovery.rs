//! Recovery scoring from overnight physiology
//!
//! Recovery condenses up to six overnight signals into a single 0-100
//! readiness score. Each present signal is compared against a personal
//! rolling baseline as a z-score, pushed through a logistic curve, and
//! weighted into the composite.
//!
//! # Contributors
//!
//! - **HRV (RMSSD)**: higher than baseline reads as better recovery
//! - **Resting heart rate**: lower is better, so its z-score is negated
//! - **Sleep performance**: percent of sleep need met
//! - **Respiratory rate**: lower is better
//! - **SpO2**: blood oxygen saturation
//! - **Skin temperature deviation**: departures from 0 in either direction
//!   matter, and elevation reads as worse
//!
//! A signal that was not recorded simply drops out of the weighted sum;
//! the remaining weights are renormalized rather than padded with neutral
//! values. Before enough history accumulates, clinical population
//! baselines stand in for the personal ones.

use serde::{Deserialize, Serialize};

use crate::baseline::{z_score, BaselineResult};
use crate::config::{RecoveryConfig, ScoreRange, ScoringConfig};

/// Readiness tier derived from the recovery score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryZone {
    Green,
    Yellow,
    Red,
}

impl RecoveryZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryZone::Green => "Green",
            RecoveryZone::Yellow => "Yellow",
            RecoveryZone::Red => "Red",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Green" => Some(RecoveryZone::Green),
            "Yellow" => Some(RecoveryZone::Yellow),
            "Red" => Some(RecoveryZone::Red),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecoveryZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overnight readings; any absent field drops out of the composite
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecoveryInput {
    pub hrv: Option<f64>,
    pub resting_heart_rate: Option<f64>,
    pub sleep_performance: Option<f64>,
    pub respiratory_rate: Option<f64>,
    pub spo2: Option<f64>,
    pub skin_temperature_deviation: Option<f64>,
}

/// Personal baselines paired with [`RecoveryInput`] fields
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecoveryBaselines {
    pub hrv: Option<BaselineResult>,
    pub resting_heart_rate: Option<BaselineResult>,
    pub sleep_performance: Option<BaselineResult>,
    pub respiratory_rate: Option<BaselineResult>,
    pub spo2: Option<BaselineResult>,
    pub skin_temperature: Option<BaselineResult>,
}

/// Recovery score with its per-contributor breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecoveryResult {
    pub score: f64,
    pub zone: RecoveryZone,
    pub hrv_score: Option<f64>,
    pub rhr_score: Option<f64>,
    pub sleep_score: Option<f64>,
    pub resp_rate_score: Option<f64>,
    pub spo2_score: Option<f64>,
    pub skin_temp_score: Option<f64>,
    pub contributor_count: usize,
}

// Cold-start baselines from healthy adult population averages, used until
// personal baselines become valid.
pub const POPULATION_HRV: BaselineResult = BaselineResult {
    mean: 40.0,
    standard_deviation: 15.0,
    sample_count: 100,
    window_days: 28,
};
pub const POPULATION_RHR: BaselineResult = BaselineResult {
    mean: 65.0,
    standard_deviation: 8.0,
    sample_count: 100,
    window_days: 28,
};
pub const POPULATION_SLEEP: BaselineResult = BaselineResult {
    mean: 75.0,
    standard_deviation: 12.0,
    sample_count: 100,
    window_days: 28,
};
pub const POPULATION_RESP_RATE: BaselineResult = BaselineResult {
    mean: 15.0,
    standard_deviation: 2.0,
    sample_count: 100,
    window_days: 28,
};
pub const POPULATION_SPO2: BaselineResult = BaselineResult {
    mean: 97.0,
    standard_deviation: 1.0,
    sample_count: 100,
    window_days: 28,
};
pub const POPULATION_SKIN_TEMP: BaselineResult = BaselineResult {
    mean: 0.0,
    standard_deviation: 0.3,
    sample_count: 100,
    window_days: 28,
};

/// Weighted composite recovery scoring
#[derive(Debug, Clone)]
pub struct RecoveryEngine {
    config: RecoveryConfig,
    minimum_samples: usize,
}

impl RecoveryEngine {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            config: config.recovery.clone(),
            minimum_samples: config.baselines.minimum_samples,
        }
    }

    fn sigmoid(&self, z: f64) -> f64 {
        100.0 / (1.0 + (-self.config.sigmoid_steepness * z).exp())
    }

    fn contributor_score(
        &self,
        value: Option<f64>,
        baseline: Option<&BaselineResult>,
        population: &BaselineResult,
        invert: bool,
    ) -> Option<f64> {
        let value = value?;
        let effective = match baseline {
            Some(b) if b.is_valid(self.minimum_samples) => b,
            _ => population,
        };

        let mut z = z_score(value, effective);
        if invert {
            z = -z;
        }
        Some(self.sigmoid(z))
    }

    /// Compute the recovery composite from whatever contributors are present.
    ///
    /// With no contributors at all the score is a neutral 50.
    pub fn compute_recovery(
        &self,
        input: &RecoveryInput,
        baselines: &RecoveryBaselines,
    ) -> RecoveryResult {
        let w = &self.config.weights;
        let contributors = [
            (input.hrv, baselines.hrv.as_ref(), &POPULATION_HRV, false, w.hrv),
            (
                input.resting_heart_rate,
                baselines.resting_heart_rate.as_ref(),
                &POPULATION_RHR,
                true,
                w.resting_heart_rate,
            ),
            (
                input.sleep_performance,
                baselines.sleep_performance.as_ref(),
                &POPULATION_SLEEP,
                false,
                w.sleep,
            ),
            (
                input.respiratory_rate,
                baselines.respiratory_rate.as_ref(),
                &POPULATION_RESP_RATE,
                true,
                w.respiratory_rate,
            ),
            (input.spo2, baselines.spo2.as_ref(), &POPULATION_SPO2, false, w.spo2),
            (
                input.skin_temperature_deviation,
                baselines.skin_temperature.as_ref(),
                &POPULATION_SKIN_TEMP,
                true,
                w.skin_temperature,
            ),
        ];

        let mut scores = [None; 6];
        let mut total_weight = 0.0;
        let mut weighted_sum = 0.0;
        let mut contributor_count = 0;

        for (i, (value, baseline, population, invert, weight)) in
            contributors.into_iter().enumerate()
        {
            if let Some(score) = self.contributor_score(value, baseline, population, invert) {
                scores[i] = Some(score);
                total_weight += weight;
                weighted_sum += score * weight;
                contributor_count += 1;
            }
        }

        let raw_score = if total_weight > 0.0 {
            weighted_sum / total_weight
        } else {
            50.0
        };
        let score = self.config.score_range.clamp(raw_score);

        RecoveryResult {
            score,
            zone: self.zone_for_score(score),
            hrv_score: scores[0],
            rhr_score: scores[1],
            sleep_score: scores[2],
            resp_rate_score: scores[3],
            spo2_score: scores[4],
            skin_temp_score: scores[5],
            contributor_count,
        }
    }

    pub fn zone_for_score(&self, score: f64) -> RecoveryZone {
        let zones = &self.config.zones;
        if score >= zones.green.min {
            RecoveryZone::Green
        } else if score >= zones.yellow.min {
            RecoveryZone::Yellow
        } else {
            RecoveryZone::Red
        }
    }

    /// Recommended daily strain band for a recovery zone
    pub fn strain_target(&self, zone: RecoveryZone) -> ScoreRange {
        let targets = &self.config.strain_targets;
        match zone {
            RecoveryZone::Green => targets.green,
            RecoveryZone::Yellow => targets.yellow,
            RecoveryZone::Red => targets.red,
        }
    }

    /// Short natural-language explanation of the score.
    ///
    /// Deviations past the configured significance thresholds each add one
    /// clause; absent or unremarkable inputs add nothing. Never fails.
    pub fn generate_insight(
        &self,
        result: &RecoveryResult,
        input: &RecoveryInput,
        baselines: &RecoveryBaselines,
    ) -> String {
        let thresholds = &self.config.insight_thresholds;
        let mut insights: Vec<String> = Vec::new();

        if let (Some(hrv), Some(baseline)) = (input.hrv, baselines.hrv.as_ref()) {
            let pct_change = (hrv - baseline.mean) / baseline.mean * 100.0;
            if pct_change.abs() > thresholds.hrv_percent_change {
                let direction = if pct_change > 0.0 { "above" } else { "below" };
                insights.push(format!(
                    "HRV was {}% {} your baseline",
                    pct_change.abs() as i64,
                    direction
                ));
            }
        }

        if let (Some(rhr), Some(baseline)) =
            (input.resting_heart_rate, baselines.resting_heart_rate.as_ref())
        {
            let delta = rhr - baseline.mean;
            if delta.abs() > thresholds.rhr_delta_bpm {
                let direction = if delta > 0.0 { "elevated by" } else { "lower by" };
                insights.push(format!("RHR was {} {} BPM", direction, delta.abs() as i64));
            }
        }

        if let Some(performance) = input.sleep_performance {
            if performance >= thresholds.sleep_performance_high {
                insights.push(format!(
                    "you got {}% of your sleep need",
                    performance as i64
                ));
            } else if performance < thresholds.sleep_performance_low {
                insights.push(format!(
                    "you only got {}% of your sleep need",
                    performance as i64
                ));
            }
        }

        if let Some(deviation) = input.skin_temperature_deviation {
            if deviation.abs() > thresholds.skin_temp_deviation_celsius {
                let direction = if deviation > 0.0 { "elevated" } else { "lower" };
                let rounded = (deviation.abs() * 10.0).trunc() / 10.0;
                insights.push(format!(
                    "skin temperature was {} by {:.1}\u{b0}C",
                    direction, rounded
                ));
            }
        }

        let prefix = format!("Your Recovery is {}% ({}). ", result.score as i64, result.zone);
        if insights.is_empty() {
            prefix + "Your metrics are within normal range."
        } else {
            prefix + &insights.join(", and ") + "."
        }
    }
}
