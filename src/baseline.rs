//! Rolling-baseline statistics
//!
//! Personal baselines are population mean/stddev snapshots over a trailing
//! window of daily values. Every z-score in the scoring engines is taken
//! against one of these (or a population default when the personal baseline
//! is not yet valid), never against a fixed constant.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{BaselineConfig, ScoringConfig};

/// Metric types tracked with persisted baselines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaselineMetricType {
    Hrv,
    RestingHeartRate,
    Strain,
    SleepPerformance,
}

impl BaselineMetricType {
    /// Every tracked type, in recompute order
    pub const ALL: [BaselineMetricType; 4] = [
        BaselineMetricType::Hrv,
        BaselineMetricType::RestingHeartRate,
        BaselineMetricType::Strain,
        BaselineMetricType::SleepPerformance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BaselineMetricType::Hrv => "HRV",
            BaselineMetricType::RestingHeartRate => "RESTING_HEART_RATE",
            BaselineMetricType::Strain => "STRAIN",
            BaselineMetricType::SleepPerformance => "SLEEP_PERFORMANCE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "HRV" => Some(BaselineMetricType::Hrv),
            "RESTING_HEART_RATE" => Some(BaselineMetricType::RestingHeartRate),
            "STRAIN" => Some(BaselineMetricType::Strain),
            "SLEEP_PERFORMANCE" => Some(BaselineMetricType::SleepPerformance),
            _ => None,
        }
    }
}

/// Immutable snapshot of one metric's rolling statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineResult {
    pub mean: f64,
    pub standard_deviation: f64,
    pub sample_count: usize,
    pub window_days: usize,
}

impl BaselineResult {
    /// A baseline is usable once it has enough samples and a real spread
    pub fn is_valid(&self, minimum_samples: usize) -> bool {
        self.sample_count >= minimum_samples && self.standard_deviation > 0.0
    }
}

/// Persisted baseline snapshot with its source window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineMetric {
    pub metric_type: BaselineMetricType,
    pub mean: f64,
    pub standard_deviation: f64,
    pub sample_count: usize,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub updated_at: DateTime<Utc>,
}

impl BaselineMetric {
    pub fn new(
        metric_type: BaselineMetricType,
        result: &BaselineResult,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Self {
        Self {
            metric_type,
            mean: result.mean,
            standard_deviation: result.standard_deviation,
            sample_count: result.sample_count,
            window_start,
            window_end,
            updated_at: Utc::now(),
        }
    }

    pub fn result(&self) -> BaselineResult {
        BaselineResult {
            mean: self.mean,
            standard_deviation: self.standard_deviation,
            sample_count: self.sample_count,
            window_days: (self.window_end - self.window_start).num_days().max(0) as usize,
        }
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Compute a baseline over the trailing `window_days` values.
///
/// Values are expected oldest to newest; callers window by date before
/// calling. Returns `None` for an empty sequence or when fewer than
/// `minimum_samples` values are available. The standard deviation is a
/// population statistic, floored at 0.001 so a flat window still yields a
/// valid baseline.
pub fn compute_baseline(
    values: &[f64],
    window_days: usize,
    minimum_samples: usize,
) -> Option<BaselineResult> {
    if values.is_empty() {
        return None;
    }

    let start = values.len().saturating_sub(window_days);
    let recent = &values[start..];

    if recent.len() >= minimum_samples {
        return Some(BaselineResult {
            mean: mean(recent),
            standard_deviation: population_std_dev(recent).max(0.001),
            sample_count: recent.len(),
            window_days,
        });
    }

    if values.len() >= minimum_samples {
        let fallback = &values[values.len() - minimum_samples..];
        return Some(BaselineResult {
            mean: mean(fallback),
            standard_deviation: population_std_dev(fallback).max(0.001),
            sample_count: fallback.len(),
            window_days: fallback.len(),
        });
    }

    None
}

/// Standard score of `value` against `baseline`; 0.0 when the baseline has
/// no spread, which downstream treats as "no signal"
pub fn z_score(value: f64, baseline: &BaselineResult) -> f64 {
    if baseline.standard_deviation <= 0.0 {
        return 0.0;
    }
    (value - baseline.mean) / baseline.standard_deviation
}

/// Exponentially weighted incremental update, used between full recomputes
pub fn update_baseline(current: &BaselineResult, new_value: f64, alpha: f64) -> BaselineResult {
    let new_mean = current.mean * (1.0 - alpha) + new_value * alpha;
    let new_variance = current.standard_deviation.powi(2) * (1.0 - alpha)
        + (new_value - new_mean).powi(2) * alpha;

    BaselineResult {
        mean: new_mean,
        standard_deviation: new_variance.max(0.001).sqrt(),
        sample_count: current.sample_count + 1,
        window_days: current.window_days,
    }
}

/// Baseline computation bound to the process scoring configuration
#[derive(Debug, Clone)]
pub struct BaselineCalculator {
    config: BaselineConfig,
}

impl BaselineCalculator {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            config: config.baselines,
        }
    }

    pub fn with_config(config: BaselineConfig) -> Self {
        Self { config }
    }

    pub fn window_days(&self) -> usize {
        self.config.window_days
    }

    pub fn minimum_samples(&self) -> usize {
        self.config.minimum_samples
    }

    pub fn compute(&self, values: &[f64]) -> Option<BaselineResult> {
        compute_baseline(values, self.config.window_days, self.config.minimum_samples)
    }

    pub fn update(&self, current: &BaselineResult, new_value: f64) -> BaselineResult {
        update_baseline(current, new_value, self.config.exponential_alpha)
    }
}
