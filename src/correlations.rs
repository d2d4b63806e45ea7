//! Behavior-to-metric correlation statistics
//!
//! Compares a metric's values on days with a behavior against days
//! without it: Welch's t statistic with a normal-approximation two-sided
//! p-value, and Cohen's d for effect size. Group sizes under three are
//! refused rather than reported with false confidence.

use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;

use crate::baseline::{mean, population_std_dev};

pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

const MINIMUM_GROUP_SIZE: usize = 3;

/// Whether the behavior associates with better, worse, or unchanged values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CorrelationDirection {
    Positive,
    Negative,
    Neutral,
}

impl CorrelationDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationDirection::Positive => "POSITIVE",
            CorrelationDirection::Negative => "NEGATIVE",
            CorrelationDirection::Neutral => "NEUTRAL",
        }
    }
}

/// Outcome of one behavior-metric comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub behavior_name: String,
    pub metric_name: String,
    pub effect_size: f64,
    pub p_value: f64,
    pub is_significant: bool,
    pub direction: CorrelationDirection,
    pub sample_size_with: usize,
    pub sample_size_without: usize,
    pub mean_with: f64,
    pub mean_without: f64,
}

/// Two-sided p-value of a t statistic under the normal approximation
fn approximate_p_value(t: f64) -> f64 {
    erfc(t.abs() / std::f64::consts::SQRT_2)
}

/// Welch's t-test between the two groups.
///
/// Returns `(t, p_value)`, or `None` when either group is too small or
/// both groups are flat.
pub fn t_test(with_behavior: &[f64], without_behavior: &[f64]) -> Option<(f64, f64)> {
    if with_behavior.len() < MINIMUM_GROUP_SIZE || without_behavior.len() < MINIMUM_GROUP_SIZE {
        return None;
    }

    let n1 = with_behavior.len() as f64;
    let n2 = without_behavior.len() as f64;
    let var1 = population_std_dev(with_behavior).powi(2);
    let var2 = population_std_dev(without_behavior).powi(2);

    let pooled_se = (var1 / n1 + var2 / n2).sqrt();
    if pooled_se <= 0.0 {
        return None;
    }

    let t = (mean(with_behavior) - mean(without_behavior)) / pooled_se;
    Some((t, approximate_p_value(t)))
}

/// Cohen's d with pooled standard deviation
pub fn cohens_d(with_behavior: &[f64], without_behavior: &[f64]) -> Option<f64> {
    if with_behavior.len() < MINIMUM_GROUP_SIZE || without_behavior.len() < MINIMUM_GROUP_SIZE {
        return None;
    }

    let n1 = with_behavior.len() as f64;
    let n2 = without_behavior.len() as f64;
    let sd1 = population_std_dev(with_behavior);
    let sd2 = population_std_dev(without_behavior);

    let pooled_sd =
        (((n1 - 1.0) * sd1 * sd1 + (n2 - 1.0) * sd2 * sd2) / (n1 + n2 - 2.0)).sqrt();
    if pooled_sd <= 0.0 {
        return None;
    }

    Some((mean(with_behavior) - mean(without_behavior)) / pooled_sd)
}

/// Full comparison of a metric with and without a behavior.
///
/// The direction accounts for the metric's polarity: a significant drop in
/// a lower-is-better metric reads as positive.
pub fn analyze_correlation(
    behavior_name: &str,
    metric_name: &str,
    with_behavior: &[f64],
    without_behavior: &[f64],
    higher_is_better: bool,
) -> Option<CorrelationResult> {
    let (_, p_value) = t_test(with_behavior, without_behavior)?;
    let effect_size = cohens_d(with_behavior, without_behavior)?;

    let mean_with = mean(with_behavior);
    let mean_without = mean(without_behavior);
    let mean_diff = mean_with - mean_without;

    let direction = if p_value >= SIGNIFICANCE_LEVEL {
        CorrelationDirection::Neutral
    } else if (higher_is_better && mean_diff > 0.0) || (!higher_is_better && mean_diff < 0.0) {
        CorrelationDirection::Positive
    } else {
        CorrelationDirection::Negative
    };

    Some(CorrelationResult {
        behavior_name: behavior_name.to_string(),
        metric_name: metric_name.to_string(),
        effect_size,
        p_value,
        is_significant: p_value < SIGNIFICANCE_LEVEL,
        direction,
        sample_size_with: with_behavior.len(),
        sample_size_without: without_behavior.len(),
        mean_with,
        mean_without,
    })
}

pub fn interpret_effect_size(d: f64) -> &'static str {
    let abs_d = d.abs();
    if abs_d < 0.2 {
        "Negligible"
    } else if abs_d < 0.5 {
        "Small"
    } else if abs_d < 0.8 {
        "Medium"
    } else {
        "Large"
    }
}
