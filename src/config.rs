use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// JSON document bundled with the crate; the single source of scoring
/// constants for the process lifetime.
const BUNDLED_CONFIG: &str = include_str!("scoring_config.json");

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Document could not be parsed
    #[error("Failed to parse scoring config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Structural validation failed
    #[error("Invalid scoring config: {0}")]
    Invalid(String),
}

/// Inclusive numeric range used for score bounds, zones, and targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl ScoreRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Relative weight of each recovery contributor
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryWeights {
    pub hrv: f64,
    pub resting_heart_rate: f64,
    pub sleep: f64,
    pub respiratory_rate: f64,
    pub spo2: f64,
    pub skin_temperature: f64,
}

/// Score bands for the GREEN/YELLOW/RED recovery zones
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryZoneBands {
    pub green: ScoreRange,
    pub yellow: ScoreRange,
    pub red: ScoreRange,
}

/// Recommended daily strain band per recovery zone
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrainTargets {
    pub green: ScoreRange,
    pub yellow: ScoreRange,
    pub red: ScoreRange,
}

/// Significance thresholds for insight clauses
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightThresholds {
    /// Percent deviation of HRV from baseline mean
    pub hrv_percent_change: f64,

    /// Absolute resting heart rate delta in BPM
    #[serde(rename = "rhrDeltaBPM")]
    pub rhr_delta_bpm: f64,

    /// Sleep performance at or above this reads as restorative
    pub sleep_performance_high: f64,

    /// Sleep performance below this reads as a deficit
    pub sleep_performance_low: f64,

    /// Absolute skin temperature deviation in Celsius
    pub skin_temp_deviation_celsius: f64,
}

/// Recovery engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryConfig {
    pub weights: RecoveryWeights,

    /// Steepness `k` of the logistic mapping from z-score to 0-100
    pub sigmoid_steepness: f64,

    pub score_range: ScoreRange,
    pub zones: RecoveryZoneBands,
    pub strain_targets: StrainTargets,
    pub insight_thresholds: InsightThresholds,
}

/// Weights of the sleep quality composite
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepCompositeWeights {
    pub sufficiency: f64,
    pub efficiency: f64,
    pub consistency: f64,
    pub disturbances: f64,
}

/// One band of the ascending strain-to-extra-sleep schedule
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrainSupplement {
    /// Band applies while strain is strictly below this value
    pub strain_below: f64,

    /// Hours added to baseline sleep need
    pub add_hours: f64,
}

/// Fallbacks when no profile or history is available
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepDefaults {
    pub baseline_hours: f64,
    pub onset_latency_minutes: f64,
}

/// Session assembly and nap crediting parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetection {
    /// Stage segments closer than this belong to the same session
    pub gap_tolerance_minutes: f64,

    /// Shorter sessions are discarded outright
    pub minimum_duration_minutes: f64,

    /// Longer non-main sessions are not counted as naps
    pub maximum_nap_duration_hours: f64,

    /// Nap time credited against tonight's need is capped here
    pub nap_credit_cap_hours: f64,
}

/// Sleep engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepConfig {
    pub composite_weights: SleepCompositeWeights,

    /// Nights of bed/wake history entering the consistency spread
    pub consistency_window_nights: usize,

    /// Decay constant tau of the consistency exponential
    pub consistency_decay_tau: f64,

    /// Points deducted per awakening-per-hour in the composite
    pub disturbance_scaling: f64,

    pub strain_supplements: Vec<StrainSupplement>,

    /// Fraction of outstanding debt repaid per night
    pub debt_repayment_rate: f64,

    /// Upper bound on per-night debt repayment hours
    pub debt_repayment_cap_hours: f64,

    /// Sleep need never drops below this
    pub minimum_need_hours: f64,

    pub defaults: SleepDefaults,
    pub session_detection: SessionDetection,
}

/// Strain bands for qualitative day classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrainZoneBands {
    pub light: ScoreRange,
    pub moderate: ScoreRange,
    pub high: ScoreRange,
    pub overreaching: ScoreRange,
}

/// Strain engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrainConfig {
    /// Multiplier `k` in `k * log10(area + c)`
    pub scaling_factor: f64,

    /// Offset `c` in `k * log10(area + c)`
    pub log_offset_constant: f64,

    pub max_value: f64,
    pub min_value: f64,
    pub zones: StrainZoneBands,
}

/// Heart-rate zone table parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartRateZoneConfig {
    /// Six ascending boundaries as fractions of max HR, delimiting five zones
    pub boundaries: Vec<f64>,

    /// Strain multiplier per zone
    pub multipliers: Vec<f64>,

    /// Gap between consecutive samples is attributed up to this many seconds
    pub sample_max_duration_seconds: f64,
}

/// Rolling-baseline parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineConfig {
    pub window_days: usize,
    pub minimum_samples: usize,

    /// Alpha of the exponentially weighted incremental update
    pub exponential_alpha: f64,
}

/// Completion fraction of sleep need per goal
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepGoalMultipliers {
    pub peak: f64,
    pub perform: f64,
    pub get_by: f64,
}

/// Sleep planner configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepPlannerConfig {
    pub goal_multipliers: SleepGoalMultipliers,
}

/// Process-wide scoring configuration, loaded once and treated read-only
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    pub version: String,
    pub recovery: RecoveryConfig,
    pub sleep: SleepConfig,
    pub strain: StrainConfig,
    pub heart_rate_zones: HeartRateZoneConfig,
    pub baselines: BaselineConfig,
    pub sleep_planner: SleepPlannerConfig,
}

impl ScoringConfig {
    /// Parse the configuration bundled with the crate
    pub fn bundled() -> std::result::Result<Self, ConfigError> {
        let config = Self::from_json(BUNDLED_CONFIG)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration document from a JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load an override configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config = Self::from_json(&content)
            .with_context(|| "Failed to parse JSON scoring configuration")?;

        config
            .validate()
            .with_context(|| "Scoring configuration failed validation")?;

        Ok(config)
    }

    /// Structural sanity checks; rejects configurations the engines
    /// cannot score with
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let zones = &self.heart_rate_zones;
        if zones.boundaries.len() != zones.multipliers.len() + 1 {
            return Err(ConfigError::Invalid(format!(
                "expected {} zone boundaries for {} multipliers",
                zones.multipliers.len() + 1,
                zones.multipliers.len()
            )));
        }
        if zones.boundaries.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::Invalid(
                "heart-rate zone boundaries must be strictly ascending".to_string(),
            ));
        }
        if zones.sample_max_duration_seconds <= 0.0 {
            return Err(ConfigError::Invalid(
                "sampleMaxDurationSeconds must be positive".to_string(),
            ));
        }

        let w = &self.recovery.weights;
        let weight_sum = w.hrv
            + w.resting_heart_rate
            + w.sleep
            + w.respiratory_rate
            + w.spo2
            + w.skin_temperature;
        if weight_sum <= 0.0 {
            return Err(ConfigError::Invalid(
                "recovery weights must sum to a positive value".to_string(),
            ));
        }
        if self.recovery.sigmoid_steepness <= 0.0 {
            return Err(ConfigError::Invalid(
                "sigmoidSteepness must be positive".to_string(),
            ));
        }
        if self.recovery.score_range.min >= self.recovery.score_range.max {
            return Err(ConfigError::Invalid(
                "recovery score range must be ordered".to_string(),
            ));
        }

        if self.strain.min_value >= self.strain.max_value {
            return Err(ConfigError::Invalid(
                "strain range must be ordered".to_string(),
            ));
        }
        if self.strain.scaling_factor <= 0.0 || self.strain.log_offset_constant <= 0.0 {
            return Err(ConfigError::Invalid(
                "strain scaling factor and log offset must be positive".to_string(),
            ));
        }

        let sleep = &self.sleep;
        if sleep.strain_supplements.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one strain supplement band is required".to_string(),
            ));
        }
        if sleep
            .strain_supplements
            .windows(2)
            .any(|w| w[0].strain_below >= w[1].strain_below)
        {
            return Err(ConfigError::Invalid(
                "strain supplement bands must be strictly ascending".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&sleep.debt_repayment_rate) {
            return Err(ConfigError::Invalid(
                "debtRepaymentRate must lie in [0, 1]".to_string(),
            ));
        }
        if sleep.consistency_decay_tau <= 0.0 {
            return Err(ConfigError::Invalid(
                "consistencyDecayTau must be positive".to_string(),
            ));
        }
        if sleep.defaults.baseline_hours <= 0.0 {
            return Err(ConfigError::Invalid(
                "default baseline sleep hours must be positive".to_string(),
            ));
        }

        let baselines = &self.baselines;
        if baselines.window_days == 0 || baselines.minimum_samples == 0 {
            return Err(ConfigError::Invalid(
                "baseline window and minimum sample count must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&baselines.exponential_alpha)
            || baselines.exponential_alpha == 0.0
        {
            return Err(ConfigError::Invalid(
                "exponentialAlpha must lie in (0, 1]".to_string(),
            ));
        }

        let goals = &self.sleep_planner.goal_multipliers;
        for fraction in [goals.peak, goals.perform, goals.get_by] {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(ConfigError::Invalid(
                    "sleep goal fractions must lie in (0, 1]".to_string(),
                ));
            }
        }

        Ok(())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            recovery: RecoveryConfig::default(),
            sleep: SleepConfig::default(),
            strain: StrainConfig::default(),
            heart_rate_zones: HeartRateZoneConfig::default(),
            baselines: BaselineConfig::default(),
            sleep_planner: SleepPlannerConfig::default(),
        }
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            weights: RecoveryWeights {
                hrv: 0.40,
                resting_heart_rate: 0.25,
                sleep: 0.20,
                respiratory_rate: 0.05,
                spo2: 0.05,
                skin_temperature: 0.05,
            },
            sigmoid_steepness: 1.5,
            score_range: ScoreRange {
                min: 0.0,
                max: 100.0,
            },
            zones: RecoveryZoneBands {
                green: ScoreRange {
                    min: 67.0,
                    max: 100.0,
                },
                yellow: ScoreRange {
                    min: 34.0,
                    max: 66.0,
                },
                red: ScoreRange {
                    min: 0.0,
                    max: 33.0,
                },
            },
            strain_targets: StrainTargets {
                green: ScoreRange {
                    min: 14.0,
                    max: 18.0,
                },
                yellow: ScoreRange {
                    min: 8.0,
                    max: 13.9,
                },
                red: ScoreRange { min: 2.0, max: 7.9 },
            },
            insight_thresholds: InsightThresholds {
                hrv_percent_change: 10.0,
                rhr_delta_bpm: 3.0,
                sleep_performance_high: 95.0,
                sleep_performance_low: 70.0,
                skin_temp_deviation_celsius: 0.5,
            },
        }
    }
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            composite_weights: SleepCompositeWeights {
                sufficiency: 0.50,
                efficiency: 0.25,
                consistency: 0.15,
                disturbances: 0.10,
            },
            consistency_window_nights: 4,
            consistency_decay_tau: 60.0,
            disturbance_scaling: 20.0,
            strain_supplements: vec![
                StrainSupplement {
                    strain_below: 8.0,
                    add_hours: 0.0,
                },
                StrainSupplement {
                    strain_below: 14.0,
                    add_hours: 0.25,
                },
                StrainSupplement {
                    strain_below: 18.0,
                    add_hours: 0.5,
                },
                StrainSupplement {
                    strain_below: 999.0,
                    add_hours: 0.75,
                },
            ],
            debt_repayment_rate: 0.20,
            debt_repayment_cap_hours: 2.0,
            minimum_need_hours: 5.0,
            defaults: SleepDefaults {
                baseline_hours: 7.5,
                onset_latency_minutes: 15.0,
            },
            session_detection: SessionDetection {
                gap_tolerance_minutes: 30.0,
                minimum_duration_minutes: 30.0,
                maximum_nap_duration_hours: 3.0,
                nap_credit_cap_hours: 1.5,
            },
        }
    }
}

impl Default for StrainConfig {
    fn default() -> Self {
        Self {
            scaling_factor: 6.0,
            log_offset_constant: 1.0,
            max_value: 21.0,
            min_value: 0.0,
            zones: StrainZoneBands {
                light: ScoreRange { min: 0.0, max: 8.0 },
                moderate: ScoreRange {
                    min: 8.0,
                    max: 14.0,
                },
                high: ScoreRange {
                    min: 14.0,
                    max: 18.0,
                },
                overreaching: ScoreRange {
                    min: 18.0,
                    max: 21.0,
                },
            },
        }
    }
}

impl Default for HeartRateZoneConfig {
    fn default() -> Self {
        Self {
            boundaries: vec![0.50, 0.60, 0.70, 0.80, 0.90, 1.00],
            multipliers: vec![1.0, 2.0, 3.0, 4.0, 5.0],
            sample_max_duration_seconds: 60.0,
        }
    }
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            window_days: 28,
            minimum_samples: 3,
            exponential_alpha: 0.1,
        }
    }
}

impl Default for SleepPlannerConfig {
    fn default() -> Self {
        Self {
            goal_multipliers: SleepGoalMultipliers {
                peak: 1.0,
                perform: 0.85,
                get_by: 0.70,
            },
        }
    }
}
