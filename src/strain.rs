//! Cardiovascular strain scoring
//!
//! Strain accumulates time spent in heart-rate zones, weighted by each
//! zone's multiplier, and compresses the weighted area onto a bounded 0-21
//! scale with a log taper so that additional load always raises the score
//! but with diminishing returns. The scale bounds and taper constants come
//! from the scoring configuration.

use serde::{Deserialize, Serialize};

use crate::config::{HeartRateZoneConfig, ScoringConfig, StrainConfig};
use crate::models::HeartRateSample;
use crate::zones::HeartRateZoneCalculator;

/// Qualitative day classification derived from the strain score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrainZone {
    Light,
    Moderate,
    High,
    Overreaching,
}

impl std::fmt::Display for StrainZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StrainZone::Light => "Light",
            StrainZone::Moderate => "Moderate",
            StrainZone::High => "High",
            StrainZone::Overreaching => "Overreaching",
        };
        write!(f, "{}", label)
    }
}

/// Strain for one workout or one day, with the zone-time breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrainResult {
    pub strain: f64,

    /// Multiplier-weighted minutes before log compression
    pub weighted_hr_area: f64,

    /// Minutes per zone 1 through 5
    pub zone_minutes: [f64; 5],
}

impl StrainResult {
    pub fn total_zone_minutes(&self) -> f64 {
        self.zone_minutes.iter().sum()
    }
}

/// Fill in per-sample durations where the platform did not supply them.
///
/// With two or more samples, each covers the gap to the next one capped at
/// `max_duration_seconds`; the last sample reuses the previous duration. A
/// lone sample is assumed to cover five seconds.
pub fn estimate_durations(
    samples: &[HeartRateSample],
    max_duration_seconds: f64,
) -> Vec<HeartRateSample> {
    if samples.len() <= 1 {
        return samples
            .iter()
            .map(|s| HeartRateSample {
                duration_seconds: Some(s.duration_seconds.unwrap_or(5.0)),
                ..*s
            })
            .collect();
    }

    let mut result: Vec<HeartRateSample> = Vec::with_capacity(samples.len());
    for (i, sample) in samples.iter().enumerate() {
        let duration = if i < samples.len() - 1 {
            let gap = (samples[i + 1].timestamp_millis - sample.timestamp_millis) as f64 / 1000.0;
            gap.min(max_duration_seconds)
        } else {
            result
                .last()
                .and_then(|s: &HeartRateSample| s.duration_seconds)
                .unwrap_or(5.0)
        };

        result.push(HeartRateSample {
            duration_seconds: Some(duration),
            ..*sample
        });
    }
    result
}

/// Strain scoring for one user's max heart rate
#[derive(Debug, Clone)]
pub struct StrainEngine {
    config: StrainConfig,
    sample_max_duration_seconds: f64,
    zone_calculator: HeartRateZoneCalculator,
}

impl StrainEngine {
    pub fn new(max_heart_rate: u16, config: &ScoringConfig) -> Self {
        Self::with_configs(
            max_heart_rate,
            config.strain.clone(),
            &config.heart_rate_zones,
        )
    }

    pub fn with_configs(
        max_heart_rate: u16,
        strain_config: StrainConfig,
        hr_zone_config: &HeartRateZoneConfig,
    ) -> Self {
        Self {
            config: strain_config,
            sample_max_duration_seconds: hr_zone_config.sample_max_duration_seconds,
            zone_calculator: HeartRateZoneCalculator::new(max_heart_rate, hr_zone_config),
        }
    }

    pub fn zone_calculator(&self) -> &HeartRateZoneCalculator {
        &self.zone_calculator
    }

    /// Score samples that already carry durations
    pub fn compute_strain(&self, samples: &[HeartRateSample]) -> StrainResult {
        let mut weighted_hr_area = 0.0;
        let mut zone_minutes = [0.0; 5];

        for sample in samples {
            let duration_minutes = sample.duration_seconds.unwrap_or(0.0) / 60.0;
            let multiplier = self.zone_calculator.multiplier(sample.bpm);
            let zone_num = self.zone_calculator.zone_number(sample.bpm);

            weighted_hr_area += duration_minutes * multiplier;

            if (1..=5).contains(&zone_num) {
                zone_minutes[zone_num as usize - 1] += duration_minutes;
            }
        }

        let raw_strain =
            self.config.scaling_factor * (weighted_hr_area + self.config.log_offset_constant).log10();

        StrainResult {
            strain: raw_strain.clamp(self.config.min_value, self.config.max_value),
            weighted_hr_area,
            zone_minutes,
        }
    }

    /// Score raw platform samples, estimating durations from timestamps
    pub fn compute_workout_strain(&self, raw_samples: &[HeartRateSample]) -> StrainResult {
        let samples = estimate_durations(raw_samples, self.sample_max_duration_seconds);
        self.compute_strain(&samples)
    }

    /// Sum per-workout strains plus any non-exercise contribution into the
    /// day's strain, clamped once at this final output
    pub fn daily_strain(&self, workout_strains: &[f64], baseline_contribution: f64) -> f64 {
        let total: f64 = workout_strains.iter().sum::<f64>() + baseline_contribution;
        total.clamp(self.config.min_value, self.config.max_value)
    }

    pub fn classify(&self, strain: f64) -> StrainZone {
        let zones = &self.config.zones;
        if strain < zones.light.max {
            StrainZone::Light
        } else if strain < zones.moderate.max {
            StrainZone::Moderate
        } else if strain < zones.high.max {
            StrainZone::High
        } else {
            StrainZone::Overreaching
        }
    }
}
