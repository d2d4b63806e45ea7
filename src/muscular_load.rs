//! Muscular load estimation for strength-style workouts
//!
//! Heart-rate strain undercounts resistance work, so strength and combat
//! workout types get a separate load: minutes under load scaled by how
//! much body mass the movement pattern recruits, times a heart-rate
//! intensity factor, optionally corrected by reported RPE.

use serde::{Deserialize, Serialize};

/// Muscular load with its volume and intensity components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuscularLoadResult {
    pub load: f64,
    pub volume_score: f64,
    pub intensity_score: f64,
    pub workout_type: String,
}

/// Share of body mass a workout type effectively moves
const EFFECTIVE_MASS_FACTORS: &[(&str, f64)] = &[
    ("traditionalStrengthTraining", 1.0),
    ("functionalStrengthTraining", 0.9),
    ("crossTraining", 0.85),
    ("highIntensityIntervalTraining", 0.8),
    ("coreTraining", 0.6),
    ("yoga", 0.4),
    ("pilates", 0.5),
    ("flexibility", 0.3),
    ("wrestling", 0.9),
    ("boxing", 0.8),
    ("kickboxing", 0.85),
    ("martialArts", 0.85),
    ("climbing", 0.85),
    ("rowing", 0.75),
];

const STRENGTH_TYPES: &[&str] = &[
    "traditionalStrengthTraining",
    "functionalStrengthTraining",
    "coreTraining",
];

const HIGH_INTENSITY_TYPES: &[&str] = &[
    "crossTraining",
    "highIntensityIntervalTraining",
    "wrestling",
    "boxing",
    "kickboxing",
    "martialArts",
    "climbing",
];

const CALIBRATION_FACTOR: f64 = 2.0;

fn effective_mass_factor(workout_type: &str) -> f64 {
    EFFECTIVE_MASS_FACTORS
        .iter()
        .find(|(name, _)| *name == workout_type)
        .map_or(0.5, |(_, factor)| *factor)
}

/// Muscular load on a 0-100 scale.
///
/// Volume is minutes times the effective-mass factor of the workout type,
/// intensity the product of average and peak heart-rate ratios clamped to
/// [0, 1]. RPE shifts the result by 10% per point away from 5.
pub fn compute_load(
    workout_type: &str,
    duration_minutes: f64,
    average_heart_rate: f64,
    max_heart_rate_during_workout: f64,
    user_max_heart_rate: f64,
    rpe: Option<u8>,
) -> MuscularLoadResult {
    let volume_score = duration_minutes * effective_mass_factor(workout_type);

    let avg_hr_ratio = average_heart_rate / user_max_heart_rate;
    let peak_hr_ratio = max_heart_rate_during_workout / user_max_heart_rate;
    let intensity_score = (avg_hr_ratio * peak_hr_ratio).clamp(0.0, 1.0);

    let mut load = volume_score * intensity_score * CALIBRATION_FACTOR;
    if let Some(rpe) = rpe {
        load *= 1.0 + (rpe as f64 - 5.0) * 0.1;
    }

    MuscularLoadResult {
        load: load.clamp(0.0, 100.0),
        volume_score,
        intensity_score,
        workout_type: workout_type.to_string(),
    }
}

/// True for workout types that accumulate meaningful muscular load
pub fn is_strength_workout(workout_type: &str) -> bool {
    STRENGTH_TYPES.contains(&workout_type) || HIGH_INTENSITY_TYPES.contains(&workout_type)
}
