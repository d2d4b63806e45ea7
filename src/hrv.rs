//! Heart-rate-variability derivation
//!
//! Produces the single HRV value Recovery consumes. RMSSD is preferred
//! wherever it is available; SDNN is carried as a fallback because some
//! platforms only report that statistic.

use serde::{Deserialize, Serialize};

/// Shortest inter-beat interval accepted as physiological, in milliseconds
const MIN_INTERVAL_MS: f64 = 200.0;

/// Longest inter-beat interval accepted as physiological, in milliseconds
const MAX_INTERVAL_MS: f64 = 2000.0;

/// How an HRV value was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HrvMethod {
    RmssdFromRrIntervals,
    RmssdFromPlatform,
    SdnnFromPlatform,
}

/// Usable HRV reading with its provenance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HrvResult {
    pub rmssd: Option<f64>,
    pub sdnn: Option<f64>,
    pub method: Option<HrvMethod>,
}

impl HrvResult {
    /// The value consumed downstream: RMSSD when present, else SDNN
    pub fn effective(&self) -> Option<f64> {
        self.rmssd.or(self.sdnn)
    }
}

/// Root mean square of successive differences over beat arrival times.
///
/// `rr_intervals_seconds` holds consecutive R-wave arrival times in seconds.
/// Consecutive differences become inter-beat intervals in milliseconds; any
/// interval outside [200, 2000] ms is discarded as a sensor artifact before
/// the RMS step. Returns `None` when fewer than two valid intervals remain.
pub fn compute_rmssd(rr_intervals_seconds: &[f64]) -> Option<f64> {
    if rr_intervals_seconds.len() <= 1 {
        return None;
    }

    let intervals: Vec<f64> = rr_intervals_seconds
        .windows(2)
        .map(|w| (w[1] - w[0]) * 1000.0)
        .filter(|ms| (MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(ms))
        .collect();

    if intervals.len() <= 1 {
        return None;
    }

    let squared_diffs: Vec<f64> = intervals
        .windows(2)
        .map(|w| {
            let diff = w[1] - w[0];
            diff * diff
        })
        .collect();

    if squared_diffs.is_empty() {
        return None;
    }

    let mean_squared = squared_diffs.iter().sum::<f64>() / squared_diffs.len() as f64;
    Some(mean_squared.sqrt())
}

/// Pick the best of the platform-reported values
pub fn best_hrv(rmssd_value: Option<f64>, sdnn_value: Option<f64>) -> HrvResult {
    if rmssd_value.is_some() {
        return HrvResult {
            rmssd: rmssd_value,
            sdnn: sdnn_value,
            method: Some(HrvMethod::RmssdFromPlatform),
        };
    }

    if sdnn_value.is_some() {
        return HrvResult {
            rmssd: None,
            sdnn: sdnn_value,
            method: Some(HrvMethod::SdnnFromPlatform),
        };
    }

    HrvResult {
        rmssd: None,
        sdnn: None,
        method: None,
    }
}

/// Derive RMSSD locally from raw beat times
pub fn from_rr_intervals(rr_intervals_seconds: &[f64]) -> HrvResult {
    match compute_rmssd(rr_intervals_seconds) {
        Some(rmssd) => HrvResult {
            rmssd: Some(rmssd),
            sdnn: None,
            method: Some(HrvMethod::RmssdFromRrIntervals),
        },
        None => HrvResult {
            rmssd: None,
            sdnn: None,
            method: None,
        },
    }
}

/// Free-function form of [`HrvResult::effective`]
pub fn effective_hrv(result: &HrvResult) -> Option<f64> {
    result.effective()
}
