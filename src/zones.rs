//! Heart-rate zone table
//!
//! Five zones delimited by six ascending fractions of max HR. Readings below
//! the first boundary sit outside every zone and contribute nothing to
//! strain; zone 5 is unbounded above in practice since clamping happens on
//! the final strain value, not per sample.

use serde::{Deserialize, Serialize};

use crate::config::HeartRateZoneConfig;

/// One row of the materialized zone table, bounds in absolute BPM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateZone {
    /// 1-based zone number
    pub zone: u8,
    pub name: &'static str,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub multiplier: f64,
}

/// Zone lookups for one user's max heart rate
#[derive(Debug, Clone)]
pub struct HeartRateZoneCalculator {
    max_heart_rate: u16,
    boundaries: Vec<f64>,
    zones: Vec<HeartRateZone>,
}

const ZONE_NAMES: [&str; 5] = ["Warm-Up", "Fat Burn", "Aerobic", "Threshold", "Anaerobic"];

impl HeartRateZoneCalculator {
    pub fn new(max_heart_rate: u16, config: &HeartRateZoneConfig) -> Self {
        let max_hr = f64::from(max_heart_rate);
        let zones = (0..config.multipliers.len())
            .map(|i| HeartRateZone {
                zone: (i + 1) as u8,
                name: ZONE_NAMES[i.min(ZONE_NAMES.len() - 1)],
                lower_bound: max_hr * config.boundaries[i],
                upper_bound: max_hr * config.boundaries[i + 1],
                multiplier: config.multipliers[i],
            })
            .collect();

        Self {
            max_heart_rate,
            boundaries: config.boundaries.clone(),
            zones,
        }
    }

    pub fn max_heart_rate(&self) -> u16 {
        self.max_heart_rate
    }

    pub fn zones(&self) -> &[HeartRateZone] {
        &self.zones
    }

    /// Zone containing the reading; `None` below the first boundary
    pub fn zone_for(&self, heart_rate: f64) -> Option<&HeartRateZone> {
        let percentage = heart_rate / f64::from(self.max_heart_rate);

        if percentage < self.boundaries[0] {
            return None;
        }
        for (i, zone) in self.zones.iter().enumerate() {
            if percentage < self.boundaries[i + 1] {
                return Some(zone);
            }
        }
        self.zones.last()
    }

    /// 1-based zone number, 0 when outside every zone
    pub fn zone_number(&self, heart_rate: f64) -> u8 {
        self.zone_for(heart_rate).map_or(0, |z| z.zone)
    }

    /// Strain multiplier, 0.0 when outside every zone
    pub fn multiplier(&self, heart_rate: f64) -> f64 {
        self.zone_for(heart_rate).map_or(0.0, |z| z.multiplier)
    }

    /// Zone bounds rounded to whole BPM for display
    pub fn zone_boundaries(&self) -> Vec<(u8, u16, u16)> {
        self.zones
            .iter()
            .map(|z| (z.zone, z.lower_bound as u16, z.upper_bound as u16))
            .collect()
    }
}
