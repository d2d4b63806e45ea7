//! Bedtime recommendation from sleep need and wake-time history

use serde::{Deserialize, Serialize};

use crate::baseline::mean;
use crate::config::{ScoringConfig, SleepDefaults, SleepPlannerConfig};
use crate::sleep::SleepNeedBreakdown;

/// How much of the sleep need the user intends to meet tonight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SleepGoal {
    Peak,
    Perform,
    GetBy,
}

impl SleepGoal {
    pub fn display_name(&self) -> &'static str {
        match self {
            SleepGoal::Peak => "Peak",
            SleepGoal::Perform => "Perform",
            SleepGoal::GetBy => "Get By",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SleepGoal::Peak => "Full sleep need for maximum recovery",
            SleepGoal::Perform => "Solid sleep for a good recovery day",
            SleepGoal::GetBy => "Minimum viable sleep with reduced recovery",
        }
    }

    fn multiplier(&self, config: &SleepPlannerConfig) -> f64 {
        match self {
            SleepGoal::Peak => config.goal_multipliers.peak,
            SleepGoal::Perform => config.goal_multipliers.perform,
            SleepGoal::GetBy => config.goal_multipliers.get_by,
        }
    }
}

impl std::fmt::Display for SleepGoal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Planner output; the bedtime is the literal arithmetic result, never
/// clamped to plausible hours
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepPlanResult {
    pub sleep_need_hours: f64,
    pub required_sleep_duration: f64,
    pub recommended_bedtime_millis: i64,
    pub expected_wake_time_millis: i64,
    pub goal: SleepGoal,
    pub breakdown: SleepNeedBreakdown,
}

/// Turns a sleep need and desired wake time into a recommended bedtime
#[derive(Debug, Clone)]
pub struct SleepPlannerEngine {
    config: SleepPlannerConfig,
    defaults: SleepDefaults,
}

impl SleepPlannerEngine {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            config: config.sleep_planner,
            defaults: config.sleep.defaults,
        }
    }

    /// Work back from the desired wake time: required sleep is the need
    /// scaled by the goal, plus expected onset latency in bed
    pub fn plan(
        &self,
        sleep_need_hours: f64,
        goal: SleepGoal,
        desired_wake_time_millis: i64,
        estimated_onset_latency_minutes: f64,
        breakdown: SleepNeedBreakdown,
    ) -> SleepPlanResult {
        let required_sleep = sleep_need_hours * goal.multiplier(&self.config);
        let time_in_bed_hours = required_sleep + estimated_onset_latency_minutes / 60.0;
        let bedtime_millis =
            desired_wake_time_millis - (time_in_bed_hours * 3_600_000.0) as i64;

        SleepPlanResult {
            sleep_need_hours,
            required_sleep_duration: required_sleep,
            recommended_bedtime_millis: bedtime_millis,
            expected_wake_time_millis: desired_wake_time_millis,
            goal,
            breakdown,
        }
    }

    /// Mean of recent wake times in minutes past midnight, else 7:00
    pub fn estimate_wake_time(&self, recent_wake_time_minutes: &[f64]) -> f64 {
        if recent_wake_time_minutes.is_empty() {
            return 7.0 * 60.0;
        }
        mean(recent_wake_time_minutes)
    }

    /// Mean of observed onset latencies, else the configured default
    pub fn estimate_onset_latency(&self, historical_latencies: &[f64]) -> f64 {
        if historical_latencies.is_empty() {
            return self.defaults.onset_latency_minutes;
        }
        mean(historical_latencies)
    }
}
