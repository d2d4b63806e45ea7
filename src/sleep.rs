//! Sleep analysis and the sleep need model
//!
//! Raw stage segments from the platform are grouped into sessions, the
//! longest session becomes "main sleep" and shorter ones become naps.
//! Sleep need starts from the personal baseline and moves with today's
//! strain, accumulated sleep debt, and credited nap time. Performance is
//! hours slept over hours needed and is deliberately left uncapped above
//! 100, since sleeping past the need is a real signal. A composite quality
//! score blends sufficiency, efficiency, schedule consistency, and
//! disturbance rate.

use chrono::{DateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::baseline::population_std_dev;
use crate::config::{ScoringConfig, SleepConfig};

/// Stage of one platform sleep segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SleepStage {
    Awake,
    InBed,
    Light,
    Deep,
    Rem,
}

impl SleepStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SleepStage::Awake => "awake",
            SleepStage::InBed => "inBed",
            SleepStage::Light => "light",
            SleepStage::Deep => "deep",
            SleepStage::Rem => "rem",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "awake" => Some(SleepStage::Awake),
            "inBed" => Some(SleepStage::InBed),
            "light" => Some(SleepStage::Light),
            "deep" => Some(SleepStage::Deep),
            "rem" => Some(SleepStage::Rem),
            _ => None,
        }
    }

    /// True for stages that count toward sleep time
    pub fn is_sleep(&self) -> bool {
        matches!(self, SleepStage::Light | SleepStage::Deep | SleepStage::Rem)
    }
}

/// One contiguous run of a single sleep stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepStageSegment {
    pub stage: SleepStage,
    pub start_millis: i64,
    pub end_millis: i64,
}

impl SleepStageSegment {
    pub fn new(stage: SleepStage, start_millis: i64, end_millis: i64) -> Self {
        Self {
            stage,
            start_millis,
            end_millis,
        }
    }

    pub fn duration_minutes(&self) -> f64 {
        (self.end_millis - self.start_millis) as f64 / 60_000.0
    }
}

/// One detected sleep episode with its stage totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSessionData {
    pub start_millis: i64,
    pub end_millis: i64,
    pub total_sleep_minutes: f64,
    pub time_in_bed_minutes: f64,
    pub light_minutes: f64,
    pub deep_minutes: f64,
    pub rem_minutes: f64,
    pub awake_minutes: f64,

    /// Awake runs occurring after initial sleep onset
    pub awakenings: u32,

    /// Minutes from getting into bed to the first sleep stage
    pub sleep_onset_latency_minutes: Option<f64>,

    /// Percent of time in bed actually asleep
    pub sleep_efficiency: f64,

    pub stages: Vec<SleepStageSegment>,
}

/// Recent bed and wake times in minutes past midnight
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SleepConsistencyInput {
    pub recent_bedtime_minutes: Vec<f64>,
    pub recent_wake_time_minutes: Vec<f64>,
}

/// Components of tonight's need, carried through for presentation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepNeedBreakdown {
    pub baseline_need: f64,
    pub strain_supplement: f64,
    pub debt_repayment: f64,
    pub nap_credit: f64,
}

/// Everything the sleep engine derives for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepAnalysisResult {
    pub main_sleep: Option<SleepSessionData>,
    pub naps: Vec<SleepSessionData>,
    pub total_sleep_hours: f64,
    pub sleep_need_hours: f64,
    pub sleep_performance: f64,
    pub sleep_debt_hours: f64,
    pub sleep_score: f64,
    pub sleep_efficiency: f64,
    pub sleep_consistency: f64,
    pub restorative_sleep_pct: f64,
    pub disturbances_per_hour: f64,
    pub deep_sleep_pct: f64,
    pub rem_sleep_pct: f64,
}

/// Minutes past UTC midnight for an epoch timestamp.
///
/// Values past 18:00 wrap into the negative range (minutes minus 1440) so a
/// 23:30 bedtime (-30) and a 00:15 bedtime (+15) sit close together in the
/// consistency variance. Intentional, not a bug.
pub fn minutes_since_midnight(epoch_millis: i64) -> f64 {
    let Some(dt) = DateTime::from_timestamp_millis(epoch_millis) else {
        return 0.0;
    };
    let minutes = dt.hour() as f64 * 60.0 + dt.minute() as f64 + dt.second() as f64 / 60.0;
    if minutes > 1080.0 {
        minutes - 1440.0
    } else {
        minutes
    }
}

/// Sleep scoring over one day of sessions
#[derive(Debug, Clone)]
pub struct SleepEngine {
    config: SleepConfig,
}

impl SleepEngine {
    pub fn new(config: &ScoringConfig) -> Self {
        Self::with_config(config.sleep.clone())
    }

    pub fn with_config(config: SleepConfig) -> Self {
        Self { config }
    }

    /// Group raw stage segments into sessions.
    ///
    /// Segments are sorted by start time; a gap wider than the configured
    /// tolerance starts a new session.
    pub fn build_sessions(&self, segments: &[SleepStageSegment]) -> Vec<SleepSessionData> {
        if segments.is_empty() {
            return Vec::new();
        }

        let mut sorted = segments.to_vec();
        sorted.sort_by_key(|s| s.start_millis);

        let gap_millis = (self.config.session_detection.gap_tolerance_minutes * 60_000.0) as i64;

        let mut sessions = Vec::new();
        let mut current: Vec<SleepStageSegment> = Vec::new();
        let mut current_end = i64::MIN;

        for segment in sorted {
            if !current.is_empty() && segment.start_millis - current_end > gap_millis {
                sessions.push(self.assemble_session(std::mem::take(&mut current)));
            }
            current_end = if current.is_empty() {
                segment.end_millis
            } else {
                current_end.max(segment.end_millis)
            };
            current.push(segment);
        }
        if !current.is_empty() {
            sessions.push(self.assemble_session(current));
        }

        sessions
    }

    fn assemble_session(&self, stages: Vec<SleepStageSegment>) -> SleepSessionData {
        let start_millis = stages.iter().map(|s| s.start_millis).min().unwrap_or(0);
        let end_millis = stages.iter().map(|s| s.end_millis).max().unwrap_or(0);

        let mut light_minutes = 0.0;
        let mut deep_minutes = 0.0;
        let mut rem_minutes = 0.0;
        let mut awake_minutes = 0.0;
        for segment in &stages {
            let minutes = segment.duration_minutes();
            match segment.stage {
                SleepStage::Light => light_minutes += minutes,
                SleepStage::Deep => deep_minutes += minutes,
                SleepStage::Rem => rem_minutes += minutes,
                SleepStage::Awake => awake_minutes += minutes,
                SleepStage::InBed => {}
            }
        }

        let total_sleep_minutes = light_minutes + deep_minutes + rem_minutes;
        let time_in_bed_minutes = (end_millis - start_millis) as f64 / 60_000.0;

        let first_sleep_start = stages
            .iter()
            .find(|s| s.stage.is_sleep())
            .map(|s| s.start_millis);
        let last_sleep_end = stages
            .iter()
            .filter(|s| s.stage.is_sleep())
            .map(|s| s.end_millis)
            .max();

        let sleep_onset_latency_minutes =
            first_sleep_start.map(|t| (t - start_millis) as f64 / 60_000.0);

        // Awake runs before onset or after the final sleep stage are not
        // awakenings
        let awakenings = match (first_sleep_start, last_sleep_end) {
            (Some(onset), Some(final_sleep)) => stages
                .iter()
                .filter(|s| {
                    s.stage == SleepStage::Awake
                        && s.start_millis >= onset
                        && s.end_millis <= final_sleep
                })
                .count() as u32,
            _ => 0,
        };

        let sleep_efficiency = if time_in_bed_minutes > 0.0 {
            (total_sleep_minutes / time_in_bed_minutes * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        SleepSessionData {
            start_millis,
            end_millis,
            total_sleep_minutes,
            time_in_bed_minutes,
            light_minutes,
            deep_minutes,
            rem_minutes,
            awake_minutes,
            awakenings,
            sleep_onset_latency_minutes,
            sleep_efficiency,
            stages,
        }
    }

    /// Split sessions into main sleep (longest) and credited naps.
    ///
    /// Non-main sessions count as naps only inside the configured duration
    /// window; shorter ones are noise, longer ones a second sleep.
    pub fn classify_sessions(
        &self,
        mut sessions: Vec<SleepSessionData>,
    ) -> (Option<SleepSessionData>, Vec<SleepSessionData>) {
        if sessions.is_empty() {
            return (None, Vec::new());
        }

        sessions.sort_by(|a, b| {
            b.total_sleep_minutes
                .partial_cmp(&a.total_sleep_minutes)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let main = sessions.remove(0);

        let detection = &self.config.session_detection;
        let max_nap_minutes = detection.maximum_nap_duration_hours * 60.0;
        let naps = sessions
            .into_iter()
            .filter(|s| {
                s.total_sleep_minutes >= detection.minimum_duration_minutes
                    && s.total_sleep_minutes <= max_nap_minutes
            })
            .collect();

        (Some(main), naps)
    }

    /// Tonight's sleep need in hours.
    ///
    /// Baseline plus a strain supplement from the ascending schedule, plus a
    /// capped fraction of outstanding debt, minus capped nap credit, floored
    /// at the configured minimum.
    pub fn compute_sleep_need(
        &self,
        baseline_hours: f64,
        today_strain: f64,
        sleep_debt_hours: f64,
        nap_hours_today: f64,
    ) -> f64 {
        let parts =
            self.need_breakdown(baseline_hours, today_strain, sleep_debt_hours, nap_hours_today);

        (parts.baseline_need + parts.strain_supplement + parts.debt_repayment - parts.nap_credit)
            .max(self.config.minimum_need_hours)
    }

    /// The individual terms of [`compute_sleep_need`], before the floor
    ///
    /// [`compute_sleep_need`]: SleepEngine::compute_sleep_need
    pub fn need_breakdown(
        &self,
        baseline_hours: f64,
        today_strain: f64,
        sleep_debt_hours: f64,
        nap_hours_today: f64,
    ) -> SleepNeedBreakdown {
        let mut strain_supplement = 0.0;
        for supplement in &self.config.strain_supplements {
            if today_strain < supplement.strain_below {
                strain_supplement = supplement.add_hours;
                break;
            }
        }

        let debt_repayment = (sleep_debt_hours * self.config.debt_repayment_rate)
            .min(self.config.debt_repayment_cap_hours);
        let nap_credit = nap_hours_today.min(self.config.session_detection.nap_credit_cap_hours);

        SleepNeedBreakdown {
            baseline_need: baseline_hours,
            strain_supplement,
            debt_repayment,
            nap_credit,
        }
    }

    /// Percent of need actually slept, uncapped above 100
    pub fn compute_sleep_performance(&self, actual_sleep_hours: f64, sleep_need_hours: f64) -> f64 {
        if sleep_need_hours <= 0.0 {
            return 0.0;
        }
        (actual_sleep_hours / sleep_need_hours * 100.0).max(0.0)
    }

    /// Accumulated shortfall over the paired recent days.
    ///
    /// The two sequences must cover the same days in the same order;
    /// mismatched lengths are a caller error.
    pub fn compute_sleep_debt(
        &self,
        past_week_sleep_hours: &[f64],
        past_week_sleep_needs: &[f64],
    ) -> f64 {
        assert_eq!(
            past_week_sleep_hours.len(),
            past_week_sleep_needs.len(),
            "sleep debt inputs must be paired by day"
        );

        past_week_sleep_hours
            .iter()
            .zip(past_week_sleep_needs)
            .map(|(actual, need)| (need - actual).max(0.0))
            .sum()
    }

    /// Schedule regularity from the spread of recent bed and wake times
    pub fn compute_sleep_consistency(
        &self,
        current_bedtime_minutes: f64,
        current_wake_time_minutes: f64,
        recent_bedtime_minutes: &[f64],
        recent_wake_time_minutes: &[f64],
    ) -> f64 {
        if recent_bedtime_minutes.is_empty() {
            return 100.0;
        }

        let mut all_bedtimes = recent_bedtime_minutes.to_vec();
        all_bedtimes.push(current_bedtime_minutes);
        let mut all_wake_times = recent_wake_time_minutes.to_vec();
        all_wake_times.push(current_wake_time_minutes);

        let avg_std =
            (population_std_dev(&all_bedtimes) + population_std_dev(&all_wake_times)) / 2.0;

        (100.0 * (-avg_std / self.config.consistency_decay_tau).exp()).clamp(0.0, 100.0)
    }

    /// Deep plus REM share of total sleep
    pub fn compute_restorative_sleep_pct(&self, session: &SleepSessionData) -> f64 {
        if session.total_sleep_minutes <= 0.0 {
            return 0.0;
        }
        (session.deep_minutes + session.rem_minutes) / session.total_sleep_minutes * 100.0
    }

    pub fn compute_disturbances_per_hour(&self, session: &SleepSessionData) -> f64 {
        let hours = session.total_sleep_minutes / 60.0;
        if hours <= 0.0 {
            return 0.0;
        }
        session.awakenings as f64 / hours
    }

    /// Weighted quality composite on the 0-100 scale
    pub fn compute_composite_sleep_score(
        &self,
        sufficiency: f64,
        efficiency: f64,
        consistency: f64,
        disturbances_per_hour: f64,
    ) -> f64 {
        let disturbance_score =
            (100.0 - disturbances_per_hour * self.config.disturbance_scaling).clamp(0.0, 100.0);

        let weights = &self.config.composite_weights;
        let score = weights.sufficiency * sufficiency.min(100.0)
            + weights.efficiency * efficiency
            + weights.consistency * consistency
            + weights.disturbances * disturbance_score;

        score.clamp(0.0, 100.0)
    }

    /// Run the full sleep analysis for one day's sessions
    pub fn analyze(
        &self,
        sessions: Vec<SleepSessionData>,
        baseline_sleep_hours: f64,
        today_strain: f64,
        past_week_sleep_hours: &[f64],
        past_week_sleep_needs: &[f64],
        consistency_input: &SleepConsistencyInput,
    ) -> SleepAnalysisResult {
        let (main, naps) = self.classify_sessions(sessions);

        let main_sleep_minutes = main.as_ref().map_or(0.0, |m| m.total_sleep_minutes);
        let nap_hours = naps.iter().map(|n| n.total_sleep_minutes).sum::<f64>() / 60.0;
        let total_sleep_hours = main_sleep_minutes / 60.0 + nap_hours;

        let sleep_debt = self.compute_sleep_debt(past_week_sleep_hours, past_week_sleep_needs);
        let sleep_need =
            self.compute_sleep_need(baseline_sleep_hours, today_strain, sleep_debt, nap_hours);
        let performance = self.compute_sleep_performance(total_sleep_hours, sleep_need);

        let efficiency = main.as_ref().map_or(0.0, |m| m.sleep_efficiency);
        let restorative_pct = main
            .as_ref()
            .map_or(0.0, |m| self.compute_restorative_sleep_pct(m));
        let disturbances = main
            .as_ref()
            .map_or(0.0, |m| self.compute_disturbances_per_hour(m));
        let deep_pct = main.as_ref().map_or(0.0, |m| {
            if m.total_sleep_minutes > 0.0 {
                m.deep_minutes / m.total_sleep_minutes * 100.0
            } else {
                0.0
            }
        });
        let rem_pct = main.as_ref().map_or(0.0, |m| {
            if m.total_sleep_minutes > 0.0 {
                m.rem_minutes / m.total_sleep_minutes * 100.0
            } else {
                0.0
            }
        });

        let consistency = match &main {
            Some(m) => self.compute_sleep_consistency(
                minutes_since_midnight(m.start_millis),
                minutes_since_midnight(m.end_millis),
                &consistency_input.recent_bedtime_minutes,
                &consistency_input.recent_wake_time_minutes,
            ),
            None => 100.0,
        };

        let sleep_score =
            self.compute_composite_sleep_score(performance, efficiency, consistency, disturbances);

        SleepAnalysisResult {
            main_sleep: main,
            naps,
            total_sleep_hours,
            sleep_need_hours: sleep_need,
            sleep_performance: performance,
            sleep_debt_hours: sleep_debt,
            sleep_score,
            sleep_efficiency: efficiency,
            sleep_consistency: consistency,
            restorative_sleep_pct: restorative_pct,
            disturbances_per_hour: disturbances,
            deep_sleep_pct: deep_pct,
            rem_sleep_pct: rem_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SleepEngine {
        SleepEngine::new(&ScoringConfig::default())
    }

    fn session(total_sleep_minutes: f64) -> SleepSessionData {
        SleepSessionData {
            start_millis: 0,
            end_millis: (total_sleep_minutes * 60_000.0) as i64,
            total_sleep_minutes,
            time_in_bed_minutes: total_sleep_minutes,
            light_minutes: total_sleep_minutes,
            deep_minutes: 0.0,
            rem_minutes: 0.0,
            awake_minutes: 0.0,
            awakenings: 0,
            sleep_onset_latency_minutes: Some(0.0),
            sleep_efficiency: 100.0,
            stages: Vec::new(),
        }
    }

    const HOUR: i64 = 3_600_000;

    #[test]
    fn test_minutes_since_midnight_wraps_late_evening() {
        // 1970-01-01 23:30 UTC
        let late = 23 * HOUR + 30 * 60_000;
        assert_eq!(minutes_since_midnight(late), -30.0);

        // 00:15 next day
        let early = 24 * HOUR + 15 * 60_000;
        assert_eq!(minutes_since_midnight(early), 15.0);

        // Noon stays positive
        assert_eq!(minutes_since_midnight(12 * HOUR), 720.0);

        // 18:00 exactly does not wrap
        assert_eq!(minutes_since_midnight(18 * HOUR), 1080.0);
    }

    #[test]
    fn test_build_sessions_merges_within_gap_tolerance() {
        // Two light runs 10 minutes apart stay one session
        let segments = vec![
            SleepStageSegment::new(SleepStage::Light, 0, HOUR),
            SleepStageSegment::new(SleepStage::Light, HOUR + 600_000, 2 * HOUR),
        ];

        let sessions = engine().build_sessions(&segments);

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].start_millis, 0);
        assert_eq!(sessions[0].end_millis, 2 * HOUR);
    }

    #[test]
    fn test_build_sessions_splits_on_wide_gap() {
        // 40 minutes apart exceeds the 30-minute tolerance
        let segments = vec![
            SleepStageSegment::new(SleepStage::Light, 0, HOUR),
            SleepStageSegment::new(SleepStage::Light, HOUR + 2_400_000, 2 * HOUR),
        ];

        let sessions = engine().build_sessions(&segments);

        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn test_build_sessions_stage_accounting() {
        let sessions = engine().build_sessions(&[
            SleepStageSegment::new(SleepStage::Light, 0, HOUR),
            SleepStageSegment::new(SleepStage::Deep, HOUR, 2 * HOUR),
            SleepStageSegment::new(SleepStage::Awake, 2 * HOUR, 2 * HOUR + 300_000),
            SleepStageSegment::new(SleepStage::Rem, 2 * HOUR + 300_000, 3 * HOUR),
        ]);

        assert_eq!(sessions.len(), 1);
        let s = &sessions[0];
        assert_eq!(s.light_minutes, 60.0);
        assert_eq!(s.deep_minutes, 60.0);
        assert_eq!(s.rem_minutes, 55.0);
        assert_eq!(s.awake_minutes, 5.0);
        assert_eq!(s.total_sleep_minutes, 175.0);
        assert_eq!(s.time_in_bed_minutes, 180.0);
        assert_eq!(s.awakenings, 1);
        assert_eq!(s.sleep_onset_latency_minutes, Some(0.0));
        assert!((s.sleep_efficiency - 175.0 / 180.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_build_sessions_onset_latency_and_edge_awake() {
        // Awake before onset is latency, not an awakening
        let sessions = engine().build_sessions(&[
            SleepStageSegment::new(SleepStage::Awake, 0, 600_000),
            SleepStageSegment::new(SleepStage::Light, 600_000, HOUR),
        ]);

        let s = &sessions[0];
        assert_eq!(s.sleep_onset_latency_minutes, Some(10.0));
        assert_eq!(s.awakenings, 0);
    }

    #[test]
    fn test_classify_sessions_picks_longest_as_main() {
        let (main, naps) = engine().classify_sessions(vec![
            session(45.0),
            session(420.0),
            session(10.0),
            session(200.0),
        ]);

        assert_eq!(main.map(|m| m.total_sleep_minutes), Some(420.0));
        // 45 min is a nap; 10 min is noise; 200 min exceeds the nap maximum
        assert_eq!(naps.len(), 1);
        assert_eq!(naps[0].total_sleep_minutes, 45.0);
    }

    #[test]
    fn test_classify_sessions_empty() {
        let (main, naps) = engine().classify_sessions(Vec::new());
        assert!(main.is_none());
        assert!(naps.is_empty());
    }

    #[test]
    fn test_sleep_need_baseline_only() {
        assert_eq!(engine().compute_sleep_need(7.5, 5.0, 0.0, 0.0), 7.5);
    }

    #[test]
    fn test_sleep_need_strain_and_debt() {
        // Strain 15 adds 0.5 h, debt 2 h repays 0.4 h
        let need = engine().compute_sleep_need(7.5, 15.0, 2.0, 0.0);
        assert!((need - 8.4).abs() < 1e-9);
    }

    #[test]
    fn test_sleep_need_repayment_is_capped() {
        // 15 h of debt would repay 3 h; the cap holds it at 2
        let need = engine().compute_sleep_need(7.5, 5.0, 15.0, 0.0);
        assert!((need - 9.5).abs() < 1e-9);
    }

    #[test]
    fn test_sleep_need_nap_credit_is_capped() {
        let need = engine().compute_sleep_need(7.5, 5.0, 0.0, 2.5);
        assert!((need - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_sleep_need_floors_at_minimum() {
        let need = engine().compute_sleep_need(5.5, 5.0, 0.0, 1.5);
        assert_eq!(need, 5.0);
    }

    #[test]
    fn test_sleep_need_extreme_strain_uses_last_band() {
        let need = engine().compute_sleep_need(7.5, 21.0, 0.0, 0.0);
        assert!((need - 8.25).abs() < 1e-9);
    }

    #[test]
    fn test_performance_uncapped_above_100() {
        let engine = engine();

        assert!((engine.compute_sleep_performance(7.2, 8.0) - 90.0).abs() < 1e-9);
        assert!((engine.compute_sleep_performance(9.0, 8.0) - 112.5).abs() < 1e-9);
        assert_eq!(engine.compute_sleep_performance(5.0, 0.0), 0.0);
    }

    #[test]
    fn test_sleep_debt_sums_daily_shortfalls() {
        let debt = engine().compute_sleep_debt(&[7.0, 6.0, 7.0], &[8.0, 8.0, 8.0]);
        assert_eq!(debt, 4.0);
    }

    #[test]
    fn test_sleep_debt_surplus_does_not_offset() {
        // Oversleeping one night does not pay back another
        let debt = engine().compute_sleep_debt(&[9.0, 6.0], &[8.0, 8.0]);
        assert_eq!(debt, 2.0);
    }

    #[test]
    #[should_panic(expected = "paired by day")]
    fn test_sleep_debt_rejects_mismatched_inputs() {
        engine().compute_sleep_debt(&[7.0, 6.0], &[8.0]);
    }

    #[test]
    fn test_consistency_without_history() {
        assert_eq!(engine().compute_sleep_consistency(-30.0, 420.0, &[], &[]), 100.0);
    }

    #[test]
    fn test_consistency_perfect_schedule() {
        let score =
            engine().compute_sleep_consistency(-30.0, 420.0, &[-30.0, -30.0], &[420.0, 420.0]);
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_consistency_decays_with_spread() {
        // Bedtimes spread an hour across three nights, wake times steady
        let score = engine().compute_sleep_consistency(30.0, 420.0, &[-30.0, 0.0], &[420.0, 420.0]);
        assert!((score - 81.537).abs() < 0.01);
    }

    #[test]
    fn test_restorative_pct() {
        let mut s = session(300.0);
        s.light_minutes = 175.0;
        s.deep_minutes = 60.0;
        s.rem_minutes = 65.0;

        let pct = engine().compute_restorative_sleep_pct(&s);
        assert!((pct - 41.6667).abs() < 0.001);
    }

    #[test]
    fn test_disturbances_per_hour() {
        let mut s = session(360.0);
        s.awakenings = 3;

        assert!((engine().compute_disturbances_per_hour(&s) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_composite_score_weighting() {
        let score = engine().compute_composite_sleep_score(50.0, 70.0, 40.0, 3.0);
        assert!((score - 52.5).abs() < 1e-9);
    }

    #[test]
    fn test_composite_score_caps_sufficiency() {
        // Oversleeping cannot push the composite past a perfect night
        let score = engine().compute_composite_sleep_score(120.0, 100.0, 100.0, 0.0);
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_analyze_full_day() {
        let engine = engine();

        let mut main = session(420.0);
        main.deep_minutes = 80.0;
        main.rem_minutes = 90.0;
        main.light_minutes = 250.0;
        main.sleep_efficiency = 94.0;
        main.awakenings = 2;
        let nap = session(60.0);

        let result = engine.analyze(
            vec![main, nap],
            7.5,
            15.0,
            &[7.0, 6.0, 7.0],
            &[8.0, 8.0, 8.0],
            &SleepConsistencyInput::default(),
        );

        assert_eq!(result.total_sleep_hours, 8.0);
        assert_eq!(result.sleep_debt_hours, 4.0);
        // 7.5 baseline + 0.5 strain + 0.8 repayment - 1.0 nap credit
        assert!((result.sleep_need_hours - 7.8).abs() < 1e-9);
        // More sleep than need reads above 100
        assert!((result.sleep_performance - 102.5641).abs() < 0.001);
        assert_eq!(result.sleep_consistency, 100.0);
        assert!((result.restorative_sleep_pct - 170.0 / 420.0 * 100.0).abs() < 1e-9);
        assert!((result.deep_sleep_pct - 80.0 / 420.0 * 100.0).abs() < 1e-9);
        assert!((result.rem_sleep_pct - 90.0 / 420.0 * 100.0).abs() < 1e-9);
        assert!(result.sleep_score > 90.0);
        assert_eq!(result.naps.len(), 1);
    }

    #[test]
    fn test_analyze_without_sessions() {
        let result = engine().analyze(
            Vec::new(),
            7.5,
            5.0,
            &[],
            &[],
            &SleepConsistencyInput::default(),
        );

        assert!(result.main_sleep.is_none());
        assert_eq!(result.total_sleep_hours, 0.0);
        assert_eq!(result.sleep_performance, 0.0);
        assert_eq!(result.sleep_consistency, 100.0);
        // Consistency and disturbance terms alone
        assert_eq!(result.sleep_score, 25.0);
    }

    #[test]
    fn test_stage_round_trip() {
        for stage in [
            SleepStage::Awake,
            SleepStage::InBed,
            SleepStage::Light,
            SleepStage::Deep,
            SleepStage::Rem,
        ] {
            assert_eq!(SleepStage::parse(stage.as_str()), Some(stage));
        }
        assert_eq!(SleepStage::parse("unknown"), None);
    }

    // Property-based tests using proptest
    use proptest::prelude::*;

    proptest! {
        // Any epoch time lands in the wrapped window (-360, 1080]
        #[test]
        fn test_minutes_since_midnight_window(millis in 0i64..4_102_444_800_000) {
            let minutes = minutes_since_midnight(millis);
            prop_assert!(minutes > -360.0);
            prop_assert!(minutes <= 1080.0);
        }

        #[test]
        fn test_sleep_debt_never_negative(
            nights in prop::collection::vec((3.0f64..12.0, 6.0f64..10.0), 0..14)
        ) {
            let hours: Vec<f64> = nights.iter().map(|(h, _)| *h).collect();
            let needs: Vec<f64> = nights.iter().map(|(_, n)| *n).collect();

            let debt = engine().compute_sleep_debt(&hours, &needs);
            prop_assert!(debt >= 0.0);
        }

        #[test]
        fn test_need_never_below_floor(
            baseline in 4.0f64..10.0,
            strain in 0.0f64..21.0,
            debt in 0.0f64..10.0,
            naps in 0.0f64..4.0
        ) {
            let need = engine().compute_sleep_need(baseline, strain, debt, naps);
            prop_assert!(need >= 5.0);
        }

        #[test]
        fn test_performance_non_negative(
            slept in 0.0f64..16.0,
            need in 0.0f64..12.0
        ) {
            let performance = engine().compute_sleep_performance(slept, need);
            prop_assert!(performance >= 0.0);
        }
    }
}
