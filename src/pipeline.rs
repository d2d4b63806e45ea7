//! Daily metric computation pipeline.
//!
//! `MetricPipeline` drives the scoring engines over one calendar date in six
//! ordered steps: baselines, sleep, recovery, strain, secondary metrics, and
//! stress. A failing step is captured in the day's [`DailyRunReport`] and the
//! remaining steps still run, so one bad sensor never takes down the whole
//! day. The finished [`DailyMetric`] row is written once at the end.
//!
//! Runs are serialized through a running flag. A trigger that arrives while
//! another run holds the pipeline gets [`RunOutcome::AlreadyRunning`] back
//! instead of queueing.

use std::sync::Mutex;

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::baseline::{mean, BaselineCalculator, BaselineMetric, BaselineMetricType, BaselineResult};
use crate::config::{ScoreRange, ScoringConfig};
use crate::error::Result;
use crate::hrv;
use crate::models::{DailyMetric, ExerciseSession, UserProfile, WorkoutRecord};
use crate::muscular_load;
use crate::planner::{SleepGoal, SleepPlanResult, SleepPlannerEngine};
use crate::provider::{HealthDataProvider, ProviderResult};
use crate::recovery::{RecoveryBaselines, RecoveryEngine, RecoveryInput};
use crate::repository::{
    BaselineRepository, DailyMetricRepository, SleepRepository, UserProfileRepository,
    WorkoutRepository,
};
use crate::sleep::{SleepConsistencyInput, SleepEngine};
use crate::strain::StrainEngine;
use crate::stress::{StressEngine, STRESS_BASELINE_WINDOW_DAYS};

const HOUR_MILLIS: i64 = 3_600_000;

/// How far before midnight the sleep fetch window opens, so a session
/// started the previous evening is attributed to the morning it ends on
const SLEEP_LOOKBACK_HOURS: i64 = 6;

/// Overnight vitals window: previous day 20:00 through 10:00
const OVERNIGHT_START_HOUR: i64 = 20;
const OVERNIGHT_END_HOUR: i64 = 10;

/// Preconditions the pipeline cannot compute around
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("no user profile is set")]
    NoUserProfile,
    #[error("insufficient data: {0}")]
    InsufficientData(String),
}

/// The six ordered pipeline steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    Baselines,
    Sleep,
    Recovery,
    Strain,
    SecondaryMetrics,
    Stress,
}

impl PipelineStep {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineStep::Baselines => "baselines",
            PipelineStep::Sleep => "sleep",
            PipelineStep::Recovery => "recovery",
            PipelineStep::Strain => "strain",
            PipelineStep::SecondaryMetrics => "secondary_metrics",
            PipelineStep::Stress => "stress",
        }
    }
}

/// What happened to one step of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    /// The step had nothing to do, e.g. no sleep data for the date
    Skipped,
    Failed(String),
}

/// Per-step outcomes of one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRunReport {
    pub date: NaiveDate,
    pub steps: Vec<(PipelineStep, StepStatus)>,
}

impl DailyRunReport {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            steps: Vec::new(),
        }
    }

    fn record(&mut self, step: PipelineStep, result: Result<StepStatus>) {
        let status = match result {
            Ok(status) => status,
            Err(e) => {
                warn!(date = %self.date, step = step.name(), error = %e, "pipeline step failed");
                StepStatus::Failed(e.to_string())
            }
        };
        self.steps.push((step, status));
    }

    pub fn status(&self, step: PipelineStep) -> Option<&StepStatus> {
        self.steps
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, status)| status)
    }

    /// True when no step failed; skipped steps count as fine
    pub fn all_completed(&self) -> bool {
        !self
            .steps
            .iter()
            .any(|(_, status)| matches!(status, StepStatus::Failed(_)))
    }

    pub fn failed_steps(&self) -> Vec<PipelineStep> {
        self.steps
            .iter()
            .filter(|(_, status)| matches!(status, StepStatus::Failed(_)))
            .map(|(step, _)| *step)
            .collect()
    }
}

/// Result of a pipeline trigger
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome<T = DailyRunReport> {
    Completed(T),
    /// Another run already holds the pipeline; nothing was queued
    AlreadyRunning,
}

/// Clears the running flag when a run ends, normally or by early return
struct RunningGuard<'a>(&'a Mutex<bool>);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = false;
    }
}

fn day_start_millis(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Orchestrates the scoring engines over the stores for one date at a time
pub struct MetricPipeline<'a> {
    provider: &'a dyn HealthDataProvider,
    metrics: &'a dyn DailyMetricRepository,
    sleep_store: &'a dyn SleepRepository,
    workouts: &'a dyn WorkoutRepository,
    baselines: &'a dyn BaselineRepository,
    profiles: &'a dyn UserProfileRepository,

    baseline_calculator: BaselineCalculator,
    sleep_engine: SleepEngine,
    recovery_engine: RecoveryEngine,
    stress_engine: StressEngine,
    planner: SleepPlannerEngine,
    config: ScoringConfig,

    running: Mutex<bool>,
}

impl<'a> MetricPipeline<'a> {
    pub fn new(
        config: &ScoringConfig,
        provider: &'a dyn HealthDataProvider,
        metrics: &'a dyn DailyMetricRepository,
        sleep_store: &'a dyn SleepRepository,
        workouts: &'a dyn WorkoutRepository,
        baselines: &'a dyn BaselineRepository,
        profiles: &'a dyn UserProfileRepository,
    ) -> Self {
        Self {
            provider,
            metrics,
            sleep_store,
            workouts,
            baselines,
            profiles,
            baseline_calculator: BaselineCalculator::new(config),
            sleep_engine: SleepEngine::new(config),
            recovery_engine: RecoveryEngine::new(config),
            stress_engine: StressEngine::new(config),
            planner: SleepPlannerEngine::new(config),
            config: config.clone(),
            running: Mutex::new(false),
        }
    }

    /// Run all six steps for one date and persist the result
    pub fn run_for_date(&self, date: NaiveDate) -> Result<RunOutcome> {
        let Some(_guard) = self.try_begin() else {
            debug!(%date, "pipeline already running, trigger dropped");
            return Ok(RunOutcome::AlreadyRunning);
        };

        let report = self.compute_day(date)?;
        Ok(RunOutcome::Completed(report))
    }

    /// Refresh only the cheap intraday numbers: strain plus steps and
    /// calories. Safe to call frequently; never touches `is_computed`.
    pub fn quick_refresh(&self, date: NaiveDate) -> Result<RunOutcome> {
        let Some(_guard) = self.try_begin() else {
            debug!(%date, "pipeline already running, refresh dropped");
            return Ok(RunOutcome::AlreadyRunning);
        };

        let profile = self
            .profiles
            .load_profile()?
            .ok_or(ComputeError::NoUserProfile)?;
        let mut metric = self
            .metrics
            .metric_for_date(date)?
            .unwrap_or_else(|| DailyMetric::new(date));

        let mut report = DailyRunReport::new(date);
        report.record(PipelineStep::Baselines, Ok(StepStatus::Skipped));
        report.record(PipelineStep::Sleep, Ok(StepStatus::Skipped));
        report.record(PipelineStep::Recovery, Ok(StepStatus::Skipped));
        report.record(
            PipelineStep::Strain,
            self.compute_strain(date, &profile, &mut metric),
        );
        report.record(
            PipelineStep::SecondaryMetrics,
            self.refresh_activity(date, &mut metric),
        );
        report.record(PipelineStep::Stress, Ok(StepStatus::Skipped));

        self.metrics.upsert_metric(&metric)?;
        debug!(%date, "quick refresh finished");
        Ok(RunOutcome::Completed(report))
    }

    /// Compute a span of dates oldest first. Days already marked computed
    /// are skipped, except the last date, which is always recomputed since
    /// its inputs may still be arriving.
    pub fn backfill(&self, dates: &[NaiveDate]) -> Result<RunOutcome<Vec<DailyRunReport>>> {
        let Some(_guard) = self.try_begin() else {
            debug!("pipeline already running, backfill dropped");
            return Ok(RunOutcome::AlreadyRunning);
        };

        let mut ordered = dates.to_vec();
        ordered.sort_unstable();
        ordered.dedup();
        let last = ordered.last().copied();

        let mut reports = Vec::with_capacity(ordered.len());
        for date in ordered {
            if Some(date) != last {
                let already_done = self
                    .metrics
                    .metric_for_date(date)?
                    .is_some_and(|m| m.is_computed);
                if already_done {
                    debug!(%date, "backfill skipping computed day");
                    continue;
                }
            }
            reports.push(self.compute_day(date)?);
        }

        info!(days = reports.len(), "backfill finished");
        Ok(RunOutcome::Completed(reports))
    }

    /// Recommended bedtime for tonight, built from the date's stored need,
    /// nap history, and recent wake times.
    pub fn plan_sleep(&self, date: NaiveDate, goal: SleepGoal) -> Result<SleepPlanResult> {
        let profile = self
            .profiles
            .load_profile()?
            .ok_or(ComputeError::NoUserProfile)?;
        let metric = self.metrics.metric_for_date(date)?.ok_or_else(|| {
            ComputeError::InsufficientData(format!("no metrics computed for {date}"))
        })?;
        let need = metric.sleep_need_hours.ok_or_else(|| {
            ComputeError::InsufficientData("tonight's sleep need".to_string())
        })?;

        let sessions = self.sleep_store.sessions_for_date(date)?;
        let latencies: Vec<f64> = sessions
            .iter()
            .filter_map(|s| s.sleep_onset_latency_minutes)
            .collect();
        let latency = self.planner.estimate_onset_latency(&latencies);

        let window = self.config.sleep.consistency_window_nights;
        let recent_wakes = self.sleep_store.recent_wake_times(date, window)?;
        let wake_minutes = self.planner.estimate_wake_time(&recent_wakes);
        let wake_millis =
            day_start_millis(date + Duration::days(1)) + (wake_minutes * 60_000.0) as i64;

        let (_, naps) = self.sleep_engine.classify_sessions(sessions);
        let nap_hours = naps.iter().map(|n| n.total_sleep_minutes).sum::<f64>() / 60.0;
        let breakdown = self.sleep_engine.need_breakdown(
            profile.sleep_baseline_hours,
            metric.strain_score.unwrap_or(0.0),
            metric.sleep_debt_hours.unwrap_or(0.0),
            nap_hours,
        );

        Ok(self.planner.plan(need, goal, wake_millis, latency, breakdown))
    }

    /// Today's recommended strain band, from the stored recovery zone
    pub fn strain_target_for(&self, date: NaiveDate) -> Result<ScoreRange> {
        let zone = self
            .metrics
            .metric_for_date(date)?
            .and_then(|m| m.recovery_zone)
            .ok_or_else(|| {
                ComputeError::InsufficientData(format!("no recovery zone for {date}"))
            })?;
        Ok(self.recovery_engine.strain_target(zone))
    }

    fn try_begin(&self) -> Option<RunningGuard<'_>> {
        let mut running = self
            .running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *running {
            return None;
        }
        *running = true;
        Some(RunningGuard(&self.running))
    }

    fn compute_day(&self, date: NaiveDate) -> Result<DailyRunReport> {
        let profile = self
            .profiles
            .load_profile()?
            .ok_or(ComputeError::NoUserProfile)?;
        info!(%date, "computing daily metrics");

        let mut metric = self
            .metrics
            .metric_for_date(date)?
            .unwrap_or_else(|| DailyMetric::new(date));
        let mut report = DailyRunReport::new(date);

        report.record(PipelineStep::Baselines, self.update_baselines(date));
        report.record(
            PipelineStep::Sleep,
            self.compute_sleep(date, &profile, &mut metric),
        );
        report.record(
            PipelineStep::Recovery,
            self.compute_recovery(date, &mut metric),
        );
        report.record(
            PipelineStep::Strain,
            self.compute_strain(date, &profile, &mut metric),
        );
        report.record(
            PipelineStep::SecondaryMetrics,
            self.compute_secondary(date, &profile, &mut metric),
        );
        report.record(PipelineStep::Stress, self.compute_stress(date, &mut metric));

        metric.is_computed = true;
        metric.computed_at = Some(Utc::now());
        self.metrics.upsert_metric(&metric)?;

        if report.all_completed() {
            info!(%date, "daily metrics computed");
        } else {
            let failed: Vec<&str> = report.failed_steps().iter().map(|s| s.name()).collect();
            warn!(%date, ?failed, "daily metrics computed with failures");
        }
        Ok(report)
    }

    /// Step 1: recompute and persist the four tracked baselines from history
    fn update_baselines(&self, date: NaiveDate) -> Result<StepStatus> {
        let window = self.baseline_calculator.window_days();
        let window_start = date - Duration::days(window as i64);

        let series = [
            (BaselineMetricType::Hrv, self.metrics.recent_hrv(date, window)?),
            (
                BaselineMetricType::RestingHeartRate,
                self.metrics.recent_resting_heart_rate(date, window)?,
            ),
            (
                BaselineMetricType::Strain,
                self.metrics.recent_strain(date, window)?,
            ),
            (
                BaselineMetricType::SleepPerformance,
                self.metrics.recent_sleep_performance(date, window)?,
            ),
        ];

        for (metric_type, values) in series {
            if let Some(result) = self.baseline_calculator.compute(&values) {
                let snapshot = BaselineMetric::new(metric_type, &result, window_start, date);
                self.baselines.store_baseline(&snapshot)?;
                debug!(
                    metric = metric_type.as_str(),
                    mean = result.mean,
                    samples = result.sample_count,
                    "baseline updated"
                );
            }
        }
        Ok(StepStatus::Completed)
    }

    /// Step 2: fetch the night's segments, assemble sessions, analyze, and
    /// write the day's sleep fields
    fn compute_sleep(
        &self,
        date: NaiveDate,
        profile: &UserProfile,
        metric: &mut DailyMetric,
    ) -> Result<StepStatus> {
        let day_start = day_start_millis(date);
        let fetch_start = day_start - SLEEP_LOOKBACK_HOURS * HOUR_MILLIS;
        let fetch_end = day_start_millis(date + Duration::days(1));

        let segments = self.provider.sleep_segments(fetch_start, fetch_end)?;

        // A session belongs to the day it ends on; the lookahead in the
        // fetch window can pull in the start of the following night
        let sessions: Vec<_> = self
            .sleep_engine
            .build_sessions(&segments)
            .into_iter()
            .filter(|s| s.end_millis >= day_start && s.end_millis < fetch_end)
            .collect();
        if sessions.is_empty() {
            debug!(%date, "no sleep sessions ending on date");
            return Ok(StepStatus::Skipped);
        }
        let past_hours = self.metrics.recent_sleep_hours(date, 7)?;
        let past_needs = self.metrics.recent_sleep_needs(date, 7)?;

        let window = self.config.sleep.consistency_window_nights;
        let consistency_input = SleepConsistencyInput {
            recent_bedtime_minutes: self.sleep_store.recent_bedtimes(date, window)?,
            recent_wake_time_minutes: self.sleep_store.recent_wake_times(date, window)?,
        };

        // Strain for the date is whatever an earlier run stored; on the
        // first morning run the supplement simply starts from zero
        let today_strain = metric.strain_score.unwrap_or(0.0);

        let analysis = self.sleep_engine.analyze(
            sessions,
            profile.sleep_baseline_hours,
            today_strain,
            &past_hours,
            &past_needs,
            &consistency_input,
        );

        for session in analysis.main_sleep.iter().chain(analysis.naps.iter()) {
            self.sleep_store.store_session(date, session)?;
        }

        metric.sleep_duration_hours = Some(analysis.total_sleep_hours);
        metric.sleep_need_hours = Some(analysis.sleep_need_hours);
        metric.sleep_debt_hours = Some(analysis.sleep_debt_hours);
        metric.sleep_performance = Some(analysis.sleep_performance);
        metric.sleep_consistency = Some(analysis.sleep_consistency);
        metric.sleep_efficiency = Some(analysis.sleep_efficiency);
        metric.restorative_sleep_pct = Some(analysis.restorative_sleep_pct);
        metric.sleep_quality = Some(analysis.sleep_score);

        debug!(
            %date,
            hours = analysis.total_sleep_hours,
            performance = analysis.sleep_performance,
            "sleep analyzed"
        );
        Ok(StepStatus::Completed)
    }

    /// Step 3: overnight vitals, HRV, and the recovery composite
    fn compute_recovery(&self, date: NaiveDate, metric: &mut DailyMetric) -> Result<StepStatus> {
        let overnight_start =
            day_start_millis(date - Duration::days(1)) + OVERNIGHT_START_HOUR * HOUR_MILLIS;
        let overnight_end = day_start_millis(date) + OVERNIGHT_END_HOUR * HOUR_MILLIS;

        // Each vitals read is tolerated individually so one missing sensor
        // does not block the composite
        let resting_hr = self.tolerate("resting_heart_rate", self.provider.resting_heart_rate(date));
        let resp_rate = self.tolerate("respiratory_rate", self.provider.respiratory_rate(date));
        let spo2 = self.tolerate("spo2", self.provider.spo2(date));
        let skin_temp = self.tolerate(
            "skin_temperature_deviation",
            self.provider.skin_temperature_deviation(date),
        );

        let hrv_samples = match self.provider.hrv_samples(overnight_start, overnight_end) {
            Ok(samples) => samples,
            Err(e) => {
                warn!(error = %e, "overnight HRV fetch failed");
                Vec::new()
            }
        };
        let rmssd_values: Vec<f64> = hrv_samples.iter().filter_map(|s| s.rmssd_ms).collect();
        let sdnn_values: Vec<f64> = hrv_samples.iter().filter_map(|s| s.sdnn_ms).collect();
        let rmssd = (!rmssd_values.is_empty()).then(|| mean(&rmssd_values));
        let sdnn = (!sdnn_values.is_empty()).then(|| mean(&sdnn_values));
        let hrv_result = hrv::best_hrv(rmssd, sdnn);

        let baselines = RecoveryBaselines {
            hrv: self.stored_baseline(BaselineMetricType::Hrv)?,
            resting_heart_rate: self.stored_baseline(BaselineMetricType::RestingHeartRate)?,
            sleep_performance: self.stored_baseline(BaselineMetricType::SleepPerformance)?,
            // Only population baselines exist for the remaining vitals
            respiratory_rate: None,
            spo2: None,
            skin_temperature: None,
        };

        let input = RecoveryInput {
            hrv: hrv_result.effective(),
            resting_heart_rate: resting_hr,
            sleep_performance: metric.sleep_performance,
            respiratory_rate: resp_rate,
            spo2,
            skin_temperature_deviation: skin_temp,
        };

        let result = self.recovery_engine.compute_recovery(&input, &baselines);
        let insight = self.recovery_engine.generate_insight(&result, &input, &baselines);

        metric.hrv_rmssd = rmssd;
        metric.hrv_sdnn = sdnn;
        metric.resting_heart_rate = resting_hr;
        metric.respiratory_rate = resp_rate;
        metric.spo2 = spo2;
        metric.skin_temperature_deviation = skin_temp;
        metric.recovery_score = Some(result.score);
        metric.recovery_zone = Some(result.zone);
        metric.recovery_insight = Some(insight);

        debug!(
            %date,
            score = result.score,
            zone = result.zone.as_str(),
            contributors = result.contributor_count,
            "recovery computed"
        );
        Ok(StepStatus::Completed)
    }

    /// Step 4: score the date's workouts and accumulate daily strain
    fn compute_strain(
        &self,
        date: NaiveDate,
        profile: &UserProfile,
        metric: &mut DailyMetric,
    ) -> Result<StepStatus> {
        let start = day_start_millis(date);
        let end = day_start_millis(date + Duration::days(1));
        let sessions = self.provider.exercise_sessions(start, end)?;

        let engine = StrainEngine::new(profile.estimated_max_hr(date), &self.config);
        let mut strains = Vec::with_capacity(sessions.len());

        for session in &sessions {
            if let Some(stored) = self.workouts.workout_by_external_uuid(&session.external_uuid)? {
                debug!(uuid = %session.external_uuid, "workout already scored, reusing");
                strains.push(stored.strain);
                continue;
            }

            let record = self.score_workout(date, profile, &engine, session)?;
            strains.push(record.strain);
            self.workouts.store_workout(&record)?;
        }

        metric.strain_score = Some(engine.daily_strain(&strains, 0.0));
        metric.peak_workout_strain = strains.iter().copied().reduce(f64::max);

        debug!(
            %date,
            workouts = sessions.len(),
            strain = metric.strain_score,
            "strain computed"
        );
        Ok(StepStatus::Completed)
    }

    fn score_workout(
        &self,
        date: NaiveDate,
        profile: &UserProfile,
        engine: &StrainEngine,
        session: &ExerciseSession,
    ) -> Result<WorkoutRecord> {
        let samples = self
            .provider
            .heart_rate_samples(session.start_millis, session.end_millis)?;
        let strain = engine.compute_workout_strain(&samples);

        let muscular = if muscular_load::is_strength_workout(&session.exercise_type) {
            session
                .average_heart_rate
                .zip(session.max_heart_rate)
                .map(|(avg_hr, peak_hr)| {
                    muscular_load::compute_load(
                        &session.exercise_type,
                        session.duration_minutes,
                        avg_hr,
                        peak_hr,
                        profile.estimated_max_hr(date) as f64,
                        session.rpe,
                    )
                    .load
                })
        } else {
            None
        };

        Ok(WorkoutRecord {
            id: Uuid::new_v4(),
            external_uuid: Some(session.external_uuid.clone()),
            date,
            workout_type: session.exercise_type.clone(),
            name: session.title.clone(),
            start_millis: session.start_millis,
            end_millis: session.end_millis,
            duration_minutes: session.duration_minutes,
            strain: strain.strain,
            average_heart_rate: session.average_heart_rate,
            max_heart_rate: session.max_heart_rate,
            active_calories: session.active_calories,
            zone_minutes: strain.zone_minutes,
            muscular_load: muscular,
        })
    }

    /// Step 5: steps, calories, VO2max, and lean body mass, each tolerated
    /// individually
    fn compute_secondary(
        &self,
        date: NaiveDate,
        profile: &UserProfile,
        metric: &mut DailyMetric,
    ) -> Result<StepStatus> {
        self.refresh_activity(date, metric)?;

        metric.vo2_max = self
            .tolerate("vo2_max", self.provider.vo2_max(date))
            .or(metric.vo2_max);

        let body_fat = self
            .tolerate("body_fat_percentage", self.provider.body_fat_percentage(date))
            .or(profile.body_fat_pct);
        metric.lean_body_mass_pct = body_fat.map(|pct| 100.0 - pct);

        Ok(StepStatus::Completed)
    }

    /// Steps and active calories, shared by the full run and quick refresh
    fn refresh_activity(&self, date: NaiveDate, metric: &mut DailyMetric) -> Result<StepStatus> {
        metric.steps = self
            .tolerate("steps", self.provider.steps(date))
            .or(metric.steps);
        metric.active_calories = self
            .tolerate("active_calories", self.provider.active_calories(date))
            .or(metric.active_calories);
        Ok(StepStatus::Completed)
    }

    /// Step 6: stress baseline from prior days, then the intraday timeline
    fn compute_stress(&self, date: NaiveDate, metric: &mut DailyMetric) -> Result<StepStatus> {
        let window_start = date - Duration::days(STRESS_BASELINE_WINDOW_DAYS as i64);
        let prior = self
            .metrics
            .metrics_in_range(window_start, date - Duration::days(1))?;
        let baselines = self.stress_engine.compute_baselines(&prior);

        let start = day_start_millis(date);
        let end = day_start_millis(date + Duration::days(1));
        let samples = self.provider.heart_rate_samples(start, end)?;

        let timeline = self.stress_engine.stress_timeline(&samples, &baselines);
        metric.stress_average = self.stress_engine.daily_average(&timeline);

        Ok(StepStatus::Completed)
    }

    fn stored_baseline(
        &self,
        metric_type: BaselineMetricType,
    ) -> Result<Option<BaselineResult>> {
        Ok(self
            .baselines
            .baseline_for(metric_type)?
            .map(|b| b.result()))
    }

    fn tolerate<T>(&self, what: &str, result: ProviderResult<Option<T>>) -> Option<T> {
        match result {
            Ok(value) => value,
            Err(e) => {
                warn!(what, error = %e, "vitals fetch failed");
                None
            }
        }
    }
}
