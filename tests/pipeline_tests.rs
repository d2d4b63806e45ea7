//! End-to-end pipeline tests over the SQLite store and a scripted provider
//!
//! These drive `MetricPipeline` the way a host app does: seed the platform
//! side with raw samples, trigger a run, then read the daily rows back out
//! through the repositories and check every derived score landed.

use std::collections::{HashMap, HashSet};
use std::sync::{mpsc, Mutex};
use std::thread;

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use vitalrs::config::ScoringConfig;
use vitalrs::models::{
    DailyMetric, ExerciseSession, HeartRateSample, HrvSample, UserProfile, WorkoutRecord,
};
use vitalrs::pipeline::{MetricPipeline, PipelineStep, RunOutcome, StepStatus};
use vitalrs::planner::SleepGoal;
use vitalrs::provider::{HealthDataProvider, ProviderError, ProviderResult};
use vitalrs::recovery::RecoveryZone;
use vitalrs::repository::{
    BaselineRepository, DailyMetricRepository, SleepRepository, UserProfileRepository,
    WorkoutRepository,
};
use vitalrs::baseline::BaselineMetricType;
use vitalrs::sleep::{SleepStage, SleepStageSegment};
use vitalrs::storage::Database;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn millis(day: NaiveDate, hour: u32, minute: u32) -> i64 {
    day.and_hms_opt(hour, minute, 0)
        .unwrap()
        .and_utc()
        .timestamp_millis()
}

fn test_profile() -> UserProfile {
    let mut profile = UserProfile::new("Jordan");
    profile.max_heart_rate = Some(190);
    profile.body_fat_pct = Some(21.0);
    profile
}

/// Scripted health store; range queries filter the seeded samples and any
/// method can be made to fail by name.
#[derive(Default)]
struct FakeProvider {
    resting_hr: HashMap<NaiveDate, f64>,
    respiratory_rate: HashMap<NaiveDate, f64>,
    spo2: HashMap<NaiveDate, f64>,
    skin_temp: HashMap<NaiveDate, f64>,
    steps: HashMap<NaiveDate, u64>,
    active_calories: HashMap<NaiveDate, f64>,
    vo2_max: HashMap<NaiveDate, f64>,
    body_fat: HashMap<NaiveDate, f64>,
    hrv: Vec<HrvSample>,
    heart_rate: Vec<HeartRateSample>,
    segments: Vec<SleepStageSegment>,
    sessions: Vec<ExerciseSession>,
    failing: HashSet<&'static str>,
}

impl FakeProvider {
    fn check(&self, what: &'static str) -> ProviderResult<()> {
        if self.failing.contains(what) {
            return Err(ProviderError::Unavailable {
                what: what.to_string(),
            });
        }
        Ok(())
    }
}

impl HealthDataProvider for FakeProvider {
    fn resting_heart_rate(&self, date: NaiveDate) -> ProviderResult<Option<f64>> {
        self.check("resting_heart_rate")?;
        Ok(self.resting_hr.get(&date).copied())
    }

    fn respiratory_rate(&self, date: NaiveDate) -> ProviderResult<Option<f64>> {
        self.check("respiratory_rate")?;
        Ok(self.respiratory_rate.get(&date).copied())
    }

    fn spo2(&self, date: NaiveDate) -> ProviderResult<Option<f64>> {
        self.check("spo2")?;
        Ok(self.spo2.get(&date).copied())
    }

    fn skin_temperature_deviation(&self, date: NaiveDate) -> ProviderResult<Option<f64>> {
        self.check("skin_temperature_deviation")?;
        Ok(self.skin_temp.get(&date).copied())
    }

    fn hrv_samples(&self, start: i64, end: i64) -> ProviderResult<Vec<HrvSample>> {
        self.check("hrv_samples")?;
        Ok(self
            .hrv
            .iter()
            .copied()
            .filter(|s| s.timestamp_millis >= start && s.timestamp_millis < end)
            .collect())
    }

    fn heart_rate_samples(&self, start: i64, end: i64) -> ProviderResult<Vec<HeartRateSample>> {
        self.check("heart_rate_samples")?;
        Ok(self
            .heart_rate
            .iter()
            .copied()
            .filter(|s| s.timestamp_millis >= start && s.timestamp_millis < end)
            .collect())
    }

    fn sleep_segments(&self, start: i64, end: i64) -> ProviderResult<Vec<SleepStageSegment>> {
        self.check("sleep_segments")?;
        Ok(self
            .segments
            .iter()
            .copied()
            .filter(|s| s.start_millis < end && s.end_millis > start)
            .collect())
    }

    fn exercise_sessions(&self, start: i64, end: i64) -> ProviderResult<Vec<ExerciseSession>> {
        self.check("exercise_sessions")?;
        Ok(self
            .sessions
            .iter()
            .cloned()
            .filter(|s| s.start_millis >= start && s.start_millis < end)
            .collect())
    }

    fn steps(&self, date: NaiveDate) -> ProviderResult<Option<u64>> {
        self.check("steps")?;
        Ok(self.steps.get(&date).copied())
    }

    fn active_calories(&self, date: NaiveDate) -> ProviderResult<Option<f64>> {
        self.check("active_calories")?;
        Ok(self.active_calories.get(&date).copied())
    }

    fn vo2_max(&self, date: NaiveDate) -> ProviderResult<Option<f64>> {
        self.check("vo2_max")?;
        Ok(self.vo2_max.get(&date).copied())
    }

    fn body_fat_percentage(&self, date: NaiveDate) -> ProviderResult<Option<f64>> {
        self.check("body_fat_percentage")?;
        Ok(self.body_fat.get(&date).copied())
    }
}

/// One staged night ending the morning of `day`: in bed 22:30, asleep
/// 22:45, one mid-night awakening, up at 06:30. 455 minutes asleep out of
/// 480 in bed.
fn seed_night(provider: &mut FakeProvider, day: NaiveDate) {
    let prev = day - Duration::days(1);
    provider.segments.extend([
        SleepStageSegment::new(SleepStage::InBed, millis(prev, 22, 30), millis(prev, 22, 45)),
        SleepStageSegment::new(SleepStage::Light, millis(prev, 22, 45), millis(day, 1, 15)),
        SleepStageSegment::new(SleepStage::Deep, millis(day, 1, 15), millis(day, 2, 45)),
        SleepStageSegment::new(SleepStage::Rem, millis(day, 2, 45), millis(day, 3, 45)),
        SleepStageSegment::new(SleepStage::Awake, millis(day, 3, 45), millis(day, 3, 55)),
        SleepStageSegment::new(SleepStage::Light, millis(day, 3, 55), millis(day, 6, 30)),
    ]);

    for (hour, rmssd) in [(1, 62.0), (2, 66.0), (3, 64.0), (4, 68.0)] {
        provider.hrv.push(HrvSample {
            timestamp_millis: millis(day, hour, 0),
            rmssd_ms: Some(rmssd),
            sdnn_ms: None,
        });
    }
    provider.resting_hr.insert(day, 52.0);
    provider.respiratory_rate.insert(day, 14.2);
    provider.spo2.insert(day, 97.5);
}

fn seed_workout(provider: &mut FakeProvider, day: NaiveDate, uuid: &str) {
    let start = millis(day, 10, 0);
    provider.sessions.push(ExerciseSession {
        external_uuid: uuid.to_string(),
        exercise_type: "running".to_string(),
        title: Some("Morning run".to_string()),
        start_millis: start,
        end_millis: millis(day, 11, 0),
        duration_minutes: 60.0,
        active_calories: Some(420.0),
        average_heart_rate: Some(152.0),
        max_heart_rate: Some(171.0),
        rpe: None,
    });
    for i in 0..60 {
        provider
            .heart_rate
            .push(HeartRateSample::new(start + i * 60_000, 152.0));
    }
}

/// Seven prior days of stored metrics so baselines and debt have history.
/// Every day slept 7.0h against a 7.5h need.
fn seed_history(db: &Database, day: NaiveDate) {
    let hrv = [58.0, 60.0, 62.0, 59.0, 61.0, 63.0, 60.0];
    let rhr = [53.0, 52.0, 54.0, 53.0, 55.0, 52.0, 53.0];
    let strain = [10.0, 12.0, 8.0, 14.0, 11.0, 9.0, 13.0];
    let perf = [90.0, 88.0, 92.0, 85.0, 95.0, 91.0, 89.0];

    for i in 0..7usize {
        let past = day - Duration::days(7 - i as i64);
        let mut metric = DailyMetric::new(past);
        metric.hrv_rmssd = Some(hrv[i]);
        metric.resting_heart_rate = Some(rhr[i]);
        metric.strain_score = Some(strain[i]);
        metric.sleep_performance = Some(perf[i]);
        metric.sleep_duration_hours = Some(7.0);
        metric.sleep_need_hours = Some(7.5);
        metric.is_computed = true;
        metric.computed_at = Some(Utc::now());
        db.upsert_metric(&metric).unwrap();
    }
}

fn pipeline<'a>(
    config: &ScoringConfig,
    provider: &'a dyn HealthDataProvider,
    db: &'a Database,
) -> MetricPipeline<'a> {
    MetricPipeline::new(config, provider, db, db, db, db, db)
}

#[test]
fn test_full_day_run_writes_every_score() {
    let day = date(2025, 3, 10);
    let db = Database::in_memory().unwrap();
    db.store_profile(&test_profile()).unwrap();
    seed_history(&db, day);

    let mut provider = FakeProvider::default();
    seed_night(&mut provider, day);
    seed_workout(&mut provider, day, "w-1");
    provider.steps.insert(day, 8400);
    provider.active_calories.insert(day, 640.0);
    provider.vo2_max.insert(day, 47.5);
    provider.body_fat.insert(day, 18.5);

    let config = ScoringConfig::bundled().unwrap();
    let pipeline = pipeline(&config, &provider, &db);

    let outcome = pipeline.run_for_date(day).unwrap();
    let report = match outcome {
        RunOutcome::Completed(report) => report,
        RunOutcome::AlreadyRunning => panic!("nothing else is running"),
    };
    assert!(report.all_completed(), "failed steps: {:?}", report.failed_steps());

    let metric = db.metric_for_date(day).unwrap().unwrap();
    assert!(metric.is_computed);
    assert!(metric.computed_at.is_some());

    // Sleep: 455 min slept, need 7.5 + 0.7 debt repayment (3.5h debt at 20%)
    assert!((metric.sleep_duration_hours.unwrap() - 455.0 / 60.0).abs() < 1e-9);
    assert!((metric.sleep_need_hours.unwrap() - 8.2).abs() < 1e-9);
    assert!((metric.sleep_debt_hours.unwrap() - 3.5).abs() < 1e-9);
    let performance = metric.sleep_performance.unwrap();
    assert!((92.0..93.0).contains(&performance), "performance {performance}");
    assert_eq!(metric.sleep_consistency, Some(100.0));
    let efficiency = metric.sleep_efficiency.unwrap();
    assert!((94.0..95.0).contains(&efficiency), "efficiency {efficiency}");
    let restorative = metric.restorative_sleep_pct.unwrap();
    assert!((32.0..34.0).contains(&restorative), "restorative {restorative}");
    assert!(metric.sleep_quality.unwrap() > 0.0);

    // Recovery: every overnight signal was good, so the day reads Green
    assert_eq!(metric.hrv_rmssd, Some(65.0));
    assert_eq!(metric.resting_heart_rate, Some(52.0));
    assert_eq!(metric.respiratory_rate, Some(14.2));
    assert_eq!(metric.spo2, Some(97.5));
    let recovery = metric.recovery_score.unwrap();
    assert!((0.0..=100.0).contains(&recovery));
    assert_eq!(metric.recovery_zone, Some(RecoveryZone::Green));
    assert!(metric.recovery_insight.unwrap().starts_with("Your Recovery is"));

    // Strain: one hour at 152 bpm against a 190 max
    let strain = metric.strain_score.unwrap();
    assert!((5.0..=21.0).contains(&strain), "strain {strain}");
    assert_eq!(metric.peak_workout_strain, Some(strain));

    // Secondary metrics straight from the provider
    assert_eq!(metric.steps, Some(8400));
    assert_eq!(metric.active_calories, Some(640.0));
    assert_eq!(metric.vo2_max, Some(47.5));
    assert_eq!(metric.lean_body_mass_pct, Some(81.5));

    // Stress: seven prior resting HR days give a valid baseline, and an
    // hour at 152 bpm sits far above it
    let stress = metric.stress_average.unwrap();
    assert!((5.0..=10.0).contains(&stress), "stress {stress}");

    // Baselines were recomputed from the seeded history
    let hrv_baseline = db.baseline_for(BaselineMetricType::Hrv).unwrap().unwrap();
    assert_eq!(hrv_baseline.sample_count, 7);
    assert!((hrv_baseline.mean - 60.43).abs() < 0.01);
    assert!(db
        .baseline_for(BaselineMetricType::SleepPerformance)
        .unwrap()
        .is_some());

    // The workout and the night both landed in the store
    let stored = db.workout_by_external_uuid("w-1").unwrap().unwrap();
    assert!(stored.strain > 0.0);
    let zone_total: f64 = stored.zone_minutes.iter().sum();
    assert!((55.0..=65.0).contains(&zone_total), "zone minutes {zone_total}");
    assert_eq!(db.sessions_for_date(day).unwrap().len(), 1);
}

#[test]
fn test_failed_sleep_fetch_does_not_take_down_the_run() {
    let day = date(2025, 3, 10);
    let db = Database::in_memory().unwrap();
    db.store_profile(&test_profile()).unwrap();

    let mut provider = FakeProvider::default();
    seed_night(&mut provider, day);
    seed_workout(&mut provider, day, "w-1");
    provider.failing.insert("sleep_segments");

    let config = ScoringConfig::bundled().unwrap();
    let pipeline = pipeline(&config, &provider, &db);

    let outcome = pipeline.run_for_date(day).unwrap();
    let report = match outcome {
        RunOutcome::Completed(report) => report,
        RunOutcome::AlreadyRunning => panic!("nothing else is running"),
    };

    assert!(!report.all_completed());
    match report.status(PipelineStep::Sleep) {
        Some(StepStatus::Failed(message)) => assert!(message.contains("unavailable")),
        other => panic!("expected sleep failure, got {:?}", other),
    }
    assert_eq!(report.status(PipelineStep::Strain), Some(&StepStatus::Completed));
    assert_eq!(
        report.status(PipelineStep::Recovery),
        Some(&StepStatus::Completed)
    );

    // The day still finished: other scores landed and the flag is set
    let metric = db.metric_for_date(day).unwrap().unwrap();
    assert!(metric.is_computed);
    assert!(metric.sleep_performance.is_none());
    assert!(metric.strain_score.is_some());
    assert!(metric.recovery_score.is_some());
}

#[test]
fn test_failed_heart_rate_fetch_fails_strain_and_stress_only() {
    let day = date(2025, 3, 10);
    let db = Database::in_memory().unwrap();
    db.store_profile(&test_profile()).unwrap();

    let mut provider = FakeProvider::default();
    seed_night(&mut provider, day);
    seed_workout(&mut provider, day, "w-1");
    provider.failing.insert("heart_rate_samples");

    let config = ScoringConfig::bundled().unwrap();
    let pipeline = pipeline(&config, &provider, &db);

    let report = match pipeline.run_for_date(day).unwrap() {
        RunOutcome::Completed(report) => report,
        RunOutcome::AlreadyRunning => panic!("nothing else is running"),
    };

    assert!(matches!(
        report.status(PipelineStep::Strain),
        Some(StepStatus::Failed(_))
    ));
    assert!(matches!(
        report.status(PipelineStep::Stress),
        Some(StepStatus::Failed(_))
    ));
    assert_eq!(report.status(PipelineStep::Sleep), Some(&StepStatus::Completed));
    assert_eq!(
        report.status(PipelineStep::Recovery),
        Some(&StepStatus::Completed)
    );

    let metric = db.metric_for_date(day).unwrap().unwrap();
    assert!(metric.strain_score.is_none());
    assert!(metric.sleep_performance.is_some());
}

#[test]
fn test_run_without_profile_errors() {
    let day = date(2025, 3, 10);
    let db = Database::in_memory().unwrap();
    let provider = FakeProvider::default();
    let config = ScoringConfig::bundled().unwrap();
    let pipeline = pipeline(&config, &provider, &db);

    let err = pipeline.run_for_date(day).unwrap_err();
    assert!(err.to_string().contains("no user profile"));
    assert!(db.metric_for_date(day).unwrap().is_none());
}

#[test]
fn test_trigger_while_running_is_rejected() {
    /// Delegates to a scripted provider but blocks inside the sleep fetch
    /// until the test releases it
    struct GatedProvider {
        inner: FakeProvider,
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl HealthDataProvider for GatedProvider {
        fn resting_heart_rate(&self, date: NaiveDate) -> ProviderResult<Option<f64>> {
            self.inner.resting_heart_rate(date)
        }
        fn respiratory_rate(&self, date: NaiveDate) -> ProviderResult<Option<f64>> {
            self.inner.respiratory_rate(date)
        }
        fn spo2(&self, date: NaiveDate) -> ProviderResult<Option<f64>> {
            self.inner.spo2(date)
        }
        fn skin_temperature_deviation(&self, date: NaiveDate) -> ProviderResult<Option<f64>> {
            self.inner.skin_temperature_deviation(date)
        }
        fn hrv_samples(&self, start: i64, end: i64) -> ProviderResult<Vec<HrvSample>> {
            self.inner.hrv_samples(start, end)
        }
        fn heart_rate_samples(&self, start: i64, end: i64) -> ProviderResult<Vec<HeartRateSample>> {
            self.inner.heart_rate_samples(start, end)
        }
        fn sleep_segments(&self, start: i64, end: i64) -> ProviderResult<Vec<SleepStageSegment>> {
            self.entered.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
            self.inner.sleep_segments(start, end)
        }
        fn exercise_sessions(&self, start: i64, end: i64) -> ProviderResult<Vec<ExerciseSession>> {
            self.inner.exercise_sessions(start, end)
        }
        fn steps(&self, date: NaiveDate) -> ProviderResult<Option<u64>> {
            self.inner.steps(date)
        }
        fn active_calories(&self, date: NaiveDate) -> ProviderResult<Option<f64>> {
            self.inner.active_calories(date)
        }
        fn vo2_max(&self, date: NaiveDate) -> ProviderResult<Option<f64>> {
            self.inner.vo2_max(date)
        }
        fn body_fat_percentage(&self, date: NaiveDate) -> ProviderResult<Option<f64>> {
            self.inner.body_fat_percentage(date)
        }
    }

    let day = date(2025, 3, 10);
    let db = Database::in_memory().unwrap();
    db.store_profile(&test_profile()).unwrap();

    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let mut inner = FakeProvider::default();
    seed_night(&mut inner, day);
    let provider = GatedProvider {
        inner,
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    };

    let config = ScoringConfig::bundled().unwrap();
    let pipeline = pipeline(&config, &provider, &db);

    thread::scope(|scope| {
        let first = scope.spawn(|| pipeline.run_for_date(day));

        // Wait until the first run is inside its sleep step, then trigger
        entered_rx.recv().unwrap();
        let second = pipeline.quick_refresh(day).unwrap();
        assert_eq!(second, RunOutcome::AlreadyRunning);

        release_tx.send(()).unwrap();
        let outcome = first.join().unwrap().unwrap();
        assert!(matches!(outcome, RunOutcome::Completed(_)));
    });

    // The guard resets once the first run finishes
    let third = pipeline.quick_refresh(day).unwrap();
    assert!(matches!(third, RunOutcome::Completed(_)));
}

#[test]
fn test_backfill_skips_computed_days_but_redoes_the_last() {
    let d1 = date(2025, 3, 10);
    let d2 = date(2025, 3, 11);
    let d3 = date(2025, 3, 12);

    let db = Database::in_memory().unwrap();
    db.store_profile(&test_profile()).unwrap();

    let mut provider = FakeProvider::default();
    for day in [d1, d2, d3] {
        seed_night(&mut provider, day);
    }

    let config = ScoringConfig::bundled().unwrap();
    let pipeline = pipeline(&config, &provider, &db);

    // d1 was computed on an earlier trigger
    match pipeline.run_for_date(d1).unwrap() {
        RunOutcome::Completed(_) => {}
        RunOutcome::AlreadyRunning => panic!("nothing else is running"),
    }
    let d1_computed_at = db.metric_for_date(d1).unwrap().unwrap().computed_at;

    let outcome = pipeline.backfill(&[d3, d1, d2]).unwrap();
    let reports = match outcome {
        RunOutcome::Completed(reports) => reports,
        RunOutcome::AlreadyRunning => panic!("nothing else is running"),
    };

    // d1 skipped, d2 computed, d3 recomputed as the final day
    let dates: Vec<NaiveDate> = reports.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![d2, d3]);

    assert_eq!(
        db.metric_for_date(d1).unwrap().unwrap().computed_at,
        d1_computed_at
    );
    for day in [d2, d3] {
        let metric = db.metric_for_date(day).unwrap().unwrap();
        assert!(metric.is_computed);
        assert!(metric.sleep_duration_hours.is_some());
    }

    // Each night was attributed to the morning it ended on
    assert_eq!(db.sessions_for_date(d2).unwrap().len(), 1);
    assert_eq!(db.sessions_for_date(d3).unwrap().len(), 1);
}

#[test]
fn test_oldest_first_recompute_grows_baselines_from_prior_days_only() {
    let days: Vec<NaiveDate> = (10..15).map(|d| date(2025, 3, d)).collect();

    let db = Database::in_memory().unwrap();
    db.store_profile(&test_profile()).unwrap();

    let mut provider = FakeProvider::default();
    for &day in &days {
        seed_night(&mut provider, day);
    }

    let config = ScoringConfig::bundled().unwrap();
    let pipeline = pipeline(&config, &provider, &db);

    // Computing oldest first, each day's baseline window sees only the
    // days already computed before it, never its own readings
    let mut counts = Vec::new();
    for &day in &days {
        match pipeline.run_for_date(day).unwrap() {
            RunOutcome::Completed(_) => {}
            RunOutcome::AlreadyRunning => panic!("nothing else is running"),
        }
        let count = db
            .baseline_for(BaselineMetricType::Hrv)
            .unwrap()
            .map(|b| b.sample_count)
            .unwrap_or(0);
        counts.push(count);
    }

    // No baseline until three prior days exist, then one more per day
    assert_eq!(counts, vec![0, 0, 0, 3, 4]);

    let final_baseline = db.baseline_for(BaselineMetricType::Hrv).unwrap().unwrap();
    assert_eq!(final_baseline.window_end, days[4]);
    // Every seeded night averages the same overnight RMSSD
    assert_eq!(final_baseline.mean, 65.0);
}

#[test]
fn test_quick_refresh_only_touches_activity_and_strain() {
    let day = date(2025, 3, 10);
    let db = Database::in_memory().unwrap();
    db.store_profile(&test_profile()).unwrap();

    let mut seeded = DailyMetric::new(day);
    seeded.recovery_score = Some(88.0);
    seeded.recovery_zone = Some(RecoveryZone::Green);
    seeded.sleep_performance = Some(91.0);
    seeded.is_computed = true;
    seeded.computed_at = Some(Utc::now());
    db.upsert_metric(&seeded).unwrap();

    let mut provider = FakeProvider::default();
    seed_workout(&mut provider, day, "w-1");
    provider.steps.insert(day, 4200);
    provider.active_calories.insert(day, 310.0);
    provider.vo2_max.insert(day, 55.0);

    let config = ScoringConfig::bundled().unwrap();
    let pipeline = pipeline(&config, &provider, &db);

    let report = match pipeline.quick_refresh(day).unwrap() {
        RunOutcome::Completed(report) => report,
        RunOutcome::AlreadyRunning => panic!("nothing else is running"),
    };
    assert_eq!(report.status(PipelineStep::Strain), Some(&StepStatus::Completed));
    assert_eq!(report.status(PipelineStep::Sleep), Some(&StepStatus::Skipped));
    assert_eq!(report.status(PipelineStep::Recovery), Some(&StepStatus::Skipped));
    assert_eq!(report.status(PipelineStep::Stress), Some(&StepStatus::Skipped));

    let metric = db.metric_for_date(day).unwrap().unwrap();
    assert!(metric.strain_score.unwrap() > 0.0);
    assert_eq!(metric.steps, Some(4200));
    assert_eq!(metric.active_calories, Some(310.0));

    // Everything outside strain and activity is untouched
    assert_eq!(metric.recovery_score, Some(88.0));
    assert_eq!(metric.sleep_performance, Some(91.0));
    assert!(metric.vo2_max.is_none());
    assert!(metric.is_computed);
    assert_eq!(metric.computed_at, seeded.computed_at);
}

#[test]
fn test_rescoring_reuses_stored_workout_strain() {
    let day = date(2025, 3, 10);
    let db = Database::in_memory().unwrap();
    db.store_profile(&test_profile()).unwrap();

    let stored = WorkoutRecord {
        id: Uuid::new_v4(),
        external_uuid: Some("w-1".to_string()),
        date: day,
        workout_type: "running".to_string(),
        name: Some("Morning run".to_string()),
        start_millis: millis(day, 10, 0),
        end_millis: millis(day, 11, 0),
        duration_minutes: 60.0,
        strain: 15.5,
        average_heart_rate: Some(152.0),
        max_heart_rate: Some(171.0),
        active_calories: Some(420.0),
        zone_minutes: [5.0, 15.0, 25.0, 15.0, 0.0],
        muscular_load: None,
    };
    db.store_workout(&stored).unwrap();

    // The provider reports the same session but no heart-rate samples, so
    // a re-score from raw data would come out near zero
    let mut provider = FakeProvider::default();
    provider.sessions.push(ExerciseSession {
        external_uuid: "w-1".to_string(),
        exercise_type: "running".to_string(),
        title: Some("Morning run".to_string()),
        start_millis: millis(day, 10, 0),
        end_millis: millis(day, 11, 0),
        duration_minutes: 60.0,
        active_calories: Some(420.0),
        average_heart_rate: Some(152.0),
        max_heart_rate: Some(171.0),
        rpe: None,
    });

    let config = ScoringConfig::bundled().unwrap();
    let pipeline = pipeline(&config, &provider, &db);
    pipeline.quick_refresh(day).unwrap();

    let metric = db.metric_for_date(day).unwrap().unwrap();
    assert_eq!(metric.strain_score, Some(15.5));
    assert_eq!(metric.peak_workout_strain, Some(15.5));

    let workouts = db.workouts_for_date(day).unwrap();
    assert_eq!(workouts.len(), 1);
    assert_eq!(workouts[0].id, stored.id);
    assert_eq!(workouts[0].strain, 15.5);
}

#[test]
fn test_plan_sleep_from_a_computed_day() {
    let day = date(2025, 3, 10);
    let db = Database::in_memory().unwrap();
    db.store_profile(&test_profile()).unwrap();

    let mut provider = FakeProvider::default();
    seed_night(&mut provider, day);

    let config = ScoringConfig::bundled().unwrap();
    let pipeline = pipeline(&config, &provider, &db);
    pipeline.run_for_date(day).unwrap();

    let plan = pipeline.plan_sleep(day, SleepGoal::Peak).unwrap();

    // No history: need is the 7.5h baseline, wake defaults to 07:00, and
    // tonight's 15 minute onset latency is learned from the stored session,
    // so bedtime works out to 23:15
    assert_eq!(plan.goal, SleepGoal::Peak);
    assert_eq!(plan.sleep_need_hours, 7.5);
    assert_eq!(plan.required_sleep_duration, 7.5);
    assert_eq!(plan.expected_wake_time_millis, millis(day + Duration::days(1), 7, 0));
    assert_eq!(plan.recommended_bedtime_millis, millis(day, 23, 15));
    assert_eq!(plan.breakdown.baseline_need, 7.5);
    assert_eq!(plan.breakdown.strain_supplement, 0.0);
}

#[test]
fn test_plan_sleep_without_metrics_is_an_error() {
    let day = date(2025, 3, 10);
    let db = Database::in_memory().unwrap();
    db.store_profile(&test_profile()).unwrap();
    let provider = FakeProvider::default();
    let config = ScoringConfig::bundled().unwrap();
    let pipeline = pipeline(&config, &provider, &db);

    let err = pipeline.plan_sleep(day, SleepGoal::Peak).unwrap_err();
    assert!(err.to_string().contains("insufficient data"));
}

#[test]
fn test_strain_target_follows_stored_recovery_zone() {
    let day = date(2025, 3, 10);
    let db = Database::in_memory().unwrap();
    db.store_profile(&test_profile()).unwrap();

    let mut metric = DailyMetric::new(day);
    metric.recovery_zone = Some(RecoveryZone::Red);
    db.upsert_metric(&metric).unwrap();

    let provider = FakeProvider::default();
    let config = ScoringConfig::bundled().unwrap();
    let pipeline = pipeline(&config, &provider, &db);

    let target = pipeline.strain_target_for(day).unwrap();
    assert!(target.max <= 8.0);

    let missing = pipeline.strain_target_for(day + Duration::days(1)).unwrap_err();
    assert!(missing.to_string().contains("no recovery zone"));
}
