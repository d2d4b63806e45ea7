//! SQLite-backed metric storage.
//!
//! One [`Database`] owns the connection and implements every repository
//! trait in [`crate::repository`], so a single handle can be lent to the
//! pipeline for all of its collaborators. Dates are stored as ISO-8601
//! text, stage timelines and zone-minute arrays as JSON columns.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{Duration, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

use crate::baseline::{BaselineMetric, BaselineMetricType};
use crate::models::{BiologicalSex, DailyMetric, UserProfile, WorkoutRecord};
use crate::recovery::RecoveryZone;
use crate::repository::{
    BaselineRepository, DailyMetricRepository, SleepRepository, UserProfileRepository,
    WorkoutRepository,
};
use crate::sleep::{minutes_since_midnight, SleepSessionData};

/// Storage error types
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Database connection and schema management
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Create or open a database at the specified path
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(&db_path)?;
        debug!(path = %db_path.as_ref().display(), "opened metric database");
        Self::from_connection(conn)
    }

    /// Open a private in-memory database, used by tests and previews
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        // WAL keeps readers unblocked while a pipeline run is writing
        conn.execute_batch("PRAGMA journal_mode=WAL")?;
        conn.execute("PRAGMA synchronous=NORMAL", [])?;
        conn.execute("PRAGMA foreign_keys=ON", [])?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// A poisoned lock only means another thread panicked mid-query; the
    /// connection itself is still usable.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Initialize database schema with tables and indexes
    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn();

        // One row per calendar date, the sink for pipeline runs
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS daily_metrics (
                date TEXT PRIMARY KEY,
                recovery_score REAL,
                recovery_zone TEXT,
                recovery_insight TEXT,
                strain_score REAL,
                peak_workout_strain REAL,
                sleep_duration_hours REAL,
                sleep_need_hours REAL,
                sleep_debt_hours REAL,
                sleep_performance REAL,
                sleep_consistency REAL,
                sleep_efficiency REAL,
                restorative_sleep_pct REAL,
                sleep_quality REAL,
                hrv_rmssd REAL,
                hrv_sdnn REAL,
                resting_heart_rate REAL,
                respiratory_rate REAL,
                spo2 REAL,
                skin_temperature_deviation REAL,
                steps INTEGER,
                active_calories REAL,
                vo2_max REAL,
                lean_body_mass_pct REAL,
                stress_average REAL,
                is_computed INTEGER NOT NULL DEFAULT 0,
                computed_at TEXT
            )
            "#,
            [],
        )?;

        // Assembled sleep sessions; bedtime and wake minutes are derived at
        // insert so consistency queries never re-parse stage timelines
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sleep_sessions (
                id BLOB PRIMARY KEY,
                date TEXT NOT NULL,
                start_millis INTEGER NOT NULL,
                end_millis INTEGER NOT NULL,
                total_sleep_minutes REAL NOT NULL,
                time_in_bed_minutes REAL NOT NULL,
                light_minutes REAL NOT NULL,
                deep_minutes REAL NOT NULL,
                rem_minutes REAL NOT NULL,
                awake_minutes REAL NOT NULL,
                awakenings INTEGER NOT NULL,
                sleep_onset_latency_minutes REAL,
                sleep_efficiency REAL NOT NULL,
                bedtime_minutes REAL NOT NULL,
                wake_time_minutes REAL NOT NULL,
                stages TEXT NOT NULL,
                UNIQUE (date, start_millis)
            )
            "#,
            [],
        )?;

        // Scored workouts with their strain contribution
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS workouts (
                id BLOB PRIMARY KEY,
                external_uuid TEXT UNIQUE,
                date TEXT NOT NULL,
                workout_type TEXT NOT NULL,
                name TEXT,
                start_millis INTEGER NOT NULL,
                end_millis INTEGER NOT NULL,
                duration_minutes REAL NOT NULL,
                strain REAL NOT NULL,
                average_heart_rate REAL,
                max_heart_rate REAL,
                active_calories REAL,
                zone_minutes TEXT NOT NULL,
                muscular_load REAL
            )
            "#,
            [],
        )?;

        // Latest rolling-baseline snapshot per metric type
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS baselines (
                metric_type TEXT PRIMARY KEY,
                mean REAL NOT NULL,
                standard_deviation REAL NOT NULL,
                sample_count INTEGER NOT NULL,
                window_start TEXT NOT NULL,
                window_end TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id BLOB PRIMARY KEY,
                display_name TEXT NOT NULL,
                date_of_birth TEXT,
                biological_sex TEXT NOT NULL,
                height_cm REAL,
                weight_kg REAL,
                body_fat_pct REAL,
                max_heart_rate INTEGER,
                sleep_baseline_hours REAL NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sleep_sessions_date ON sleep_sessions (date)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_workouts_date ON workouts (date)",
            [],
        )?;

        Ok(())
    }

    fn metric_from_row(row: &Row) -> rusqlite::Result<DailyMetric> {
        Ok(DailyMetric {
            date: row.get("date")?,
            recovery_score: row.get("recovery_score")?,
            recovery_zone: row
                .get::<_, Option<String>>("recovery_zone")?
                .as_deref()
                .and_then(RecoveryZone::parse),
            recovery_insight: row.get("recovery_insight")?,
            strain_score: row.get("strain_score")?,
            peak_workout_strain: row.get("peak_workout_strain")?,
            sleep_duration_hours: row.get("sleep_duration_hours")?,
            sleep_need_hours: row.get("sleep_need_hours")?,
            sleep_debt_hours: row.get("sleep_debt_hours")?,
            sleep_performance: row.get("sleep_performance")?,
            sleep_consistency: row.get("sleep_consistency")?,
            sleep_efficiency: row.get("sleep_efficiency")?,
            restorative_sleep_pct: row.get("restorative_sleep_pct")?,
            sleep_quality: row.get("sleep_quality")?,
            hrv_rmssd: row.get("hrv_rmssd")?,
            hrv_sdnn: row.get("hrv_sdnn")?,
            resting_heart_rate: row.get("resting_heart_rate")?,
            respiratory_rate: row.get("respiratory_rate")?,
            spo2: row.get("spo2")?,
            skin_temperature_deviation: row.get("skin_temperature_deviation")?,
            steps: row.get("steps")?,
            active_calories: row.get("active_calories")?,
            vo2_max: row.get("vo2_max")?,
            lean_body_mass_pct: row.get("lean_body_mass_pct")?,
            stress_average: row.get("stress_average")?,
            is_computed: row.get("is_computed")?,
            computed_at: row.get("computed_at")?,
        })
    }

    fn session_from_row(row: &Row) -> rusqlite::Result<SleepSessionData> {
        let stages_json: String = row.get("stages")?;
        let stages = serde_json::from_str(&stages_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(15, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(SleepSessionData {
            start_millis: row.get("start_millis")?,
            end_millis: row.get("end_millis")?,
            total_sleep_minutes: row.get("total_sleep_minutes")?,
            time_in_bed_minutes: row.get("time_in_bed_minutes")?,
            light_minutes: row.get("light_minutes")?,
            deep_minutes: row.get("deep_minutes")?,
            rem_minutes: row.get("rem_minutes")?,
            awake_minutes: row.get("awake_minutes")?,
            awakenings: row.get("awakenings")?,
            sleep_onset_latency_minutes: row.get("sleep_onset_latency_minutes")?,
            sleep_efficiency: row.get("sleep_efficiency")?,
            stages,
        })
    }

    fn workout_from_row(row: &Row) -> rusqlite::Result<WorkoutRecord> {
        let zones_json: String = row.get("zone_minutes")?;
        let zone_minutes = serde_json::from_str(&zones_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(12, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(WorkoutRecord {
            id: row.get("id")?,
            external_uuid: row.get("external_uuid")?,
            date: row.get("date")?,
            workout_type: row.get("workout_type")?,
            name: row.get("name")?,
            start_millis: row.get("start_millis")?,
            end_millis: row.get("end_millis")?,
            duration_minutes: row.get("duration_minutes")?,
            strain: row.get("strain")?,
            average_heart_rate: row.get("average_heart_rate")?,
            max_heart_rate: row.get("max_heart_rate")?,
            active_calories: row.get("active_calories")?,
            zone_minutes,
            muscular_load: row.get("muscular_load")?,
        })
    }

    fn profile_from_row(row: &Row) -> rusqlite::Result<UserProfile> {
        let sex: String = row.get("biological_sex")?;

        Ok(UserProfile {
            id: row.get("id")?,
            display_name: row.get("display_name")?,
            date_of_birth: row.get("date_of_birth")?,
            biological_sex: BiologicalSex::parse(&sex).unwrap_or(BiologicalSex::NotSet),
            height_cm: row.get("height_cm")?,
            weight_kg: row.get("weight_kg")?,
            body_fat_pct: row.get("body_fat_pct")?,
            max_heart_rate: row.get("max_heart_rate")?,
            sleep_baseline_hours: row.get("sleep_baseline_hours")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Non-null values of one daily_metrics column over the `days` dates
    /// before `before`, oldest first. `extra` narrows the row set further.
    fn recent_column(
        &self,
        column: &str,
        extra: &str,
        before: NaiveDate,
        days: usize,
    ) -> Result<Vec<f64>, StorageError> {
        let start = before - Duration::days(days as i64);
        let sql = format!(
            "SELECT {column} FROM daily_metrics \
             WHERE date >= ?1 AND date < ?2 AND {column} IS NOT NULL{extra} \
             ORDER BY date ASC"
        );

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let values = stmt
            .query_map(params![start, before], |row| row.get::<_, f64>(0))?
            .collect::<rusqlite::Result<Vec<f64>>>()?;
        Ok(values)
    }
}

// Both series must come from the same rows so debt math can pair them by day
const PAIRED_SLEEP_FILTER: &str =
    " AND sleep_duration_hours IS NOT NULL AND sleep_need_hours IS NOT NULL";

impl DailyMetricRepository for Database {
    fn metric_for_date(&self, date: NaiveDate) -> Result<Option<DailyMetric>, StorageError> {
        let conn = self.conn();
        let metric = conn
            .query_row(
                "SELECT * FROM daily_metrics WHERE date = ?1",
                params![date],
                |row| Self::metric_from_row(row),
            )
            .optional()?;
        Ok(metric)
    }

    fn upsert_metric(&self, metric: &DailyMetric) -> Result<(), StorageError> {
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT OR REPLACE INTO daily_metrics (
                date, recovery_score, recovery_zone, recovery_insight,
                strain_score, peak_workout_strain,
                sleep_duration_hours, sleep_need_hours, sleep_debt_hours,
                sleep_performance, sleep_consistency, sleep_efficiency,
                restorative_sleep_pct, sleep_quality,
                hrv_rmssd, hrv_sdnn, resting_heart_rate, respiratory_rate,
                spo2, skin_temperature_deviation,
                steps, active_calories, vo2_max, lean_body_mass_pct,
                stress_average, is_computed, computed_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27
            )
            "#,
            params![
                metric.date,
                metric.recovery_score,
                metric.recovery_zone.map(|z| z.as_str()),
                metric.recovery_insight,
                metric.strain_score,
                metric.peak_workout_strain,
                metric.sleep_duration_hours,
                metric.sleep_need_hours,
                metric.sleep_debt_hours,
                metric.sleep_performance,
                metric.sleep_consistency,
                metric.sleep_efficiency,
                metric.restorative_sleep_pct,
                metric.sleep_quality,
                metric.hrv_rmssd,
                metric.hrv_sdnn,
                metric.resting_heart_rate,
                metric.respiratory_rate,
                metric.spo2,
                metric.skin_temperature_deviation,
                metric.steps,
                metric.active_calories,
                metric.vo2_max,
                metric.lean_body_mass_pct,
                metric.stress_average,
                metric.is_computed,
                metric.computed_at,
            ],
        )?;
        Ok(())
    }

    fn metrics_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyMetric>, StorageError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT * FROM daily_metrics WHERE date >= ?1 AND date <= ?2 ORDER BY date ASC",
        )?;
        let metrics = stmt
            .query_map(params![start, end], |row| Self::metric_from_row(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(metrics)
    }

    fn recent_hrv(&self, before: NaiveDate, days: usize) -> Result<Vec<f64>, StorageError> {
        self.recent_column("hrv_rmssd", "", before, days)
    }

    fn recent_resting_heart_rate(
        &self,
        before: NaiveDate,
        days: usize,
    ) -> Result<Vec<f64>, StorageError> {
        self.recent_column("resting_heart_rate", "", before, days)
    }

    fn recent_strain(&self, before: NaiveDate, days: usize) -> Result<Vec<f64>, StorageError> {
        self.recent_column("strain_score", "", before, days)
    }

    fn recent_sleep_performance(
        &self,
        before: NaiveDate,
        days: usize,
    ) -> Result<Vec<f64>, StorageError> {
        self.recent_column("sleep_performance", "", before, days)
    }

    fn recent_sleep_hours(
        &self,
        before: NaiveDate,
        days: usize,
    ) -> Result<Vec<f64>, StorageError> {
        self.recent_column("sleep_duration_hours", PAIRED_SLEEP_FILTER, before, days)
    }

    fn recent_sleep_needs(
        &self,
        before: NaiveDate,
        days: usize,
    ) -> Result<Vec<f64>, StorageError> {
        self.recent_column("sleep_need_hours", PAIRED_SLEEP_FILTER, before, days)
    }
}

impl SleepRepository for Database {
    fn store_session(
        &self,
        date: NaiveDate,
        session: &SleepSessionData,
    ) -> Result<(), StorageError> {
        let stages_json = serde_json::to_string(&session.stages)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let bedtime = minutes_since_midnight(session.start_millis);
        let wake_time = minutes_since_midnight(session.end_millis);

        let conn = self.conn();
        conn.execute(
            r#"
            INSERT OR REPLACE INTO sleep_sessions (
                id, date, start_millis, end_millis,
                total_sleep_minutes, time_in_bed_minutes,
                light_minutes, deep_minutes, rem_minutes, awake_minutes,
                awakenings, sleep_onset_latency_minutes, sleep_efficiency,
                bedtime_minutes, wake_time_minutes, stages
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                Uuid::new_v4(),
                date,
                session.start_millis,
                session.end_millis,
                session.total_sleep_minutes,
                session.time_in_bed_minutes,
                session.light_minutes,
                session.deep_minutes,
                session.rem_minutes,
                session.awake_minutes,
                session.awakenings,
                session.sleep_onset_latency_minutes,
                session.sleep_efficiency,
                bedtime,
                wake_time,
                stages_json,
            ],
        )?;
        Ok(())
    }

    fn sessions_for_date(&self, date: NaiveDate) -> Result<Vec<SleepSessionData>, StorageError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT * FROM sleep_sessions WHERE date = ?1 ORDER BY start_millis ASC",
        )?;
        let sessions = stmt
            .query_map(params![date], |row| Self::session_from_row(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sessions)
    }

    fn recent_bedtimes(
        &self,
        before: NaiveDate,
        count: usize,
    ) -> Result<Vec<f64>, StorageError> {
        self.recent_session_minutes("bedtime_minutes", before, count)
    }

    fn recent_wake_times(
        &self,
        before: NaiveDate,
        count: usize,
    ) -> Result<Vec<f64>, StorageError> {
        self.recent_session_minutes("wake_time_minutes", before, count)
    }
}

impl Database {
    /// Bedtime or wake minutes of the longest session per night, newest
    /// first. The longest session is the night's main sleep; naps never
    /// feed the consistency math.
    fn recent_session_minutes(
        &self,
        column: &str,
        before: NaiveDate,
        count: usize,
    ) -> Result<Vec<f64>, StorageError> {
        let sql = format!(
            "SELECT s.{column} \
             FROM sleep_sessions s \
             JOIN (SELECT date, MAX(total_sleep_minutes) AS longest \
                   FROM sleep_sessions WHERE date < ?1 GROUP BY date) m \
               ON s.date = m.date AND s.total_sleep_minutes = m.longest \
             GROUP BY s.date \
             ORDER BY s.date DESC \
             LIMIT ?2"
        );

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let values = stmt
            .query_map(params![before, count], |row| row.get::<_, f64>(0))?
            .collect::<rusqlite::Result<Vec<f64>>>()?;
        Ok(values)
    }
}

impl WorkoutRepository for Database {
    fn store_workout(&self, workout: &WorkoutRecord) -> Result<(), StorageError> {
        let zones_json = serde_json::to_string(&workout.zone_minutes)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let conn = self.conn();
        conn.execute(
            r#"
            INSERT OR REPLACE INTO workouts (
                id, external_uuid, date, workout_type, name,
                start_millis, end_millis, duration_minutes, strain,
                average_heart_rate, max_heart_rate, active_calories,
                zone_minutes, muscular_load
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                workout.id,
                workout.external_uuid,
                workout.date,
                workout.workout_type,
                workout.name,
                workout.start_millis,
                workout.end_millis,
                workout.duration_minutes,
                workout.strain,
                workout.average_heart_rate,
                workout.max_heart_rate,
                workout.active_calories,
                zones_json,
                workout.muscular_load,
            ],
        )?;
        Ok(())
    }

    fn workout_by_external_uuid(
        &self,
        uuid: &str,
    ) -> Result<Option<WorkoutRecord>, StorageError> {
        let conn = self.conn();
        let workout = conn
            .query_row(
                "SELECT * FROM workouts WHERE external_uuid = ?1",
                params![uuid],
                |row| Self::workout_from_row(row),
            )
            .optional()?;
        Ok(workout)
    }

    fn workouts_for_date(&self, date: NaiveDate) -> Result<Vec<WorkoutRecord>, StorageError> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT * FROM workouts WHERE date = ?1 ORDER BY start_millis ASC")?;
        let workouts = stmt
            .query_map(params![date], |row| Self::workout_from_row(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(workouts)
    }
}

impl BaselineRepository for Database {
    fn baseline_for(
        &self,
        metric_type: BaselineMetricType,
    ) -> Result<Option<BaselineMetric>, StorageError> {
        let conn = self.conn();
        let baseline = conn
            .query_row(
                r#"
                SELECT mean, standard_deviation, sample_count,
                       window_start, window_end, updated_at
                FROM baselines WHERE metric_type = ?1
                "#,
                params![metric_type.as_str()],
                |row| {
                    Ok(BaselineMetric {
                        metric_type,
                        mean: row.get("mean")?,
                        standard_deviation: row.get("standard_deviation")?,
                        sample_count: row.get::<_, i64>("sample_count")? as usize,
                        window_start: row.get("window_start")?,
                        window_end: row.get("window_end")?,
                        updated_at: row.get("updated_at")?,
                    })
                },
            )
            .optional()?;
        Ok(baseline)
    }

    fn store_baseline(&self, baseline: &BaselineMetric) -> Result<(), StorageError> {
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT OR REPLACE INTO baselines (
                metric_type, mean, standard_deviation, sample_count,
                window_start, window_end, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                baseline.metric_type.as_str(),
                baseline.mean,
                baseline.standard_deviation,
                baseline.sample_count as i64,
                baseline.window_start,
                baseline.window_end,
                baseline.updated_at,
            ],
        )?;
        Ok(())
    }
}

impl UserProfileRepository for Database {
    fn load_profile(&self) -> Result<Option<UserProfile>, StorageError> {
        let conn = self.conn();
        let profile = conn
            .query_row(
                "SELECT * FROM profiles ORDER BY updated_at DESC LIMIT 1",
                [],
                |row| Self::profile_from_row(row),
            )
            .optional()?;
        Ok(profile)
    }

    fn store_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT OR REPLACE INTO profiles (
                id, display_name, date_of_birth, biological_sex,
                height_cm, weight_kg, body_fat_pct, max_heart_rate,
                sleep_baseline_hours, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                profile.id,
                profile.display_name,
                profile.date_of_birth,
                profile.biological_sex.as_str(),
                profile.height_cm,
                profile.weight_kg,
                profile.body_fat_pct,
                profile.max_heart_rate,
                profile.sleep_baseline_hours,
                profile.created_at,
                profile.updated_at,
            ],
        )?;
        Ok(())
    }
}
