//! Record store for leak checks and bill analyses.
//!
//! Records are append-only. The store assigns ids and creation timestamps and
//! hands back ordered, time-filtered sets; every query returns newest first.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that text comparison matches time order.

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use rusqlite::{Connection, Row, params};

use crate::core::models::{
    BillAnalysisInput, BillAnalysisRecord, GuardianStatus, LeakCheckRecord, LeakConfidence,
    NewLeakCheck,
};
use crate::core::status;
use crate::error::{FlowError, Result};
use crate::storage::schema::run_migrations;

const DATE_FORMAT: &str = "%Y-%m-%d";

const LEAK_COLUMNS: &str = "id, reading_a, reading_b, no_water_used, delta, leak_detected, \
     confidence, photo_path_a, photo_path_b, duration_minutes, created_at";

const BILL_COLUMNS: &str = "id, period_start, period_end, usage, amount, photo_path, created_at";

/// Record database access layer.
pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Create or open a record database at the given path.
    ///
    /// # Errors
    /// Returns an error if the parent directory cannot be created, the database
    /// cannot be opened, or schema migrations fail.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut conn = Connection::open(path)
            .map_err(|e| FlowError::Storage(format!("open record db {}: {e}", path.display())))?;

        let version = run_migrations(&mut conn)?;
        tracing::debug!(path = %path.display(), version, "Opened record store");

        Ok(Self { conn })
    }

    /// Open an in-memory record database (for testing).
    ///
    /// # Errors
    /// Returns an error if the in-memory database cannot be opened or migrations fail.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()
            .map_err(|e| FlowError::Storage(format!("open in-memory db: {e}")))?;

        run_migrations(&mut conn)?;

        Ok(Self { conn })
    }

    // =========================================================================
    // Leak checks
    // =========================================================================

    /// Store a classified leak check stamped with the current time.
    ///
    /// # Errors
    /// Returns an error if the INSERT fails.
    pub fn record_leak_check(&self, draft: NewLeakCheck) -> Result<LeakCheckRecord> {
        self.record_leak_check_at(draft, Utc::now())
    }

    /// Store a classified leak check with an explicit creation time.
    ///
    /// # Errors
    /// Returns an error if the INSERT fails.
    pub fn record_leak_check_at(
        &self,
        draft: NewLeakCheck,
        created_at: DateTime<Utc>,
    ) -> Result<LeakCheckRecord> {
        let created_at = created_at.trunc_subsecs(6);
        let input = draft.input();
        let assessment = draft.assessment();

        let mut stmt = self
            .conn
            .prepare_cached(
                "INSERT INTO leak_checks ( \
                    reading_a, reading_b, no_water_used, delta, leak_detected, \
                    confidence, photo_path_a, photo_path_b, duration_minutes, created_at \
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )
            .map_err(|e| FlowError::Storage(format!("prepare insert: {e}")))?;

        stmt.execute(params![
            input.reading_a,
            input.reading_b,
            input.no_water_used,
            assessment.delta,
            assessment.leak_detected,
            assessment.confidence.as_str(),
            input.photo_path_a,
            input.photo_path_b,
            input.duration_minutes,
            format_timestamp(created_at),
        ])
        .map_err(|e| FlowError::Storage(format!("insert leak check: {e}")))?;

        let id = self.conn.last_insert_rowid();
        tracing::debug!(
            id,
            leak_detected = assessment.leak_detected,
            confidence = %assessment.confidence,
            "Stored leak check"
        );

        Ok(draft.into_record(id, created_at))
    }

    /// Most recent leak checks, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_leak_checks(&self, limit: u32) -> Result<Vec<LeakCheckRecord>> {
        let sql = format!(
            "SELECT {LEAK_COLUMNS} FROM leak_checks \
             ORDER BY created_at DESC, id DESC LIMIT ?1"
        );
        self.query_leak_checks(&sql, params![limit])
    }

    /// Every leak check created at or after `cutoff`, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn leak_checks_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<LeakCheckRecord>> {
        let sql = format!(
            "SELECT {LEAK_COLUMNS} FROM leak_checks \
             WHERE created_at >= ?1 ORDER BY created_at DESC, id DESC"
        );
        self.query_leak_checks(&sql, params![format_timestamp(cutoff)])
    }

    /// Fetch one leak check.
    ///
    /// # Errors
    /// Returns [`FlowError::NotFound`] when no record has this id.
    pub fn get_leak_check(&self, id: i64) -> Result<LeakCheckRecord> {
        let sql = format!("SELECT {LEAK_COLUMNS} FROM leak_checks WHERE id = ?1");
        self.query_leak_checks(&sql, params![id])?
            .into_iter()
            .next()
            .ok_or(FlowError::NotFound {
                kind: "leak check",
                id,
            })
    }

    fn query_leak_checks(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<LeakCheckRecord>> {
        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .map_err(|e| FlowError::Storage(format!("prepare select: {e}")))?;

        let rows = stmt
            .query_map(params, map_leak_row)
            .map_err(|e| FlowError::Storage(format!("query leak checks: {e}")))?;

        rows.map(|row| row.map_err(|e| FlowError::Storage(format!("map leak check row: {e}"))))
            .collect()
    }

    // =========================================================================
    // Bill analyses
    // =========================================================================

    /// Store a bill analysis stamped with the current time.
    ///
    /// # Errors
    /// Returns an error if the INSERT fails.
    pub fn record_bill_analysis(&self, input: &BillAnalysisInput) -> Result<BillAnalysisRecord> {
        self.record_bill_analysis_at(input, Utc::now())
    }

    /// Store a bill analysis with an explicit creation time.
    ///
    /// # Errors
    /// Returns an error if the INSERT fails.
    pub fn record_bill_analysis_at(
        &self,
        input: &BillAnalysisInput,
        created_at: DateTime<Utc>,
    ) -> Result<BillAnalysisRecord> {
        let created_at = created_at.trunc_subsecs(6);

        let mut stmt = self
            .conn
            .prepare_cached(
                "INSERT INTO bill_analyses ( \
                    period_start, period_end, usage, amount, photo_path, created_at \
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .map_err(|e| FlowError::Storage(format!("prepare insert: {e}")))?;

        stmt.execute(params![
            input.period_start.format(DATE_FORMAT).to_string(),
            input.period_end.format(DATE_FORMAT).to_string(),
            input.usage,
            input.amount,
            input.photo_path,
            format_timestamp(created_at),
        ])
        .map_err(|e| FlowError::Storage(format!("insert bill analysis: {e}")))?;

        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, usage = input.usage, amount = input.amount, "Stored bill analysis");

        Ok(BillAnalysisRecord {
            id,
            period_start: input.period_start,
            period_end: input.period_end,
            usage: input.usage,
            amount: input.amount,
            photo_path: input.photo_path.clone(),
            created_at,
        })
    }

    /// Most recent bill analyses, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_bill_analyses(&self, limit: u32) -> Result<Vec<BillAnalysisRecord>> {
        let sql = format!(
            "SELECT {BILL_COLUMNS} FROM bill_analyses \
             ORDER BY created_at DESC, id DESC LIMIT ?1"
        );
        self.query_bills(&sql, params![limit])
    }

    /// At most `limit` bill analyses created at or after `cutoff`, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn bill_analyses_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<BillAnalysisRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let sql = format!(
            "SELECT {BILL_COLUMNS} FROM bill_analyses \
             WHERE created_at >= ?1 ORDER BY created_at DESC, id DESC LIMIT ?2"
        );
        self.query_bills(&sql, params![format_timestamp(cutoff), limit])
    }

    /// Fetch one bill analysis.
    ///
    /// # Errors
    /// Returns [`FlowError::NotFound`] when no record has this id.
    pub fn get_bill_analysis(&self, id: i64) -> Result<BillAnalysisRecord> {
        let sql = format!("SELECT {BILL_COLUMNS} FROM bill_analyses WHERE id = ?1");
        self.query_bills(&sql, params![id])?
            .into_iter()
            .next()
            .ok_or(FlowError::NotFound {
                kind: "bill analysis",
                id,
            })
    }

    fn query_bills(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<BillAnalysisRecord>> {
        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .map_err(|e| FlowError::Storage(format!("prepare select: {e}")))?;

        let rows = stmt
            .query_map(params, map_bill_row)
            .map_err(|e| FlowError::Storage(format!("query bill analyses: {e}")))?;

        rows.map(|row| row.map_err(|e| FlowError::Storage(format!("map bill row: {e}"))))
            .collect()
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Load the status window ending at `now` and aggregate it.
    ///
    /// # Errors
    /// Returns an error if either window query fails.
    pub fn guardian_status(&self, now: DateTime<Utc>) -> Result<GuardianStatus> {
        let cutoff = status::window_start(now);
        let checks = self.leak_checks_since(cutoff)?;
        let bills = self.bill_analyses_since(cutoff, status::BILL_TREND_LIMIT)?;

        tracing::debug!(
            checks = checks.len(),
            bills = bills.len(),
            cutoff = %cutoff,
            "Loaded status window"
        );

        Ok(status::aggregate(&checks, &bills, now))
    }

    /// Row counts as `(leak_checks, bill_analyses)`.
    ///
    /// # Errors
    /// Returns an error if a COUNT query fails.
    pub fn counts(&self) -> Result<(i64, i64)> {
        let count = |table: &str| -> Result<i64> {
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })
                .map_err(|e| FlowError::Storage(format!("count {table}: {e}")))
        };
        Ok((count("leak_checks")?, count("bill_analyses")?))
    }
}

fn map_leak_row(row: &Row<'_>) -> rusqlite::Result<LeakCheckRecord> {
    let label: String = row.get(6)?;
    let confidence = LeakConfidence::from_label(&label).ok_or_else(|| {
        conversion_error(
            6,
            FlowError::Storage(format!("unknown confidence label '{label}'")),
        )
    })?;

    Ok(LeakCheckRecord {
        id: row.get(0)?,
        reading_a: row.get(1)?,
        reading_b: row.get(2)?,
        no_water_used: row.get(3)?,
        delta: row.get(4)?,
        leak_detected: row.get(5)?,
        confidence,
        photo_path_a: row.get(7)?,
        photo_path_b: row.get(8)?,
        duration_minutes: row.get(9)?,
        created_at: parse_timestamp(&row.get::<_, String>(10)?).map_err(|e| conversion_error(10, e))?,
    })
}

fn map_bill_row(row: &Row<'_>) -> rusqlite::Result<BillAnalysisRecord> {
    Ok(BillAnalysisRecord {
        id: row.get(0)?,
        period_start: parse_date(&row.get::<_, String>(1)?).map_err(|e| conversion_error(1, e))?,
        period_end: parse_date(&row.get::<_, String>(2)?).map_err(|e| conversion_error(2, e))?,
        usage: row.get(3)?,
        amount: row.get(4)?,
        photo_path: row.get(5)?,
        created_at: parse_timestamp(&row.get::<_, String>(6)?).map_err(|e| conversion_error(6, e))?,
    })
}

fn conversion_error(column: usize, err: FlowError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| FlowError::Storage(format!("invalid timestamp '{value}': {e}")))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| FlowError::Storage(format!("invalid date '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{LeakCheckInput, StatusLevel};
    use chrono::Duration;

    fn open_temp_store() -> RecordStore {
        RecordStore::open_in_memory().expect("open store")
    }

    fn draft(a: f64, b: f64, no_water_used: bool) -> NewLeakCheck {
        NewLeakCheck::assess(LeakCheckInput::new(a, b, no_water_used))
    }

    fn bill(usage: f64) -> BillAnalysisInput {
        BillAnalysisInput {
            period_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            usage,
            amount: usage / 100.0,
            photo_path: None,
        }
    }

    #[test]
    fn record_and_fetch_leak_check() {
        let store = open_temp_store();
        let stored = store
            .record_leak_check(draft(100.0, 112.0, true))
            .expect("record");

        assert_eq!(stored.id, 1);
        assert!(stored.leak_detected);
        assert_eq!(stored.confidence, LeakConfidence::VeryHigh);

        let fetched = store.get_leak_check(stored.id).expect("fetch");
        assert_eq!(fetched, stored);
    }

    #[test]
    fn missing_ids_are_not_found() {
        let store = open_temp_store();
        assert!(matches!(
            store.get_leak_check(42),
            Err(FlowError::NotFound { kind: "leak check", id: 42 })
        ));
        assert!(matches!(
            store.get_bill_analysis(7),
            Err(FlowError::NotFound { kind: "bill analysis", .. })
        ));
    }

    #[test]
    fn leak_checks_list_newest_first() {
        let store = open_temp_store();
        let now = Utc::now();
        for (offset, reading) in [(3, 1.0), (1, 2.0), (2, 3.0)] {
            store
                .record_leak_check_at(draft(0.0, reading, false), now - Duration::hours(offset))
                .expect("record");
        }

        let listed = store.list_leak_checks(10).expect("list");
        let readings: Vec<f64> = listed.iter().map(|r| r.reading_b).collect();
        assert_eq!(readings, vec![2.0, 3.0, 1.0]);

        assert_eq!(store.list_leak_checks(2).expect("list").len(), 2);
    }

    #[test]
    fn same_timestamp_orders_by_id() {
        let store = open_temp_store();
        let at = Utc::now();
        let first = store.record_leak_check_at(draft(0.0, 1.0, false), at).unwrap();
        let second = store.record_leak_check_at(draft(0.0, 2.0, false), at).unwrap();

        let listed = store.list_leak_checks(10).unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[test]
    fn window_excludes_old_checks() {
        let store = open_temp_store();
        let now = Utc::now();
        store
            .record_leak_check_at(draft(0.0, 1.0, false), now - Duration::days(45))
            .unwrap();
        store
            .record_leak_check_at(draft(0.0, 1.0, false), now - Duration::days(2))
            .unwrap();

        let recent = store.leak_checks_since(now - Duration::days(30)).unwrap();
        assert_eq!(recent.len(), 1);
    }

    #[test]
    fn bills_since_respects_limit() {
        let store = open_temp_store();
        let now = Utc::now();
        for day in 1..=5_i32 {
            store
                .record_bill_analysis_at(&bill(f64::from(day) * 1000.0), now - Duration::days(day.into()))
                .unwrap();
        }

        let bills = store
            .bill_analyses_since(now - Duration::days(30), 3)
            .unwrap();
        let usages: Vec<f64> = bills.iter().map(|b| b.usage).collect();
        assert_eq!(usages, vec![1000.0, 2000.0, 3000.0]);
    }

    #[test]
    fn bill_round_trips_dates_and_photo() {
        let store = open_temp_store();
        let mut input = bill(1500.0);
        input.photo_path = Some("bills/jan.jpg".to_string());

        let stored = store.record_bill_analysis(&input).unwrap();
        let fetched = store.get_bill_analysis(stored.id).unwrap();
        assert_eq!(fetched, stored);
        assert_eq!(fetched.period_end, input.period_end);
        assert_eq!(fetched.photo_path.as_deref(), Some("bills/jan.jpg"));
    }

    #[test]
    fn guardian_status_reads_window() {
        let store = open_temp_store();
        let now = Utc::now();
        store
            .record_leak_check_at(draft(100.0, 110.0, true), now - Duration::days(2))
            .unwrap();

        let status = store.guardian_status(now).unwrap();
        assert_eq!(status.status, StatusLevel::Confirmed);
        assert_eq!(status.recent_leaks, 1);
        assert_eq!(status.total_checks_30d, 1);
    }

    #[test]
    fn empty_store_is_normal() {
        let store = open_temp_store();
        let status = store.guardian_status(Utc::now()).unwrap();
        assert_eq!(status.status, StatusLevel::Normal);
        assert!(status.last_check.is_none());
        assert_eq!(store.counts().unwrap(), (0, 0));
    }

    #[test]
    fn timestamps_sort_as_text() {
        let early = Utc::now().trunc_subsecs(0);
        let later = early + Duration::microseconds(500);
        assert!(format_timestamp(early) < format_timestamp(later));
        assert!(format_timestamp(early).ends_with('Z'));
    }
}
