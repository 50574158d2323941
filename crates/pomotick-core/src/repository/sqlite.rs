//! SQLite-backed interval storage.
//!
//! One table, created on open:
//!
//! | column             | type    | encoding                          |
//! |--------------------|---------|-----------------------------------|
//! | `id`               | INTEGER | rowid                             |
//! | `start_time`       | TEXT    | RFC 3339 UTC, nanoseconds, or NULL |
//! | `planned_duration` | INTEGER | nanoseconds                       |
//! | `actual_duration`  | INTEGER | nanoseconds                       |
//! | `category`         | TEXT    | category name                     |
//! | `state`            | INTEGER | state code                        |
//!
//! Timestamps use a fixed width so text order equals time order.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use super::{local_day_bounds, CategoryFilter, Repository, UpdateOutcome};
use crate::error::{CoreError, DatabaseError, Result};
use crate::interval::{Category, Interval, IntervalState};

const SELECT_COLUMNS: &str =
    "SELECT id, start_time, planned_duration, actual_duration, category, state FROM interval";

/// Durable store over a single connection; the mutex serializes access.
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    /// Open (or create) the database file and its schema.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or the table created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        // Another process may be writing ticks to the same file.
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS interval (
            id               INTEGER PRIMARY KEY,
            start_time       TEXT,
            planned_duration INTEGER NOT NULL DEFAULT 0,
            actual_duration  INTEGER NOT NULL DEFAULT 0,
            category         TEXT NOT NULL,
            state            INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_interval_start_time ON interval(start_time);",
    )
    .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
    Ok(())
}

fn to_nanos(d: Duration) -> i64 {
    i64::try_from(d.as_nanos()).unwrap_or(i64::MAX)
}

fn from_nanos(n: i64) -> Duration {
    Duration::from_nanos(n.max(0) as u64)
}

fn format_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Raw column values, decoded outside the rusqlite row callback.
struct IntervalRow {
    id: i64,
    start_time: Option<String>,
    planned: i64,
    actual: i64,
    category: String,
    state: i64,
}

impl IntervalRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            start_time: row.get(1)?,
            planned: row.get(2)?,
            actual: row.get(3)?,
            category: row.get(4)?,
            state: row.get(5)?,
        })
    }

    fn into_interval(self) -> Result<Interval> {
        let corrupt = |message: String| DatabaseError::CorruptRow {
            id: self.id,
            message,
        };
        let category: Category = self.category.parse().map_err(corrupt)?;
        let state = IntervalState::from_code(self.state)
            .ok_or_else(|| corrupt(format!("unknown state code {}", self.state)))?;
        let start_time = self
            .start_time
            .as_deref()
            .map(|s| {
                DateTime::parse_from_rfc3339(s)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| corrupt(format!("bad start_time '{s}': {e}")))
            })
            .transpose()?;

        Ok(Interval::restore(
            self.id,
            start_time,
            from_nanos(self.planned),
            from_nanos(self.actual),
            category,
            state,
        ))
    }
}

fn select_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<IntervalRow>> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = ?1"),
        params![id],
        IntervalRow::read,
    )
    .optional()
}

impl Repository for SqliteRepository {
    fn create(&self, interval: &Interval) -> Result<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO interval (start_time, planned_duration, actual_duration, category, state)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                interval.start_time.map(format_time),
                to_nanos(interval.planned_duration),
                to_nanos(interval.actual_duration),
                interval.category.as_str(),
                interval.state.code(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, interval: &Interval) -> Result<()> {
        let changed = self.conn.lock().execute(
            "UPDATE interval
             SET start_time = ?1, actual_duration = MIN(?2, planned_duration), state = ?3
             WHERE id = ?4",
            params![
                interval.start_time.map(format_time),
                to_nanos(interval.actual_duration),
                interval.state.code(),
                interval.id,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::NotFound(interval.id));
        }
        Ok(())
    }

    fn update_if(&self, interval: &Interval, expected: IntervalState) -> Result<UpdateOutcome> {
        let mut conn = self.conn.lock();
        // Immediate: take the write lock before reading so another process
        // cannot change the state between the check and the read-back.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE interval
             SET start_time = COALESCE(start_time, ?1),
                 actual_duration = MAX(actual_duration, MIN(?2, planned_duration)),
                 state = ?3
             WHERE id = ?4 AND state = ?5",
            params![
                interval.start_time.map(format_time),
                to_nanos(interval.actual_duration),
                interval.state.code(),
                interval.id,
                expected.code(),
            ],
        )?;
        let row = select_by_id(&tx, interval.id)?;
        tx.commit()?;

        let stored = row.ok_or(CoreError::NotFound(interval.id))?.into_interval()?;
        Ok(if changed == 0 {
            UpdateOutcome::Stale(stored)
        } else {
            UpdateOutcome::Applied(stored)
        })
    }

    fn by_id(&self, id: i64) -> Result<Interval> {
        let row = select_by_id(&self.conn.lock(), id)?;
        row.ok_or(CoreError::NotFound(id))?.into_interval()
    }

    fn last(&self) -> Result<Interval> {
        let row = self
            .conn
            .lock()
            .query_row(
                &format!("{SELECT_COLUMNS} ORDER BY id DESC LIMIT 1"),
                [],
                IntervalRow::read,
            )
            .optional()?;
        row.ok_or(CoreError::NoInterval)?.into_interval()
    }

    fn breaks(&self, n: usize) -> Result<Vec<Interval>> {
        let rows = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE category LIKE ?1 ORDER BY id DESC LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(
                    params![CategoryFilter::Breaks.like_pattern(), n as i64],
                    IntervalRow::read,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };
        rows.into_iter().map(IntervalRow::into_interval).collect()
    }

    fn category_summary(&self, day: NaiveDate, filter: CategoryFilter) -> Result<Duration> {
        let (start, end) = local_day_bounds(day);
        let total: i64 = self.conn.lock().query_row(
            "SELECT COALESCE(SUM(actual_duration), 0) FROM interval
             WHERE category LIKE ?1 AND start_time >= ?2 AND start_time < ?3",
            params![filter.like_pattern(), format_time(start), format_time(end)],
            |row| row.get(0),
        )?;
        Ok(from_nanos(total))
    }
}
