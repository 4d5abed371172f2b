//! Storage layer for punch.
//!
//! Provides the `SQLite` implementation of [`SegmentStore`] using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared across
//! threads without external synchronization.
//!
//! # Schema
//!
//! Dates are stored as TEXT in `YYYY-MM-DD` form and times of day as `HH:MM`, so
//! lexicographic ordering matches chronological ordering and week ranges can be
//! selected with `BETWEEN`.
//!
//! `time_segments` holds one row per recorded interval; a NULL `seg_end` marks
//! the open segment. `day_marks` records which days were ended with a stop.

use std::path::Path;

use chrono::{NaiveDate, SecondsFormat, Utc};
use punch_core::clock::{ClockError, ClockTime, week_end};
use punch_core::segment::{SegmentId, SegmentPatch, TimeSegment};
use punch_core::store::{SegmentStore, StoreError};
use rusqlite::{Connection, params};
use thiserror::Error;
use tracing::debug;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored date could not be parsed.
    #[error("invalid date for segment {id}: {value}")]
    InvalidDate {
        id: i64,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored time of day could not be parsed.
    #[error("invalid {column} for segment {id}: {value}")]
    InvalidTime {
        id: i64,
        column: &'static str,
        value: String,
        #[source]
        source: ClockError,
    },
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A `time_segments` row before its columns are validated.
struct SegmentRow {
    id: i64,
    date: String,
    start: String,
    end: Option<String>,
}

impl SegmentRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            date: row.get(1)?,
            start: row.get(2)?,
            end: row.get(3)?,
        })
    }

    fn into_segment(self) -> Result<TimeSegment, DbError> {
        let id = self.id;
        let date = self
            .date
            .parse::<NaiveDate>()
            .map_err(|source| DbError::InvalidDate {
                id,
                value: self.date.clone(),
                source,
            })?;
        let start = parse_time(id, "seg_start", &self.start)?;
        let end = self
            .end
            .as_deref()
            .map(|end| parse_time(id, "seg_end", end))
            .transpose()?;
        Ok(TimeSegment {
            id: SegmentId::new(id),
            date,
            start,
            end,
        })
    }
}

fn parse_time(id: i64, column: &'static str, value: &str) -> Result<ClockTime, DbError> {
    value
        .parse::<ClockTime>()
        .map_err(|source| DbError::InvalidTime {
            id,
            column,
            value: value.to_string(),
            source,
        })
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn format_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- date: 'YYYY-MM-DD'; seg_start/seg_end: 'HH:MM'; seg_end NULL while open
            CREATE TABLE IF NOT EXISTS time_segments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                seg_start TEXT NOT NULL,
                seg_end TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_time_segments_date ON time_segments(date);

            -- One row per day that was ended with a stop
            CREATE TABLE IF NOT EXISTS day_marks (
                date TEXT PRIMARY KEY,
                ended_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    fn query_segments(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<TimeSegment>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, SegmentRow::from_row)?;
        let mut segments = Vec::new();
        for row in rows {
            segments.push(row?.into_segment()?);
        }
        Ok(segments)
    }

    fn insert_segment(
        &self,
        date: NaiveDate,
        start: ClockTime,
        end: Option<ClockTime>,
    ) -> Result<TimeSegment, DbError> {
        self.conn.execute(
            "INSERT INTO time_segments (date, seg_start, seg_end, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                format_date(date),
                start.to_string(),
                end.map(String::from),
                format_timestamp(),
            ],
        )?;
        let id = SegmentId::new(self.conn.last_insert_rowid());
        debug!(%id, %date, %start, "segment inserted");
        Ok(TimeSegment {
            id,
            date,
            start,
            end,
        })
    }

    /// Returns the number of rows changed.
    fn patch_segment(&self, id: SegmentId, patch: SegmentPatch) -> Result<usize, DbError> {
        let changed = self.conn.execute(
            "
            UPDATE time_segments
            SET seg_start = COALESCE(?1, seg_start),
                seg_end = COALESCE(?2, seg_end)
            WHERE id = ?3
            ",
            params![
                patch.start.map(String::from),
                patch.end.map(String::from),
                id.get(),
            ],
        )?;
        Ok(changed)
    }

    fn delete_week(&mut self, monday: NaiveDate) -> Result<usize, DbError> {
        let from = format_date(monday);
        let to = format_date(week_end(monday));
        let tx = self.conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM time_segments WHERE date BETWEEN ?1 AND ?2",
            params![from, to],
        )?;
        tx.execute(
            "DELETE FROM day_marks WHERE date BETWEEN ?1 AND ?2",
            params![from, to],
        )?;
        tx.commit()?;
        debug!(%monday, removed, "week deleted");
        Ok(removed)
    }

    fn has_day_mark(&self, date: NaiveDate) -> Result<bool, DbError> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM day_marks WHERE date = ?1)",
            params![format_date(date)],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn set_day_mark(&self, date: NaiveDate, at: ClockTime) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO day_marks (date, ended_at) VALUES (?1, ?2)
            ON CONFLICT(date) DO UPDATE SET ended_at = excluded.ended_at
            ",
            params![format_date(date), at.to_string()],
        )?;
        Ok(())
    }

    fn remove_day_mark(&self, date: NaiveDate) -> Result<(), DbError> {
        self.conn.execute(
            "DELETE FROM day_marks WHERE date = ?1",
            params![format_date(date)],
        )?;
        Ok(())
    }
}

impl SegmentStore for Database {
    fn list_by_date(&self, date: NaiveDate) -> Result<Vec<TimeSegment>, StoreError> {
        Ok(self.query_segments(
            "
            SELECT id, date, seg_start, seg_end
            FROM time_segments
            WHERE date = ?1
            ORDER BY id ASC
            ",
            params![format_date(date)],
        )?)
    }

    fn list_by_week(&self, monday: NaiveDate) -> Result<Vec<TimeSegment>, StoreError> {
        Ok(self.query_segments(
            "
            SELECT id, date, seg_start, seg_end
            FROM time_segments
            WHERE date BETWEEN ?1 AND ?2
            ORDER BY date ASC, id ASC
            ",
            params![format_date(monday), format_date(week_end(monday))],
        )?)
    }

    fn list_closed(&self) -> Result<Vec<TimeSegment>, StoreError> {
        Ok(self.query_segments(
            "
            SELECT id, date, seg_start, seg_end
            FROM time_segments
            WHERE seg_end IS NOT NULL
            ORDER BY date ASC, id ASC
            ",
            [],
        )?)
    }

    fn create(
        &mut self,
        date: NaiveDate,
        start: ClockTime,
        end: Option<ClockTime>,
    ) -> Result<TimeSegment, StoreError> {
        Ok(self.insert_segment(date, start, end)?)
    }

    fn update(&mut self, id: SegmentId, patch: SegmentPatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Err(StoreError::NothingToUpdate);
        }
        match self.patch_segment(id, patch)? {
            0 => Err(StoreError::NotFound(id)),
            _ => Ok(()),
        }
    }

    fn delete_by_week(&mut self, monday: NaiveDate) -> Result<usize, StoreError> {
        Ok(self.delete_week(monday)?)
    }

    fn day_ended(&self, date: NaiveDate) -> Result<bool, StoreError> {
        Ok(self.has_day_mark(date)?)
    }

    fn mark_day_ended(&mut self, date: NaiveDate, at: ClockTime) -> Result<(), StoreError> {
        Ok(self.set_day_mark(date, at)?)
    }

    fn clear_day_ended(&mut self, date: NaiveDate) -> Result<(), StoreError> {
        Ok(self.remove_day_mark(date)?)
    }
}
