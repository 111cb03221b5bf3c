//! Storage layer for the usage collector.
//!
//! Provides persistence for buffered events, the collector state, and the
//! per-day usage output using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! This means a `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! Collection passes must not run concurrently against the same file: each
//! pass reads the stored state and replaces it.
//!
//! # Schema
//!
//! ## Timestamps and days
//!
//! Timestamps are stored as INTEGER epoch milliseconds, exactly as the
//! aggregator sees them. Calendar days are stored as TEXT in `YYYY-MM-DD`
//! form, so lexicographic order matches chronological order.
//!
//! ## Events
//!
//! Screen events store an empty `app_id`. The unique key over
//! `(timestamp_ms, type, app_id)` makes re-imports idempotent.
//!
//! ## Collector state
//!
//! `collector_state` holds at most one row (`id = 1`). It is only written by
//! [`Database::apply_batch`], in the same transaction as the usage output.

use std::path::Path;

use chrono::{NaiveDate, TimeZone};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use uc_core::{
    AppId, EventType, SessionAggregator, SessionState, UnknownEventType, UsageEvent, UsageSegment,
    UsageSink, ValidationError,
};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored row no longer validates.
    #[error("invalid stored value: {0}")]
    Validation(#[from] ValidationError),
    /// A stored event has a type this build does not know.
    #[error("invalid stored event: {0}")]
    UnknownEventType(#[from] UnknownEventType),
    /// Failed to parse a stored day.
    #[error("invalid day: {value}")]
    InvalidDay {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Result of a committed [`Database::apply_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// State to carry into the next pass.
    pub state: SessionState,
    /// Usage added to the daily totals by this batch, across all days.
    pub recorded_ms: i64,
}

/// Accumulated usage of one app on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyTotal {
    pub day: NaiveDate,
    pub app: AppId,
    pub duration_ms: i64,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
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
            -- Buffered platform events, consumed by collection passes
            -- app_id: empty for screen events
            CREATE TABLE IF NOT EXISTS events (
                timestamp_ms INTEGER NOT NULL,
                type TEXT NOT NULL,
                app_id TEXT NOT NULL DEFAULT '',
                UNIQUE (timestamp_ms, type, app_id)
            );

            CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp_ms);

            -- Single-row snapshot carried between passes
            CREATE TABLE IF NOT EXISTS collector_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                last_processed_ms INTEGER NOT NULL,
                screen_interactive INTEGER NOT NULL,
                active_app TEXT,
                segment_start_ms INTEGER
            );

            -- Additive per-day, per-app totals
            CREATE TABLE IF NOT EXISTS daily_totals (
                day TEXT NOT NULL,
                app_id TEXT NOT NULL,
                duration_ms INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (day, app_id)
            );

            -- Append-only interval log
            CREATE TABLE IF NOT EXISTS intervals (
                day TEXT NOT NULL,
                app_id TEXT NOT NULL,
                start_ms INTEGER NOT NULL,
                end_ms INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_intervals_day ON intervals(day, start_ms);
            ",
        )?;
        Ok(())
    }

    /// Inserts a batch of events, ignoring exact duplicates.
    pub fn insert_events(&mut self, events: &[UsageEvent]) -> Result<usize, DbError> {
        if events.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO events (timestamp_ms, type, app_id) VALUES (?, ?, ?)",
            )?;
            for event in events {
                inserted += stmt.execute(params![
                    event.timestamp_ms,
                    event.event_type().as_str(),
                    event.app().map_or("", AppId::as_str),
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Lists events within a time range, oldest first.
    ///
    /// The range is inclusive of `start_ms` and exclusive of `end_ms`. Events
    /// sharing a timestamp keep their insertion order.
    pub fn events_in_range(&self, start_ms: i64, end_ms: i64) -> Result<Vec<UsageEvent>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT timestamp_ms, type, app_id
            FROM events
            WHERE timestamp_ms >= ? AND timestamp_ms < ?
            ORDER BY timestamp_ms ASC, rowid ASC
            ",
        )?;
        let rows = stmt.query_map(params![start_ms, end_ms], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut events = Vec::new();
        for row in rows {
            let (timestamp_ms, kind, app) = row?;
            let event_type: EventType = kind.parse()?;
            let app = if app.is_empty() {
                None
            } else {
                Some(AppId::new(app)?)
            };
            events.push(UsageEvent::from_parts(timestamp_ms, event_type, app)?);
        }
        Ok(events)
    }

    /// Returns the number of buffered events.
    pub fn event_count(&self) -> Result<i64, DbError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Deletes buffered events strictly before `before_ms`.
    pub fn prune_events_before(&mut self, before_ms: i64) -> Result<usize, DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM events WHERE timestamp_ms < ?", [before_ms])?;
        Ok(deleted)
    }

    /// Loads the stored collector state, if a pass has ever completed.
    pub fn load_state(&self) -> Result<Option<SessionState>, DbError> {
        let row = self
            .conn
            .query_row(
                "
                SELECT last_processed_ms, screen_interactive, active_app, segment_start_ms
                FROM collector_state
                WHERE id = 1
                ",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, bool>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<i64>>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((last_processed_ms, screen_interactive, active_app, segment_start_ms)) = row
        else {
            return Ok(None);
        };
        let active_app = active_app.map(AppId::new).transpose()?;
        Ok(Some(SessionState::from_parts(
            last_processed_ms,
            screen_interactive,
            active_app,
            segment_start_ms,
        )))
    }

    /// Runs one aggregation pass and commits its output together with the new state.
    ///
    /// Totals, intervals, and the new state are written in a single
    /// transaction. On error nothing is committed, so a retry starts again
    /// from the last stored state.
    pub fn apply_batch<Z: TimeZone>(
        &mut self,
        aggregator: &SessionAggregator<Z>,
        prev: &SessionState,
        events: &[UsageEvent],
        now_ms: i64,
    ) -> Result<BatchOutcome, DbError> {
        let tx = self.conn.transaction()?;
        let mut sink = StoreSink {
            conn: &tx,
            recorded_ms: 0,
        };
        let state = aggregator.process(prev, events, now_ms, &mut sink)?;
        let recorded_ms = sink.recorded_ms;
        save_state(&tx, &state)?;
        tx.commit()?;
        tracing::debug!(
            watermark = state.last_processed_ms,
            events = events.len(),
            recorded_ms,
            "batch committed"
        );
        Ok(BatchOutcome { state, recorded_ms })
    }

    /// Lists per-app totals for one day, largest first.
    pub fn daily_totals(&self, day: NaiveDate) -> Result<Vec<DailyTotal>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT app_id, duration_ms
            FROM daily_totals
            WHERE day = ? AND duration_ms > 0
            ORDER BY duration_ms DESC, app_id ASC
            ",
        )?;
        let rows = stmt.query_map([format_day(day)], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut totals = Vec::new();
        for row in rows {
            let (app, duration_ms) = row?;
            totals.push(DailyTotal {
                day,
                app: AppId::new(app)?,
                duration_ms,
            });
        }
        Ok(totals)
    }

    /// Lists the interval log for one day, in start order.
    pub fn intervals_for_day(&self, day: NaiveDate) -> Result<Vec<UsageSegment>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT app_id, start_ms, end_ms
            FROM intervals
            WHERE day = ?
            ORDER BY start_ms ASC, rowid ASC
            ",
        )?;
        let rows = stmt.query_map([format_day(day)], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        let mut segments = Vec::new();
        for row in rows {
            let (app, start_ms, end_ms) = row?;
            segments.push(UsageSegment {
                day,
                app: AppId::new(app)?,
                start_ms,
                end_ms,
            });
        }
        Ok(segments)
    }

    /// Lists every day with recorded usage, oldest first.
    pub fn recorded_days(&self) -> Result<Vec<NaiveDate>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT day FROM daily_totals ORDER BY day ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut days = Vec::new();
        for row in rows {
            days.push(parse_day(&row?)?);
        }
        Ok(days)
    }
}

/// Reference sink writing into an open transaction.
struct StoreSink<'a> {
    conn: &'a Connection,
    recorded_ms: i64,
}

impl UsageSink for StoreSink<'_> {
    type Error = DbError;

    fn record_duration(&mut self, day: NaiveDate, app: &AppId, delta_ms: i64) -> Result<(), DbError> {
        if delta_ms <= 0 {
            return Ok(());
        }
        self.conn
            .prepare_cached(
                "
                INSERT INTO daily_totals (day, app_id, duration_ms) VALUES (?, ?, ?)
                ON CONFLICT (day, app_id) DO UPDATE SET duration_ms = duration_ms + excluded.duration_ms
                ",
            )?
            .execute(params![format_day(day), app.as_str(), delta_ms])?;
        self.recorded_ms += delta_ms;
        Ok(())
    }

    fn record_interval(&mut self, segment: &UsageSegment) -> Result<(), DbError> {
        self.conn
            .prepare_cached(
                "INSERT INTO intervals (day, app_id, start_ms, end_ms) VALUES (?, ?, ?, ?)",
            )?
            .execute(params![
                format_day(segment.day),
                segment.app.as_str(),
                segment.start_ms,
                segment.end_ms,
            ])?;
        Ok(())
    }
}

fn save_state(conn: &Connection, state: &SessionState) -> Result<(), DbError> {
    conn.execute(
        "
        INSERT OR REPLACE INTO collector_state
        (id, last_processed_ms, screen_interactive, active_app, segment_start_ms)
        VALUES (1, ?, ?, ?, ?)
        ",
        params![
            state.last_processed_ms,
            state.screen_interactive,
            state.active_app().map(AppId::as_str),
            state.segment_start_ms(),
        ],
    )?;
    Ok(())
}

fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

fn parse_day(value: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, DAY_FORMAT).map_err(|source| DbError::InvalidDay {
        value: value.to_string(),
        source,
    })
}
