//! SQLite-backed review state store
//!
//! Handles SQLite database initialization and the read-schedule-persist cycle
//! for SM-2 review states, one row per (learner, card) pair.

use super::{PairKey, ReviewStateStore, StoredReview};
use crate::error::{Result, ReviewError, ScheduleError};
use crate::models::ReviewState;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

const SELECT_COLUMNS: &str = "learner_id, card_id, ease_factor, interval_days, repetitions, \
     last_reviewed_at, next_review_at";

/// Creates the review_states table if needed
pub fn init_database(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS review_states (
            learner_id TEXT NOT NULL,
            card_id TEXT NOT NULL,
            ease_factor REAL,
            interval_days INTEGER NOT NULL,
            repetitions INTEGER NOT NULL,
            last_reviewed_at INTEGER NOT NULL,
            next_review_at INTEGER NOT NULL,
            PRIMARY KEY (learner_id, card_id)
        )",
        (),
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_review_states_due
         ON review_states (learner_id, next_review_at)",
        (),
    )?;

    Ok(())
}

/// Column values as stored, before validation.
struct RawRow {
    learner_id: String,
    card_id: String,
    ease_factor: Option<f64>,
    interval_days: i64,
    repetitions: i64,
    last_reviewed_at: i64,
    next_review_at: i64,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            learner_id: row.get(0)?,
            card_id: row.get(1)?,
            ease_factor: row.get(2)?,
            interval_days: row.get(3)?,
            repetitions: row.get(4)?,
            last_reviewed_at: row.get(5)?,
            next_review_at: row.get(6)?,
        })
    }

    /// Out-of-range counters are clamped here; ease and interval bounds are
    /// left for the scheduler's repair path.
    fn into_stored(self) -> Result<StoredReview> {
        let key = PairKey::new(self.learner_id, self.card_id);

        let state = ReviewState {
            // NaN is stored as NULL
            ease_factor: self.ease_factor.unwrap_or(f64::NAN),
            interval_days: clamp_count(self.interval_days, "interval_days", &key),
            repetitions: clamp_count(self.repetitions, "repetitions", &key),
            last_reviewed_at: from_millis(self.last_reviewed_at, "last_reviewed_at", &key)?,
            next_review_at: from_millis(self.next_review_at, "next_review_at", &key)?,
        };

        Ok(StoredReview {
            learner_id: key.learner_id,
            card_id: key.card_id,
            state,
        })
    }
}

fn clamp_count(value: i64, column: &str, key: &PairKey) -> u32 {
    match u32::try_from(value) {
        Ok(count) => count,
        Err(_) if value < 0 => {
            warn!(pair = %key, column, value, "negative value in review row, clamping to 0");
            0
        }
        Err(_) => {
            warn!(pair = %key, column, value, "oversized value in review row, clamping");
            u32::MAX
        }
    }
}

fn from_millis(value: i64, column: &str, key: &PairKey) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value)
        .ok_or_else(|| ReviewError::CorruptRow(format!("{key}: {column} = {value} is out of range")))
}

fn select_state(conn: &Connection, key: &PairKey) -> Result<Option<ReviewState>> {
    let raw = conn
        .query_row(
            &format!(
                "SELECT {SELECT_COLUMNS} FROM review_states WHERE learner_id = ?1 AND card_id = ?2"
            ),
            params![key.learner_id, key.card_id],
            RawRow::from_row,
        )
        .optional()?;

    raw.map(|raw| raw.into_stored().map(|stored| stored.state))
        .transpose()
}

fn upsert_state(conn: &Connection, key: &PairKey, state: &ReviewState) -> Result<()> {
    conn.execute(
        "INSERT INTO review_states
            (learner_id, card_id, ease_factor, interval_days, repetitions, last_reviewed_at, next_review_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT (learner_id, card_id) DO UPDATE SET
            ease_factor = excluded.ease_factor,
            interval_days = excluded.interval_days,
            repetitions = excluded.repetitions,
            last_reviewed_at = excluded.last_reviewed_at,
            next_review_at = excluded.next_review_at",
        params![
            key.learner_id,
            key.card_id,
            state.ease_factor,
            state.interval_days,
            state.repetitions,
            state.last_reviewed_at.timestamp_millis(),
            state.next_review_at.timestamp_millis(),
        ],
    )?;
    Ok(())
}

fn collect_rows(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<StoredReview>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, RawRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter().map(RawRow::into_stored).collect()
}

/// Review states in a SQLite database. Clones share the same connection.
#[derive(Clone)]
pub struct SqliteReviewStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteReviewStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening review database");
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        init_database(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| ReviewError::LockPoisoned)
    }
}

impl ReviewStateStore for SqliteReviewStore {
    fn load(&self, key: &PairKey) -> Result<Option<ReviewState>> {
        let conn = self.connection()?;
        select_state(&conn, key)
    }

    fn update<F>(&self, key: &PairKey, f: F) -> Result<ReviewState>
    where
        F: FnOnce(Option<&ReviewState>) -> std::result::Result<ReviewState, ScheduleError>,
    {
        let mut conn = self.connection()?;
        // Write lock is held from before the prior is read until commit.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let prior = select_state(&tx, key)?;
        let next = f(prior.as_ref())?;
        upsert_state(&tx, key, &next)?;

        tx.commit()?;
        Ok(next)
    }

    fn put(&self, key: &PairKey, state: &ReviewState) -> Result<()> {
        let conn = self.connection()?;
        upsert_state(&conn, key, state)
    }

    fn remove(&self, key: &PairKey) -> Result<bool> {
        let conn = self.connection()?;
        let deleted = conn.execute(
            "DELETE FROM review_states WHERE learner_id = ?1 AND card_id = ?2",
            params![key.learner_id, key.card_id],
        )?;
        Ok(deleted > 0)
    }

    fn due(&self, learner_id: &str, now: DateTime<Utc>) -> Result<Vec<StoredReview>> {
        let conn = self.connection()?;
        collect_rows(
            &conn,
            &format!(
                "SELECT {SELECT_COLUMNS} FROM review_states
                 WHERE learner_id = ?1 AND next_review_at <= ?2
                 ORDER BY next_review_at ASC, card_id ASC"
            ),
            params![learner_id, now.timestamp_millis()],
        )
    }

    fn all(&self) -> Result<Vec<StoredReview>> {
        let conn = self.connection()?;
        collect_rows(
            &conn,
            &format!("SELECT {SELECT_COLUMNS} FROM review_states ORDER BY learner_id, card_id"),
            (),
        )
    }
}
