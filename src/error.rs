//! Error types shared by the scheduler, the stores and the CLI.

use thiserror::Error;

/// Rejection raised before a transition is applied. Never leaves partial state behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid rating: {0:?} (expected again, hard, good or easy)")]
    InvalidQuality(String),
}

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt review row: {0}")]
    CorruptRow(String),

    #[error("Review store lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, ReviewError>;
