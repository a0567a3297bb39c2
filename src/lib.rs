pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod reviewer;

pub use database::{MemoryReviewStore, PairKey, ReviewStateStore, SqliteReviewStore, StoredReview};
pub use error::{ReviewError, ScheduleError};
pub use models::{Quality, ReviewState, sm2};
pub use reviewer::Reviewer;
