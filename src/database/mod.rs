//! Persistence of review states, one per (learner, card) pair.
//!
//! The scheduler never touches storage; these stores are what the caller loads priors
//! from and persists results to.

pub mod db;
pub mod memory;

pub use db::SqliteReviewStore;
pub use memory::MemoryReviewStore;

use crate::error::{Result, ScheduleError};
use crate::models::ReviewState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the single review state owned by a learner-card pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    pub learner_id: String,
    pub card_id: String,
}

impl PairKey {
    pub fn new(learner_id: impl Into<String>, card_id: impl Into<String>) -> Self {
        Self {
            learner_id: learner_id.into(),
            card_id: card_id.into(),
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.learner_id, self.card_id)
    }
}

/// A review state together with the pair that owns it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReview {
    pub learner_id: String,
    pub card_id: String,
    pub state: ReviewState,
}

impl StoredReview {
    pub fn key(&self) -> PairKey {
        PairKey::new(self.learner_id.clone(), self.card_id.clone())
    }
}

pub trait ReviewStateStore {
    fn load(&self, key: &PairKey) -> Result<Option<ReviewState>>;

    /// Reads the prior state, computes the next one with `f` and persists it as one unit.
    /// Concurrent updates of the same pair never interleave. When `f` fails nothing is written.
    fn update<F>(&self, key: &PairKey, f: F) -> Result<ReviewState>
    where
        F: FnOnce(Option<&ReviewState>) -> std::result::Result<ReviewState, ScheduleError>;

    /// Overwrites the state of a pair.
    fn put(&self, key: &PairKey, state: &ReviewState) -> Result<()>;

    /// Drops the pair's state, e.g. on unenrollment. Returns whether a state existed.
    fn remove(&self, key: &PairKey) -> Result<bool>;

    /// Cards of `learner_id` due at `now`, oldest first.
    fn due(&self, learner_id: &str, now: DateTime<Utc>) -> Result<Vec<StoredReview>>;

    fn all(&self) -> Result<Vec<StoredReview>>;
}
