//! In-process review state store, used by tests and throwaway sessions.

use super::{PairKey, ReviewStateStore, StoredReview};
use crate::error::{Result, ReviewError, ScheduleError};
use crate::models::ReviewState;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
pub struct MemoryReviewStore {
    states: Mutex<HashMap<PairKey, ReviewState>>,
}

impl MemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn states(&self) -> Result<MutexGuard<'_, HashMap<PairKey, ReviewState>>> {
        self.states.lock().map_err(|_| ReviewError::LockPoisoned)
    }

    fn to_stored(key: &PairKey, state: &ReviewState) -> StoredReview {
        StoredReview {
            learner_id: key.learner_id.clone(),
            card_id: key.card_id.clone(),
            state: state.clone(),
        }
    }
}

impl ReviewStateStore for MemoryReviewStore {
    fn load(&self, key: &PairKey) -> Result<Option<ReviewState>> {
        Ok(self.states()?.get(key).cloned())
    }

    fn update<F>(&self, key: &PairKey, f: F) -> Result<ReviewState>
    where
        F: FnOnce(Option<&ReviewState>) -> std::result::Result<ReviewState, ScheduleError>,
    {
        let mut states = self.states()?;
        let next = f(states.get(key))?;
        states.insert(key.clone(), next.clone());
        Ok(next)
    }

    fn put(&self, key: &PairKey, state: &ReviewState) -> Result<()> {
        self.states()?.insert(key.clone(), state.clone());
        Ok(())
    }

    fn remove(&self, key: &PairKey) -> Result<bool> {
        Ok(self.states()?.remove(key).is_some())
    }

    fn due(&self, learner_id: &str, now: DateTime<Utc>) -> Result<Vec<StoredReview>> {
        let states = self.states()?;
        let mut due: Vec<StoredReview> = states
            .iter()
            .filter(|(key, state)| key.learner_id == learner_id && state.is_due(now))
            .map(|(key, state)| Self::to_stored(key, state))
            .collect();

        due.sort_by(|a, b| {
            a.state
                .next_review_at
                .cmp(&b.state.next_review_at)
                .then_with(|| a.card_id.cmp(&b.card_id))
        });
        Ok(due)
    }

    fn all(&self) -> Result<Vec<StoredReview>> {
        let states = self.states()?;
        let mut all: Vec<StoredReview> = states
            .iter()
            .map(|(key, state)| Self::to_stored(key, state))
            .collect();

        all.sort_by(|a, b| a.key().cmp(&b.key()));
        Ok(all)
    }
}
