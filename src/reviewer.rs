//! Review flow for a single learner-card pair.
//! Loads the prior state, runs the SM-2 transition and persists the result as one unit.

use crate::database::{PairKey, ReviewStateStore, StoredReview};
use crate::error::Result;
use crate::models::{Quality, ReviewState, sm2};
use chrono::{DateTime, Utc};
use tracing::info;

/// Applies ratings to review states held in a store.
/// Identity and access checks happen before a rating reaches this type.
pub struct Reviewer<S> {
    store: S,
}

impl<S: ReviewStateStore> Reviewer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Grades a card and returns its new state.
    /// An invalid rating is rejected before the store is touched.
    pub fn review(
        &self,
        learner_id: &str,
        card_id: &str,
        rating: &str,
        now: DateTime<Utc>,
    ) -> Result<ReviewState> {
        let quality: Quality = rating.parse()?;
        self.review_with(learner_id, card_id, quality, now)
    }

    pub fn review_with(
        &self,
        learner_id: &str,
        card_id: &str,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> Result<ReviewState> {
        let key = PairKey::new(learner_id, card_id);
        let next = self
            .store
            .update(&key, |prior| Ok(sm2::schedule(prior, quality, now)))?;

        info!(
            pair = %key,
            %quality,
            repetitions = next.repetitions,
            interval = next.interval_days,
            ease_factor = next.ease_factor,
            next_review_at = %next.next_review_at,
            "review recorded"
        );
        Ok(next)
    }

    pub fn state(&self, learner_id: &str, card_id: &str) -> Result<Option<ReviewState>> {
        self.store.load(&PairKey::new(learner_id, card_id))
    }

    /// What each rating would do to the card right now, without saving anything.
    pub fn preview(
        &self,
        learner_id: &str,
        card_id: &str,
        now: DateTime<Utc>,
    ) -> Result<[(Quality, ReviewState); 4]> {
        let prior = self.state(learner_id, card_id)?;
        Ok(sm2::preview(prior.as_ref(), now))
    }

    pub fn due(&self, learner_id: &str, now: DateTime<Utc>) -> Result<Vec<StoredReview>> {
        self.store.due(learner_id, now)
    }

    /// Drops the pair's history; the next review starts from the first-review table again.
    pub fn forget(&self, learner_id: &str, card_id: &str) -> Result<bool> {
        let key = PairKey::new(learner_id, card_id);
        let removed = self.store.remove(&key)?;
        if removed {
            info!(pair = %key, "review state removed");
        }
        Ok(removed)
    }
}
