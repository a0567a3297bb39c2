//! Memory model of one (learner, card) pair.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
/// Keeps `next_review_at` inside chrono's calendar range.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// SM-2 review state. `next_review_at` is always `last_reviewed_at + interval_days`
/// for states produced by the scheduler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    pub ease_factor: f64,
    #[serde(rename = "interval")]
    pub interval_days: u32,
    pub repetitions: u32,
    pub last_reviewed_at: DateTime<Utc>,
    pub next_review_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Fixed 1 and 6 day steps, including right after a lapse
    Learning,
    /// Intervals grow multiplicatively
    Mature,
}

/// Inconsistency found in a stored state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateAnomaly {
    NonFiniteEase(f64),
    EaseBelowFloor(f64),
    IntervalAboveCap(u32),
    ZeroInterval,
    NextReviewMismatch {
        expected: DateTime<Utc>,
        found: DateTime<Utc>,
    },
}

impl fmt::Display for StateAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateAnomaly::NonFiniteEase(ef) => write!(f, "ease factor {ef} is not finite"),
            StateAnomaly::EaseBelowFloor(ef) => {
                write!(f, "ease factor {ef} is below {MIN_EASE_FACTOR}")
            }
            StateAnomaly::IntervalAboveCap(days) => {
                write!(f, "interval {days} exceeds {MAX_INTERVAL_DAYS} days")
            }
            StateAnomaly::ZeroInterval => f.write_str("interval is zero on a reviewed state"),
            StateAnomaly::NextReviewMismatch { expected, found } => {
                write!(f, "next review at {found} but interval implies {expected}")
            }
        }
    }
}

/// Adds whole days, saturating at the end of the calendar.
pub fn add_days(at: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    at.checked_add_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl ReviewState {
    /// Builds a consistent state: `next_review_at` is derived from `reviewed_at`.
    pub fn new(
        ease_factor: f64,
        interval_days: u32,
        repetitions: u32,
        reviewed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            ease_factor,
            interval_days,
            repetitions,
            last_reviewed_at: reviewed_at,
            next_review_at: add_days(reviewed_at, interval_days),
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }

    pub fn phase(&self) -> Phase {
        if self.repetitions >= 3 {
            Phase::Mature
        } else {
            Phase::Learning
        }
    }

    pub fn anomalies(&self) -> Vec<StateAnomaly> {
        let mut found = Vec::new();

        if !self.ease_factor.is_finite() {
            found.push(StateAnomaly::NonFiniteEase(self.ease_factor));
        } else if self.ease_factor < MIN_EASE_FACTOR {
            found.push(StateAnomaly::EaseBelowFloor(self.ease_factor));
        }

        if self.interval_days > MAX_INTERVAL_DAYS {
            found.push(StateAnomaly::IntervalAboveCap(self.interval_days));
        } else if self.interval_days == 0 {
            found.push(StateAnomaly::ZeroInterval);
        }

        let expected = add_days(self.last_reviewed_at, self.interval_days);
        if expected != self.next_review_at {
            found.push(StateAnomaly::NextReviewMismatch {
                expected,
                found: self.next_review_at,
            });
        }

        found
    }

    /// Clamps a possibly corrupt state back inside the invariants.
    /// A zero interval is left alone; the scheduler recomputes it.
    pub fn repaired(&self) -> ReviewState {
        let ease_factor = if self.ease_factor.is_finite() {
            self.ease_factor.max(MIN_EASE_FACTOR)
        } else {
            DEFAULT_EASE_FACTOR
        };
        let interval_days = self.interval_days.min(MAX_INTERVAL_DAYS);

        ReviewState::new(
            ease_factor,
            interval_days,
            self.repetitions,
            self.last_reviewed_at,
        )
    }
}
