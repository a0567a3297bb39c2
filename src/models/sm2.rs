//! SM-2 (SuperMemo 2) review scheduler.
//!
//! Computes the next memory state of a single (learner, card) pair from its prior state
//! and a recall rating:
//! - The first review seeds the state from a fixed table, there is no history to extrapolate from
//! - `again` is a lapse: repetitions reset to 0 and the card comes back the next day
//! - Passes step through fixed intervals (1 day, then 6 days) before growing by the ease factor
//! - The ease factor moves by `0.1 - (5-q) * (0.08 + (5-q) * 0.02)` and never falls below 1.3
//!
//! Everything here is pure: the caller supplies `now` and persists the result.

use super::quality::Quality;
use super::review_state::{MAX_INTERVAL_DAYS, MIN_EASE_FACTOR, ReviewState};
use crate::error::ScheduleError;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Change applied to the ease factor for a rating.
pub fn ease_delta(quality: Quality) -> f64 {
    let distance = 5.0 - f64::from(quality.strength());
    0.1 - distance * (0.08 + distance * 0.02)
}

/// (repetitions, interval days, ease factor) for a pair's first review.
fn seed(quality: Quality) -> (u32, u32, f64) {
    match quality {
        Quality::Again => (0, 1, 2.5),
        Quality::Hard => (1, 1, 2.0),
        Quality::Good => (1, 1, 2.5),
        Quality::Easy => (1, 4, 2.6),
    }
}

/// Computes the state after reviewing a card with `quality` at `now`.
/// `prior` is `None` on the pair's first review.
pub fn schedule(prior: Option<&ReviewState>, quality: Quality, now: DateTime<Utc>) -> ReviewState {
    let Some(prior) = prior else {
        let (repetitions, interval, ease_factor) = seed(quality);
        debug!(%quality, interval, "seeding first review");
        return ReviewState::new(ease_factor, interval, repetitions, now);
    };

    let anomalies = prior.anomalies();
    for anomaly in &anomalies {
        warn!(%anomaly, "repairing prior review state");
    }
    let prior = if anomalies.is_empty() {
        prior.clone()
    } else {
        prior.repaired()
    };

    let ease_factor = (prior.ease_factor + ease_delta(quality)).max(MIN_EASE_FACTOR);

    let repetitions = if quality.is_lapse() {
        0
    } else {
        prior.repetitions.saturating_add(1)
    };

    let interval = match repetitions {
        0 | 1 => 1, // After a lapse or the first pass since one
        2 => 6,
        _ => {
            let grown = (f64::from(prior.interval_days) * ease_factor).round() as u32;
            grown.clamp(1, MAX_INTERVAL_DAYS)
        }
    };

    debug!(
        %quality,
        prior_interval = prior.interval_days,
        prior_repetitions = prior.repetitions,
        interval,
        repetitions,
        ease_factor,
        "scheduled review"
    );

    ReviewState::new(ease_factor, interval, repetitions, now)
}

/// Parses a raw rating and schedules it. An invalid rating fails before any computation.
pub fn schedule_rating(
    prior: Option<&ReviewState>,
    rating: &str,
    now: DateTime<Utc>,
) -> Result<ReviewState, ScheduleError> {
    let quality: Quality = rating.parse()?;
    Ok(schedule(prior, quality, now))
}

/// Outcome of every rating, without committing any of them.
pub fn preview(prior: Option<&ReviewState>, now: DateTime<Utc>) -> [(Quality, ReviewState); 4] {
    Quality::ALL.map(|quality| (quality, schedule(prior, quality, now)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::review_state::Phase;
    use chrono::{Duration, TimeZone};

    const EPS: f64 = 1e-9;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap()
    }

    fn prior(repetitions: u32, interval_days: u32, ease_factor: f64) -> ReviewState {
        ReviewState::new(ease_factor, interval_days, repetitions, t0() - Duration::days(30))
    }

    #[test]
    fn test_ease_delta_values() {
        assert!((ease_delta(Quality::Again) - -0.8).abs() < EPS);
        assert!((ease_delta(Quality::Hard) - -0.54).abs() < EPS);
        assert!((ease_delta(Quality::Good) - -0.14).abs() < EPS);
        assert!((ease_delta(Quality::Easy) - 0.1).abs() < EPS);
    }

    #[test]
    fn test_first_review_good() {
        let next = schedule(None, Quality::Good, t0());
        assert_eq!(next.repetitions, 1);
        assert_eq!(next.interval_days, 1);
        assert!((next.ease_factor - 2.5).abs() < EPS);
        assert_eq!(next.last_reviewed_at, t0());
        assert_eq!(next.next_review_at, t0() + Duration::days(1));
    }

    #[test]
    fn test_first_review_easy() {
        let next = schedule(None, Quality::Easy, t0());
        assert_eq!(next.repetitions, 1);
        assert_eq!(next.interval_days, 4);
        assert!((next.ease_factor - 2.6).abs() < EPS);
        assert_eq!(next.next_review_at, t0() + Duration::days(4));
    }

    #[test]
    fn test_first_review_table() {
        let expected = [
            (Quality::Again, 0, 1, 2.5),
            (Quality::Hard, 1, 1, 2.0),
            (Quality::Good, 1, 1, 2.5),
            (Quality::Easy, 1, 4, 2.6),
        ];
        for (quality, repetitions, interval, ease) in expected {
            let next = schedule(None, quality, t0());
            assert_eq!(next.repetitions, repetitions, "{quality}");
            assert_eq!(next.interval_days, interval, "{quality}");
            assert!((next.ease_factor - ease).abs() < EPS, "{quality}");
        }
    }

    #[test]
    fn test_first_review_ignores_now() {
        let later = t0() + Duration::days(400);
        for quality in Quality::ALL {
            let a = schedule(None, quality, t0());
            let b = schedule(None, quality, later);
            assert_eq!(
                (a.repetitions, a.interval_days, a.ease_factor),
                (b.repetitions, b.interval_days, b.ease_factor)
            );
            assert_eq!(b.next_review_at - a.next_review_at, Duration::days(400));
        }
    }

    #[test]
    fn test_second_review() {
        let next = schedule(Some(&prior(1, 1, 2.5)), Quality::Good, t0());
        assert_eq!(next.repetitions, 2);
        assert_eq!(next.interval_days, 6);
        assert!((next.ease_factor - (2.5 + ease_delta(Quality::Good))).abs() < EPS);
        assert_eq!(next.next_review_at, t0() + Duration::days(6));
    }

    #[test]
    fn test_third_review_multiplies() {
        let next = schedule(Some(&prior(2, 6, 2.5)), Quality::Good, t0());
        assert_eq!(next.repetitions, 3);
        // 6 * 2.36 = 14.16
        assert_eq!(next.interval_days, 14);
        assert_eq!(next.phase(), Phase::Mature);
    }

    #[test]
    fn test_lapse_resets_and_clamps_ease() {
        let next = schedule(Some(&prior(5, 40, 1.35)), Quality::Again, t0());
        assert_eq!(next.repetitions, 0);
        assert!((next.ease_factor - MIN_EASE_FACTOR).abs() < EPS);
        assert_eq!(next.interval_days, 1);

        // Lapsed card re-enters the fixed steps
        let after = schedule(Some(&next), Quality::Good, t0() + Duration::days(1));
        assert_eq!(after.repetitions, 1);
        assert_eq!(after.interval_days, 1);
    }

    #[test]
    fn test_lapse_keeps_accumulated_ease() {
        let next = schedule(Some(&prior(4, 30, 2.4)), Quality::Again, t0());
        assert!((next.ease_factor - 1.6).abs() < EPS);
    }

    #[test]
    fn test_hard_is_a_weak_pass() {
        let next = schedule(Some(&prior(2, 6, 2.5)), Quality::Hard, t0());
        assert_eq!(next.repetitions, 3);
        assert!((next.ease_factor - 1.96).abs() < EPS);
        // 6 * 1.96 = 11.76
        assert_eq!(next.interval_days, 12);
    }

    #[test]
    fn test_easy_grows_ease() {
        let next = schedule(Some(&prior(1, 1, 2.5)), Quality::Easy, t0());
        assert!((next.ease_factor - 2.6).abs() < EPS);
        assert_eq!(next.interval_days, 6);
    }

    #[test]
    fn test_corrupt_prior_is_repaired() {
        let mut corrupt = prior(3, 10, 0.9);
        corrupt.next_review_at = corrupt.last_reviewed_at;

        let next = schedule(Some(&corrupt), Quality::Good, t0());
        // Scheduled from ease 1.3, floored again after the delta
        assert!((next.ease_factor - MIN_EASE_FACTOR).abs() < EPS);
        assert_eq!(next.interval_days, 13);
        assert_eq!(next.repetitions, 4);
        assert!(next.anomalies().is_empty());
    }

    #[test]
    fn test_zero_interval_prior_never_schedules_zero() {
        let next = schedule(Some(&prior(5, 0, 2.5)), Quality::Easy, t0());
        assert_eq!(next.interval_days, 1);
    }

    #[test]
    fn test_interval_is_capped() {
        let next = schedule(Some(&prior(9, MAX_INTERVAL_DAYS, 2.8)), Quality::Easy, t0());
        assert_eq!(next.interval_days, MAX_INTERVAL_DAYS);
    }

    #[test]
    fn test_schedule_rating_rejects_without_mutation() {
        let before = prior(2, 6, 2.5);
        let snapshot = before.clone();

        let err = schedule_rating(Some(&before), "excellent", t0()).unwrap_err();
        assert_eq!(err, ScheduleError::InvalidQuality("excellent".to_string()));
        assert_eq!(before, snapshot);

        let valid = schedule_rating(Some(&before), "good", t0()).unwrap();
        assert_eq!(valid, schedule(Some(&snapshot), Quality::Good, t0()));
    }

    #[test]
    fn test_preview_matches_schedule() {
        let state = prior(2, 6, 2.5);
        let options = preview(Some(&state), t0());
        for (quality, outcome) in &options {
            assert_eq!(*outcome, schedule(Some(&state), *quality, t0()));
        }
        assert_eq!(options[0].1.repetitions, 0);
        assert!(options[3].1.interval_days >= options[2].1.interval_days);
    }

    #[test]
    fn test_repeated_easy_intervals_never_shrink() {
        let mut state: Option<ReviewState> = None;
        let mut now = t0();
        let mut last_interval = 0;

        for _ in 0..25 {
            let next = schedule(state.as_ref(), Quality::Easy, now);
            if next.repetitions >= 3 {
                assert!(next.interval_days >= last_interval);
            }
            last_interval = next.interval_days;
            now = next.next_review_at;
            state = Some(next);
        }

        let state = state.unwrap();
        assert_eq!(state.interval_days, MAX_INTERVAL_DAYS);
        assert_eq!(state.repetitions, 25);
    }

    #[test]
    fn test_interval_grows_exponentially() {
        let mut state = schedule(None, Quality::Good, t0());
        for _ in 0..5 {
            state = schedule(Some(&state), Quality::Good, state.next_review_at);
        }
        assert_eq!(state.repetitions, 6);
        assert!(state.interval_days > 30);
    }

    /// Walks every rating sequence up to `depth` reviews, starting from no state.
    fn walk(
        state: Option<&ReviewState>,
        now: DateTime<Utc>,
        depth: usize,
        visit: &mut dyn FnMut(Option<&ReviewState>, Quality, &ReviewState),
    ) {
        if depth == 0 {
            return;
        }
        for quality in Quality::ALL {
            let next = schedule(state, quality, now);
            visit(state, quality, &next);
            walk(Some(&next), next.next_review_at, depth - 1, visit);
        }
    }

    #[test]
    fn test_all_sequences_keep_invariants() {
        let mut checked = 0;
        walk(None, t0(), 6, &mut |prior, quality, next| {
            checked += 1;
            assert!(next.ease_factor >= MIN_EASE_FACTOR);
            assert!(next.interval_days >= 1);
            assert!(next.anomalies().is_empty());

            if let Some(prior) = prior {
                if quality == Quality::Again {
                    assert_eq!(next.repetitions, 0);
                } else {
                    assert_eq!(next.repetitions, prior.repetitions + 1);
                    if next.repetitions >= 3 {
                        assert!(next.interval_days >= prior.interval_days);
                    }
                }
            }
        });
        // 4 + 4^2 + ... + 4^6
        assert_eq!(checked, 5460);
    }
}
