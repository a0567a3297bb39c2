//! Learner's self-reported recall strength for one review.
use crate::error::ScheduleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// Total failure to recall
    Again,
    /// Recalled with serious difficulty
    Hard,
    /// Recalled with normal effort
    Good,
    /// Recalled effortlessly
    Easy,
}

impl Quality {
    pub const ALL: [Quality; 4] = [Quality::Again, Quality::Hard, Quality::Good, Quality::Easy];

    /// Numeric strength on the 0-5 SM-2 scale. There is no rating for 2 or 4.
    pub fn strength(self) -> u8 {
        match self {
            Quality::Again => 0,
            Quality::Hard => 1,
            Quality::Good => 3,
            Quality::Easy => 5,
        }
    }

    pub fn is_lapse(self) -> bool {
        self == Quality::Again
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Again => "again",
            Quality::Hard => "hard",
            Quality::Good => "good",
            Quality::Easy => "easy",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rating = s.trim();
        Quality::ALL
            .into_iter()
            .find(|q| q.as_str().eq_ignore_ascii_case(rating))
            .ok_or_else(|| ScheduleError::InvalidQuality(s.to_string()))
    }
}
