pub mod quality;
pub mod review_state;
pub mod sm2;

pub use quality::Quality;
pub use review_state::{
    DEFAULT_EASE_FACTOR, MAX_INTERVAL_DAYS, MIN_EASE_FACTOR, Phase, ReviewState, StateAnomaly,
};
