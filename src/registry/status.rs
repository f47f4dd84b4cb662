//! Validator Status Rules
//!
//! Classifies a validator from its recent missed rounds and uptime.
//! Uptime ranges from 90-100, missed rounds reset every period.

use crate::types::ValidatorStatus;

/// Uptime floor; repeated misses never push uptime below this
pub const MIN_UPTIME: f64 = 90.0;

/// Uptime below which a validator is reported offline
pub const OFFLINE_UPTIME: f64 = 95.0;

/// Missed rounds above which a validator is reported offline
pub const OFFLINE_MISSED_ROUNDS: u32 = 5;

/// Range fresh (or reset) uptimes are drawn from
pub const FRESH_UPTIME_MIN: f64 = 98.0;
pub const FRESH_UPTIME_MAX: f64 = 100.0;

/// Uptime lost per missed round
pub mod penalties {
    pub const MISS_UPTIME_MIN: f64 = 0.01;
    pub const MISS_UPTIME_MAX: f64 = 0.1;
}

/// Status for a non-slashed validator
pub fn classify(missed_rounds: u32, uptime: f64) -> ValidatorStatus {
    if missed_rounds > OFFLINE_MISSED_ROUNDS || uptime < OFFLINE_UPTIME {
        ValidatorStatus::Offline
    } else if missed_rounds > 0 {
        ValidatorStatus::Warning
    } else {
        ValidatorStatus::Online
    }
}

/// Apply one missed round's uptime penalty
pub fn penalize_uptime(uptime: f64, penalty: f64) -> f64 {
    (uptime - penalty).max(MIN_UPTIME)
}
