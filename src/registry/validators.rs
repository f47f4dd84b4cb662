//! Validator storage and per-round mutation rules

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use super::status::{self, penalties, FRESH_UPTIME_MAX, FRESH_UPTIME_MIN};
use super::RegistryStats;
use crate::types::{format_address, round_to, ParticipantId, Round, Validator, ValidatorStatus};

/// Mean initial stake per validator
pub const BASE_STAKE: f64 = 10_000_000.0;

/// Initial stakes spread uniformly over BASE_STAKE ± STAKE_SPREAD / 2
pub const STAKE_SPREAD: f64 = 2_000_000.0;

/// Fraction of stake kept after slashing
pub const SLASH_RETAIN: f64 = 0.95;

/// Default per-tick probability of a missed round
pub const DEFAULT_MISS_PROBABILITY: f64 = 0.02;

/// Default rounds between missed-round resets
pub const DEFAULT_RESET_PERIOD: u64 = 500;

/// Fixed-cardinality set of master nodes
pub struct ValidatorRegistry {
    validators: Vec<Validator>,

    /// Per-tick probability a validator misses a round
    miss_probability: f64,

    /// Missed rounds and uptime are reset on rounds divisible by this
    reset_period: u64,
}

impl ValidatorRegistry {
    /// Create `count` freshly-online validators with randomized uptime and stake
    pub fn initialize<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Self {
        let validators = (0..count)
            .map(|_| {
                let mut address: ParticipantId = [0u8; 20];
                rng.fill(&mut address);

                let uptime = FRESH_UPTIME_MIN + rng.gen::<f64>() * (FRESH_UPTIME_MAX - FRESH_UPTIME_MIN);
                let stake = BASE_STAKE + (rng.gen::<f64>() - 0.5) * STAKE_SPREAD;

                Validator {
                    id: format_address(&address),
                    uptime_7d: round_to(uptime, 2),
                    missed_rounds_24h: 0,
                    stake,
                    status: ValidatorStatus::Online,
                }
            })
            .collect();

        Self {
            validators,
            miss_probability: DEFAULT_MISS_PROBABILITY,
            reset_period: DEFAULT_RESET_PERIOD,
        }
    }

    /// Build from explicit records (fixtures and replays)
    pub fn from_validators(validators: Vec<Validator>) -> Self {
        Self {
            validators,
            miss_probability: DEFAULT_MISS_PROBABILITY,
            reset_period: DEFAULT_RESET_PERIOD,
        }
    }

    /// Override the missed-round dynamics
    pub fn with_dynamics(mut self, miss_probability: f64, reset_period: u64) -> Self {
        self.miss_probability = miss_probability.clamp(0.0, 1.0);
        self.reset_period = reset_period.max(1);
        self
    }

    /// Advance every non-slashed validator by one round
    pub fn apply_periodic_update<R: Rng + ?Sized>(&mut self, current_round: Round, rng: &mut R) {
        let reset = current_round % self.reset_period == 0;

        for v in self.validators.iter_mut().filter(|v| !v.is_slashed()) {
            if rng.gen_bool(self.miss_probability) {
                v.missed_rounds_24h += 1;
                let penalty = rng.gen_range(penalties::MISS_UPTIME_MIN..=penalties::MISS_UPTIME_MAX);
                v.uptime_7d = status::penalize_uptime(v.uptime_7d, penalty);
            }

            if reset {
                v.missed_rounds_24h = 0;
                v.uptime_7d = FRESH_UPTIME_MIN + rng.gen::<f64>() * (FRESH_UPTIME_MAX - FRESH_UPTIME_MIN);
            }

            v.status = status::classify(v.missed_rounds_24h, v.uptime_7d);
        }

        if reset {
            debug!("Round {}: validator missed rounds and uptime reset", current_round);
        }
    }

    /// Slash one validator chosen uniformly at random
    ///
    /// Returns the slashed validator's id, or `None` for an empty registry.
    pub fn slash_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<String> {
        let v = self.validators.choose_mut(rng)?;
        v.status = ValidatorStatus::Slashed;
        v.stake *= SLASH_RETAIN;
        Some(v.id.clone())
    }

    /// Up to `n` distinct validators chosen uniformly without replacement
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<Validator> {
        let amount = n.min(self.validators.len());
        self.validators
            .choose_multiple(rng, amount)
            .cloned()
            .collect()
    }

    /// Current stake of every validator, in registry order
    pub fn stakes(&self) -> Vec<f64> {
        self.validators.iter().map(|v| v.stake).collect()
    }

    pub fn total_stake(&self) -> f64 {
        self.validators.iter().map(|v| v.stake).sum()
    }

    pub fn get(&self, id: &str) -> Option<&Validator> {
        self.validators.iter().find(|v| v.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Validator> {
        self.validators.iter()
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Status breakdown
    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            total: self.validators.len(),
            total_stake: self.total_stake(),
            ..Default::default()
        };

        for v in &self.validators {
            match v.status {
                ValidatorStatus::Online => stats.online += 1,
                ValidatorStatus::Warning => stats.warning += 1,
                ValidatorStatus::Offline => stats.offline += 1,
                ValidatorStatus::Slashed => stats.slashed += 1,
            }
        }

        stats
    }
}
