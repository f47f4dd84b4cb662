//! Network State
//!
//! Round progression, round-time window, participant set, node count,
//! Gini coefficient and violation counters. Owns the validator registry.
//! Mutated only by the tick loop.

use rand::Rng;
use std::collections::{HashSet, VecDeque};

use crate::config::MonitorConfig;
use crate::registry::ValidatorRegistry;
use crate::types::{ParticipantId, Round};

/// Fixed-capacity sliding window of round durations (seconds)
///
/// Always holds exactly `capacity` entries: seeded full, and every push
/// evicts the oldest value.
#[derive(Debug, Clone)]
pub struct RoundWindow {
    times: VecDeque<f64>,
    capacity: usize,
}

impl RoundWindow {
    /// Window of `capacity` slots, each seeded with `initial`
    pub fn filled(capacity: usize, initial: f64) -> Self {
        Self {
            times: std::iter::repeat(initial).take(capacity).collect(),
            capacity,
        }
    }

    /// Append a duration, evicting the oldest
    pub fn push(&mut self, duration: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.times.len() == self.capacity {
            self.times.pop_front();
        }
        self.times.push_back(duration);
    }

    /// Mean duration, 0.0 for an empty window
    pub fn average(&self) -> f64 {
        if self.times.is_empty() {
            return 0.0;
        }
        self.times.iter().sum::<f64>() / self.times.len() as f64
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn oldest(&self) -> Option<f64> {
        self.times.front().copied()
    }

    pub fn newest(&self) -> Option<f64> {
        self.times.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.times.iter()
    }
}

/// Simulated network-wide state
pub struct NetworkState {
    /// Latest consensus round
    round: Round,

    /// Recent round durations
    round_times: RoundWindow,

    /// Every participant address seen since start (never pruned)
    active_participants: HashSet<ParticipantId>,

    /// Total nodes, never below the master-node count
    total_network_nodes: u64,

    /// Fixed for the engine lifetime
    total_master_nodes: u64,

    gini_coefficient: f64,
    gini_bounds: (f64, f64),

    /// Cumulative since start
    pub safety_violations: u64,
    pub liveness_violations: u64,
    pub blame_messages: u64,

    /// Master-node set
    pub registry: ValidatorRegistry,
}

impl NetworkState {
    /// Create the initial state; validator values are randomized
    pub fn new<R: Rng + ?Sized>(config: &MonitorConfig, rng: &mut R) -> Self {
        let registry = ValidatorRegistry::initialize(config.total_master_nodes, rng)
            .with_dynamics(config.missed_round_probability, config.reset_period_rounds);
        let total_master_nodes = config.total_master_nodes as u64;

        Self {
            round: config.initial_round,
            round_times: RoundWindow::filled(config.round_window_size, config.initial_round_time_secs),
            active_participants: HashSet::new(),
            total_network_nodes: config.initial_network_nodes.max(total_master_nodes),
            total_master_nodes,
            gini_coefficient: config.initial_gini.clamp(config.gini_min, config.gini_max),
            gini_bounds: (config.gini_min, config.gini_max),
            safety_violations: 0,
            liveness_violations: 0,
            blame_messages: 0,
            registry,
        }
    }

    /// Move to the next round
    pub fn advance_round(&mut self) -> Round {
        self.round += 1;
        self.round
    }

    pub fn record_round_time(&mut self, duration: f64) {
        self.round_times.push(duration);
    }

    /// Add participants; returns how many were new
    pub fn record_participants<I>(&mut self, participants: I) -> usize
    where
        I: IntoIterator<Item = ParticipantId>,
    {
        participants
            .into_iter()
            .filter(|p| self.active_participants.insert(*p))
            .count()
    }

    /// Shift the node count, never below the master-node floor
    pub fn adjust_network_nodes(&mut self, delta: i64) {
        let adjusted = (self.total_network_nodes as i64).saturating_add(delta);
        self.total_network_nodes = adjusted.max(self.total_master_nodes as i64) as u64;
    }

    /// Shift the Gini coefficient, clamped to the configured band
    pub fn perturb_gini(&mut self, delta: f64) {
        let (min, max) = self.gini_bounds;
        self.gini_coefficient = (self.gini_coefficient + delta).clamp(min, max);
    }

    pub fn round(&self) -> Round {
        self.round
    }

    pub fn round_times(&self) -> &RoundWindow {
        &self.round_times
    }

    pub fn participant_count(&self) -> u64 {
        self.active_participants.len() as u64
    }

    pub fn total_network_nodes(&self) -> u64 {
        self.total_network_nodes
    }

    pub fn total_master_nodes(&self) -> u64 {
        self.total_master_nodes
    }

    pub fn gini_coefficient(&self) -> f64 {
        self.gini_coefficient
    }
}
