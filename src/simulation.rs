//! Simulation Context
//!
//! Owns the network state and the RNG driving it. One call to [`Simulation::tick`]
//! performs a full simulation step and yields the snapshot to broadcast.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::MonitorConfig;
use crate::network_state::NetworkState;
use crate::snapshot::SnapshotBuilder;
use crate::types::{ParticipantId, Snapshot};
use crate::violations::{ViolationInjector, ViolationReport};

/// Round durations are drawn from [MIN, MAX) seconds
pub const MIN_ROUND_TIME: f64 = 1.8;
pub const MAX_ROUND_TIME: f64 = 2.2;

/// New participants observed per round
pub const MIN_NEW_PARTICIPANTS: usize = 10;
pub const MAX_NEW_PARTICIPANTS: usize = 50;

/// Nodes joining (or leaving) per round
pub const MAX_NODE_CHURN: i64 = 5;

/// Gini coefficient moves by at most half this per round
pub const GINI_DRIFT: f64 = 0.001;

/// Result of a single tick
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub snapshot: Snapshot,
    pub violations: ViolationReport,
}

/// Owned simulation context
pub struct Simulation {
    state: NetworkState,
    rng: StdRng,
    injector: ViolationInjector,
    builder: SnapshotBuilder,
}

impl Simulation {
    /// Create a simulation; seeded when the config carries an RNG seed
    pub fn new(config: &MonitorConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    pub fn with_rng(config: &MonitorConfig, mut rng: StdRng) -> Self {
        let state = NetworkState::new(config, &mut rng);

        Self {
            state,
            rng,
            injector: ViolationInjector::new(
                config.safety_violation_probability,
                config.liveness_violation_probability,
            ),
            builder: SnapshotBuilder::new(config.nakamoto_consensus, config.snapshot_sample_size),
        }
    }

    /// Advance the network by one round and build its snapshot
    pub fn tick(&mut self) -> TickOutcome {
        let round = self.state.advance_round();

        let round_time = self.rng.gen_range(MIN_ROUND_TIME..MAX_ROUND_TIME);
        self.state.record_round_time(round_time);

        let tx_count = self.rng.gen_range(MIN_NEW_PARTICIPANTS..=MAX_NEW_PARTICIPANTS);
        let participants: Vec<ParticipantId> = (0..tx_count).map(|_| self.rng.gen()).collect();
        let new_participants = self.state.record_participants(participants);

        let churn = self.rng.gen_range(-MAX_NODE_CHURN..=MAX_NODE_CHURN);
        self.state.adjust_network_nodes(churn);

        let drift = (self.rng.gen::<f64>() - 0.5) * GINI_DRIFT;
        self.state.perturb_gini(drift);

        let violations = self.injector.inject(&mut self.state, &mut self.rng);

        self.state.registry.apply_periodic_update(round, &mut self.rng);

        let snapshot = self.builder.build(&self.state, &mut self.rng);

        debug!(
            "Round {}: {:.3}s, +{} participants, {} nodes, nakamoto_stake={}",
            round,
            round_time,
            new_participants,
            self.state.total_network_nodes(),
            snapshot.decentralization_security.nakamoto_stake
        );

        TickOutcome { snapshot, violations }
    }

    pub fn state(&self) -> &NetworkState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut NetworkState {
        &mut self.state
    }
}
