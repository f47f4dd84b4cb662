//! Snapshot Builder
//!
//! Aggregates the network state into the payload pushed to subscribers.

use rand::Rng;

use crate::nakamoto;
use crate::network_state::NetworkState;
use crate::types::{round_to, DecentralizationSecurity, NetworkHealth, Snapshot, Validator};

/// Rounds of confirmation before a transaction is final
pub const FINALITY_ROUNDS: f64 = 3.0;

/// Transactions per round are drawn from this range
pub const MIN_TXS_PER_ROUND: u32 = 50;
pub const MAX_TXS_PER_ROUND: u32 = 200;

/// Snapshot assembly parameters
#[derive(Debug, Clone, Copy)]
pub struct SnapshotBuilder {
    /// Reported as-is; the protocol's consensus-level coefficient
    pub nakamoto_consensus: u32,

    /// Validators included per snapshot
    pub sample_size: usize,
}

impl SnapshotBuilder {
    pub fn new(nakamoto_consensus: u32, sample_size: usize) -> Self {
        Self {
            nakamoto_consensus,
            sample_size,
        }
    }

    /// Build a snapshot of the current state
    pub fn build<R: Rng + ?Sized>(&self, state: &NetworkState, rng: &mut R) -> Snapshot {
        let avg_round_time = state.round_times().average();
        let finality = avg_round_time * FINALITY_ROUNDS;

        let txs = rng.gen_range(MIN_TXS_PER_ROUND..MAX_TXS_PER_ROUND) as f64;
        let realtime_tps = if avg_round_time > 0.0 { txs / avg_round_time } else { 0.0 };

        // Stake moves every tick, so this is never cached
        let nakamoto_stake = nakamoto::stake_coefficient(&state.registry.stakes());

        let validator_operations = state
            .registry
            .sample(self.sample_size, rng)
            .into_iter()
            .map(present_validator)
            .collect();

        Snapshot {
            network_health: NetworkHealth {
                latest_consensus_round: state.round(),
                avg_round_time: round_to(avg_round_time, 2),
                transaction_finality: round_to(finality, 2),
                realtime_tps: round_to(realtime_tps, 1),
                active_participants: state.participant_count(),
                total_network_nodes: state.total_network_nodes(),
                total_master_nodes: state.total_master_nodes(),
            },
            decentralization_security: DecentralizationSecurity {
                nakamoto_consensus: self.nakamoto_consensus,
                nakamoto_stake,
                safety_violations_24h: state.safety_violations,
                liveness_violations_24h: state.liveness_violations,
                total_blame_messages_24h: state.blame_messages,
                gini_coefficient: round_to(state.gini_coefficient(), 4),
            },
            validator_operations,
        }
    }
}

/// Dashboard presentation of a validator record
fn present_validator(mut v: Validator) -> Validator {
    v.uptime_7d = round_to(v.uptime_7d, 2);
    v
}
