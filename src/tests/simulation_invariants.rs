// Simulation Invariants Tests
//
// Runs the simulation for many ticks and checks, after every tick:
// 1. Round-time window stays at capacity
// 2. Network nodes never drop below master nodes
// 3. Gini coefficient stays within its band
// 4. Slashed validators stay slashed
// 5. Stake Nakamoto coefficient is the minimal >1/3 prefix
// 6. Snapshots carry min(20, master nodes) validators

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

use crate::config::MonitorConfig;
use crate::nakamoto;
use crate::simulation::Simulation;
use crate::types::ValidatorStatus;

fn simulation(config: MonitorConfig, seed: u64) -> Simulation {
    Simulation::with_rng(&config, StdRng::seed_from_u64(seed))
}

/// Violations far more frequent than in production so slashing is exercised
fn turbulent_config() -> MonitorConfig {
    MonitorConfig {
        safety_violation_probability: 0.05,
        liveness_violation_probability: 0.2,
        ..MonitorConfig::default()
    }
}

#[cfg(test)]
mod invariant_bounds {
    use super::*;

    #[test]
    fn window_nodes_and_gini_hold_every_tick() {
        let config = turbulent_config();
        let mut sim = simulation(config.clone(), 7);

        for _ in 0..2_000 {
            let outcome = sim.tick();
            let state = sim.state();

            assert_eq!(state.round_times().len(), config.round_window_size);
            assert!(state.total_network_nodes() >= state.total_master_nodes());

            let gini = state.gini_coefficient();
            assert!((0.4..=0.5).contains(&gini), "gini {} out of band", gini);
            assert!((0.4..=0.5).contains(&outcome.snapshot.decentralization_security.gini_coefficient));
        }
    }

    #[test]
    fn rounds_advance_by_exactly_one() {
        let mut sim = simulation(MonitorConfig::default(), 8);
        let mut expected = sim.state().round();

        for _ in 0..100 {
            expected += 1;
            let outcome = sim.tick();
            assert_eq!(outcome.snapshot.network_health.latest_consensus_round, expected);
        }
    }

    #[test]
    fn counters_are_cumulative() {
        let mut sim = simulation(turbulent_config(), 9);
        let mut last = (0, 0, 0);

        for _ in 0..500 {
            let security = sim.tick().snapshot.decentralization_security;
            let now = (
                security.safety_violations_24h,
                security.liveness_violations_24h,
                security.total_blame_messages_24h,
            );
            assert!(now.0 >= last.0 && now.1 >= last.1 && now.2 >= last.2);
            // At least one blame message per liveness violation, at most five
            assert!(now.2 >= now.1 && now.2 <= now.1 * 5);
            last = now;
        }
    }

    #[test]
    fn participants_never_shrink() {
        let mut sim = simulation(MonitorConfig::default(), 10);
        let mut last = 0;

        for _ in 0..200 {
            let participants = sim.tick().snapshot.network_health.active_participants;
            assert!(participants >= last + 1);
            last = participants;
        }
    }
}

#[cfg(test)]
mod invariant_slashing_is_terminal {
    use super::*;

    #[test]
    fn slashed_validators_never_recover() {
        let mut sim = simulation(turbulent_config(), 11);
        let mut slashed: HashSet<String> = HashSet::new();

        // Long enough to cross several periodic resets
        for _ in 0..2_000 {
            let outcome = sim.tick();
            if let Some(id) = outcome.violations.slashed {
                slashed.insert(id);
            }

            for id in &slashed {
                let v = sim.state().registry.get(id).unwrap();
                assert_eq!(v.status, ValidatorStatus::Slashed);
            }
        }

        assert!(!slashed.is_empty());
        assert_eq!(sim.state().registry.stats().slashed, slashed.len());
    }

    #[test]
    fn routine_ticks_do_not_touch_slashed_records() {
        let config = MonitorConfig {
            safety_violation_probability: 0.0,
            missed_round_probability: 0.5,
            ..MonitorConfig::default()
        };
        let mut sim = simulation(config, 12);

        let id = {
            let state = sim.state_mut();
            let mut rng = StdRng::seed_from_u64(0);
            state.registry.slash_random(&mut rng).unwrap()
        };
        let frozen = sim.state().registry.get(&id).cloned().unwrap();

        for _ in 0..1_200 {
            sim.tick();
        }

        assert_eq!(sim.state().registry.get(&id), Some(&frozen));
    }
}

#[cfg(test)]
mod invariant_nakamoto {
    use super::*;

    #[test]
    fn stake_coefficient_is_minimal_prefix_every_tick() {
        let mut sim = simulation(turbulent_config(), 13);

        for _ in 0..500 {
            let outcome = sim.tick();
            let n = outcome.snapshot.decentralization_security.nakamoto_stake as usize;

            let mut stakes = sim.state().registry.stakes();
            assert_eq!(n, nakamoto::stake_coefficient(&stakes) as usize);

            stakes.sort_by(|a, b| b.total_cmp(a));
            let total: f64 = stakes.iter().sum();
            let prefix = |k: usize| stakes[..k].iter().fold(0.0, |acc, s| acc + s);

            assert!(n >= 1 && n <= stakes.len());
            assert!(prefix(n) > total / 3.0);
            assert!(prefix(n - 1) <= total / 3.0);
        }
    }

    #[test]
    fn consensus_coefficient_is_constant() {
        let mut sim = simulation(turbulent_config(), 14);
        for _ in 0..50 {
            assert_eq!(sim.tick().snapshot.decentralization_security.nakamoto_consensus, 72);
        }
    }
}

#[cfg(test)]
mod invariant_snapshot_shape {
    use super::*;

    #[test]
    fn sample_size_is_min_of_twenty_and_master_nodes() {
        for masters in [0usize, 1, 19, 20, 21, 108] {
            let config = MonitorConfig {
                total_master_nodes: masters,
                initial_network_nodes: 1_500,
                ..MonitorConfig::default()
            };
            let mut sim = simulation(config, 15);

            for _ in 0..10 {
                let snapshot = sim.tick().snapshot;
                assert_eq!(snapshot.validator_operations.len(), masters.min(20));

                let ids: HashSet<_> = snapshot.validator_operations.iter().map(|v| &v.id).collect();
                assert_eq!(ids.len(), snapshot.validator_operations.len());
            }
        }
    }

    #[test]
    fn empty_registry_ticks_without_fault() {
        let config = MonitorConfig {
            total_master_nodes: 0,
            initial_network_nodes: 0,
            safety_violation_probability: 1.0,
            ..MonitorConfig::default()
        };
        let mut sim = simulation(config, 16);

        for _ in 0..10 {
            let outcome = sim.tick();
            assert_eq!(outcome.snapshot.decentralization_security.nakamoto_stake, 0);
            assert!(outcome.snapshot.validator_operations.is_empty());
            assert!(outcome.violations.safety);
            assert!(outcome.violations.slashed.is_none());
        }
        assert_eq!(sim.state().safety_violations, 10);
    }

    #[test]
    fn finality_tracks_round_time() {
        let mut sim = simulation(MonitorConfig::default(), 17);

        for _ in 0..300 {
            let health = sim.tick().snapshot.network_health;
            assert!(health.avg_round_time >= 1.8 && health.avg_round_time <= 2.2);
            assert!((health.transaction_finality - health.avg_round_time * 3.0).abs() <= 0.021);
            assert!(health.realtime_tps >= 50.0 / 2.2 - 0.1 && health.realtime_tps <= 200.0 / 1.8 + 0.1);
        }
    }
}
