//! Violation Injector
//!
//! Simulates protocol faults once per tick.
//!
//! - **Safety**: a provable breach. Increments the safety counter and slashes
//!   one validator.
//! - **Liveness**: a stalled round. Increments the liveness counter and records
//!   1-5 blame messages.
//!
//! The two rolls are independent and may both fire on the same tick.

use rand::Rng;
use tracing::warn;

use crate::network_state::NetworkState;

/// Blame messages recorded per liveness violation
pub const MIN_BLAME_MESSAGES: u64 = 1;
pub const MAX_BLAME_MESSAGES: u64 = 5;

/// What fired on a single tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViolationReport {
    /// Safety violation detected this tick
    pub safety: bool,

    /// Validator slashed by the safety violation (None if registry was empty)
    pub slashed: Option<String>,

    /// Liveness violation detected this tick
    pub liveness: bool,

    /// Blame messages recorded for the liveness violation
    pub blame_messages: u64,
}

impl ViolationReport {
    pub fn is_empty(&self) -> bool {
        !self.safety && !self.liveness
    }
}

/// Per-tick fault injector
#[derive(Debug, Clone, Copy)]
pub struct ViolationInjector {
    safety_probability: f64,
    liveness_probability: f64,
}

impl ViolationInjector {
    pub fn new(safety_probability: f64, liveness_probability: f64) -> Self {
        Self {
            safety_probability: safety_probability.clamp(0.0, 1.0),
            liveness_probability: liveness_probability.clamp(0.0, 1.0),
        }
    }

    /// Roll both checks and apply their effects to `state`
    pub fn inject<R: Rng + ?Sized>(&self, state: &mut NetworkState, rng: &mut R) -> ViolationReport {
        let mut report = ViolationReport::default();

        if rng.gen_bool(self.safety_probability) {
            state.safety_violations += 1;
            report.safety = true;
            warn!("🚨 Simulated SAFETY VIOLATION at round {}", state.round());

            report.slashed = state.registry.slash_random(rng);
            if let Some(id) = &report.slashed {
                warn!("🔪 Validator {}... slashed", &id[..id.len().min(12)]);
            }
        }

        if rng.gen_bool(self.liveness_probability) {
            let blame = rng.gen_range(MIN_BLAME_MESSAGES..=MAX_BLAME_MESSAGES);
            state.liveness_violations += 1;
            state.blame_messages += blame;
            report.liveness = true;
            report.blame_messages = blame;
            warn!(
                "⚠️ Simulated LIVENESS VIOLATION at round {} ({} blame messages)",
                state.round(),
                blame
            );
        }

        report
    }
}

impl Default for ViolationInjector {
    fn default() -> Self {
        Self::new(0.0005, 0.01)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use crate::types::ValidatorStatus;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn state(rng: &mut StdRng) -> NetworkState {
        NetworkState::new(&MonitorConfig::default(), rng)
    }

    #[test]
    fn test_forced_safety_violation() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = state(&mut rng);
        let before = state.registry.stakes();

        let report = ViolationInjector::new(1.0, 0.0).inject(&mut state, &mut rng);

        assert!(report.safety);
        assert!(!report.liveness);
        assert_eq!(state.safety_violations, 1);
        assert_eq!(state.liveness_violations, 0);

        let slashed: Vec<_> = state.registry.iter().filter(|v| v.is_slashed()).collect();
        assert_eq!(slashed.len(), 1);
        assert_eq!(Some(&slashed[0].id), report.slashed.as_ref());

        let changed: Vec<_> = state
            .registry
            .stakes()
            .into_iter()
            .zip(before)
            .filter(|(after, before)| after != before)
            .collect();
        assert_eq!(changed.len(), 1);
        assert!((changed[0].0 - changed[0].1 * 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_forced_liveness_violation() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut state = state(&mut rng);

        for _ in 0..50 {
            let report = ViolationInjector::new(0.0, 1.0).inject(&mut state, &mut rng);
            assert!(report.liveness);
            assert!((MIN_BLAME_MESSAGES..=MAX_BLAME_MESSAGES).contains(&report.blame_messages));
        }

        assert_eq!(state.liveness_violations, 50);
        assert!(state.blame_messages >= 50 && state.blame_messages <= 250);
        assert_eq!(state.safety_violations, 0);
        assert!(state.registry.iter().all(|v| v.status != ValidatorStatus::Slashed));
    }

    #[test]
    fn test_both_may_fire() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = state(&mut rng);

        let report = ViolationInjector::new(1.0, 1.0).inject(&mut state, &mut rng);
        assert!(report.safety && report.liveness);
        assert_eq!(state.safety_violations, 1);
        assert_eq!(state.liveness_violations, 1);
    }

    #[test]
    fn test_never_fires() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut state = state(&mut rng);

        for _ in 0..1_000 {
            assert!(ViolationInjector::new(0.0, 0.0).inject(&mut state, &mut rng).is_empty());
        }
    }

    #[test]
    fn test_safety_on_empty_registry() {
        let mut rng = StdRng::seed_from_u64(5);
        let config = MonitorConfig {
            total_master_nodes: 0,
            initial_network_nodes: 0,
            ..MonitorConfig::default()
        };
        let mut state = NetworkState::new(&config, &mut rng);

        let report = ViolationInjector::new(1.0, 0.0).inject(&mut state, &mut rng);
        assert!(report.safety);
        assert!(report.slashed.is_none());
        assert_eq!(state.safety_violations, 1);
    }
}
