//! Validator Registry Module
//!
//! Holds the fixed master-node set for the lifetime of the simulation.
//! Tracks uptime, missed rounds, stake and status per validator.

mod validators;
pub mod status;

pub use validators::ValidatorRegistry;

/// Status breakdown of the registry
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct RegistryStats {
    /// Total validators in registry
    pub total: usize,

    pub online: usize,
    pub warning: usize,
    pub offline: usize,
    pub slashed: usize,

    /// Sum of all stakes
    pub total_stake: f64,
}
