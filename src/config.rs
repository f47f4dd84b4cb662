//! Monitor Configuration
//!
//! Configurable parameters for the simulator and its HTTP/WebSocket API.
//! Defaults reproduce a 108 master-node network with 2 second rounds.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::MonitorError;

/// Main configuration for the consensus monitor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    // === Timing ===

    /// Delay between two simulation ticks (milliseconds)
    pub tick_interval_ms: u64,

    // === Network shape ===

    /// Consensus round the simulation starts from
    pub initial_round: u64,

    /// Number of master nodes (validators), fixed for the run
    pub total_master_nodes: usize,

    /// Initial total node count (must be >= master nodes)
    pub initial_network_nodes: u64,

    /// Consensus-based Nakamoto coefficient reported as a constant
    pub nakamoto_consensus: u32,

    /// Capacity of the round-time sliding window
    pub round_window_size: usize,

    /// Round time every window slot is seeded with (seconds)
    pub initial_round_time_secs: f64,

    /// Starting Gini coefficient
    pub initial_gini: f64,

    /// Lower clamp for the Gini coefficient
    pub gini_min: f64,

    /// Upper clamp for the Gini coefficient
    pub gini_max: f64,

    // === Validator dynamics ===

    /// Probability a validator misses a round on a given tick
    pub missed_round_probability: f64,

    /// Rounds between missed-round / uptime resets
    pub reset_period_rounds: u64,

    // === Violations ===

    /// Per-tick probability of a safety violation (slashes a validator)
    pub safety_violation_probability: f64,

    /// Per-tick probability of a liveness violation (records blame messages)
    pub liveness_violation_probability: f64,

    // === Broadcast ===

    /// Number of validators sampled into each snapshot
    pub snapshot_sample_size: usize,

    /// Per-subscriber queue depth before updates are dropped
    pub subscriber_queue_depth: usize,

    // === Network ===

    /// Port for the HTTP/WebSocket API
    pub api_port: u16,

    /// Optional RNG seed for reproducible runs
    pub rng_seed: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 2_000,

            initial_round: 64_102_831,
            total_master_nodes: 108,
            initial_network_nodes: 1_500,
            nakamoto_consensus: 72,
            round_window_size: 100,
            initial_round_time_secs: 2.0,
            initial_gini: 0.45,
            gini_min: 0.4,
            gini_max: 0.5,

            missed_round_probability: 0.02,
            reset_period_rounds: 500,

            safety_violation_probability: 0.0005,  // roughly once every 2000 rounds
            liveness_violation_probability: 0.01,

            snapshot_sample_size: 20,
            subscriber_queue_depth: 16,

            api_port: 5000,
            rng_seed: None,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> Result<Self, MonitorError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &Path) -> Result<(), MonitorError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| MonitorError::InvalidConfig(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    // Builder-style methods for CLI overrides

    pub fn with_api_port(mut self, port: u16) -> Self {
        self.api_port = port;
        self
    }

    pub fn with_tick_interval_ms(mut self, interval_ms: Option<u64>) -> Self {
        if let Some(ms) = interval_ms {
            self.tick_interval_ms = ms;
        }
        self
    }

    pub fn with_rng_seed(mut self, seed: Option<u64>) -> Self {
        if seed.is_some() {
            self.rng_seed = seed;
        }
        self
    }

    /// Tick interval as a `Duration`
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.tick_interval_ms == 0 {
            return Err(MonitorError::InvalidConfig(
                "tick_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.round_window_size == 0 {
            return Err(MonitorError::InvalidConfig(
                "round_window_size must be greater than 0".to_string(),
            ));
        }

        if self.total_master_nodes == 0 {
            return Err(MonitorError::InvalidConfig(
                "total_master_nodes must be greater than 0".to_string(),
            ));
        }

        if self.initial_network_nodes < self.total_master_nodes as u64 {
            return Err(MonitorError::InvalidConfig(format!(
                "initial_network_nodes ({}) must be at least total_master_nodes ({})",
                self.initial_network_nodes, self.total_master_nodes
            )));
        }

        if !self.initial_round_time_secs.is_finite() || self.initial_round_time_secs <= 0.0 {
            return Err(MonitorError::InvalidConfig(format!(
                "initial_round_time_secs ({}) must be a positive number",
                self.initial_round_time_secs
            )));
        }

        // NaN fails every comparison, so the bounds are checked positively
        let gini_bounds_ok = self.gini_min >= 0.0
            && self.gini_min <= self.gini_max
            && self.gini_max <= 1.0;
        if !gini_bounds_ok {
            return Err(MonitorError::InvalidConfig(format!(
                "gini bounds must satisfy 0 <= gini_min ({}) <= gini_max ({}) <= 1",
                self.gini_min, self.gini_max
            )));
        }

        if !(self.gini_min..=self.gini_max).contains(&self.initial_gini) {
            return Err(MonitorError::InvalidConfig(format!(
                "initial_gini ({}) must be within [{}, {}]",
                self.initial_gini, self.gini_min, self.gini_max
            )));
        }

        for (name, p) in [
            ("missed_round_probability", self.missed_round_probability),
            ("safety_violation_probability", self.safety_violation_probability),
            ("liveness_violation_probability", self.liveness_violation_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(MonitorError::InvalidConfig(format!(
                    "{} ({}) must be within [0, 1]",
                    name, p
                )));
            }
        }

        if self.reset_period_rounds == 0 {
            return Err(MonitorError::InvalidConfig(
                "reset_period_rounds must be greater than 0".to_string(),
            ));
        }

        if self.subscriber_queue_depth == 0 {
            return Err(MonitorError::InvalidConfig(
                "subscriber_queue_depth must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.total_master_nodes, 108);
        assert_eq!(config.round_window_size, 100);
        assert_eq!(config.tick_interval_ms, 2_000);
        assert!(config.rng_seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = MonitorConfig::default();
        config.initial_network_nodes = 50;
        assert!(config.validate().is_err());

        let mut config = MonitorConfig::default();
        config.safety_violation_probability = 1.5;
        assert!(config.validate().is_err());

        let mut config = MonitorConfig::default();
        config.gini_min = 0.6;
        assert!(config.validate().is_err());

        let mut config = MonitorConfig::default();
        config.round_window_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_float_ranges() {
        let invalid = [
            MonitorConfig { gini_min: f64::NAN, ..MonitorConfig::default() },
            MonitorConfig { gini_max: f64::NAN, ..MonitorConfig::default() },
            MonitorConfig { gini_min: -0.1, ..MonitorConfig::default() },
            MonitorConfig { gini_max: 1.5, initial_gini: 0.45, ..MonitorConfig::default() },
            MonitorConfig { initial_gini: f64::NAN, ..MonitorConfig::default() },
            MonitorConfig { initial_gini: 0.9, ..MonitorConfig::default() },
            MonitorConfig { initial_round_time_secs: f64::NAN, ..MonitorConfig::default() },
            MonitorConfig { initial_round_time_secs: f64::INFINITY, ..MonitorConfig::default() },
            MonitorConfig { initial_round_time_secs: 0.0, ..MonitorConfig::default() },
            MonitorConfig { initial_round_time_secs: -2.0, ..MonitorConfig::default() },
            MonitorConfig { liveness_violation_probability: f64::NAN, ..MonitorConfig::default() },
        ];

        for config in invalid {
            assert!(
                matches!(config.validate(), Err(MonitorError::InvalidConfig(_))),
                "accepted {:?}",
                config
            );
        }

        // Degenerate but well-formed band
        let config = MonitorConfig {
            gini_min: 0.45,
            gini_max: 0.45,
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_nan_from_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nan.toml");
        std::fs::write(&path, "gini_min = nan\n").unwrap();

        let loaded = MonitorConfig::load(&path).unwrap();
        assert!(loaded.gini_min.is_nan());
        assert!(loaded.validate().is_err());
    }

    #[test]
    fn test_builder_methods() {
        let config = MonitorConfig::default()
            .with_api_port(9090)
            .with_tick_interval_ms(Some(250))
            .with_rng_seed(Some(7));

        assert_eq!(config.api_port, 9090);
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.rng_seed, Some(7));

        // None leaves the loaded value alone
        let config = config.with_tick_interval_ms(None).with_rng_seed(None);
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.rng_seed, Some(7));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.toml");

        let config = MonitorConfig::default().with_api_port(6000).with_rng_seed(Some(42));
        config.save(&path).unwrap();

        let loaded = MonitorConfig::load(&path).unwrap();
        assert_eq!(loaded.api_port, 6000);
        assert_eq!(loaded.rng_seed, Some(42));
        assert_eq!(loaded.total_master_nodes, config.total_master_nodes);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "total_master_nodes = 21\n").unwrap();

        let loaded = MonitorConfig::load(&path).unwrap();
        assert_eq!(loaded.total_master_nodes, 21);
        assert_eq!(loaded.round_window_size, 100);
    }
}
