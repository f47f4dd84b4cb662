//! Core types shared by the simulator and the event channel
//!
//! Field names on the serialized types are the wire contract consumed by
//! dashboard clients and must not change.

use serde::{Deserialize, Serialize};

// =============================================================================
// PRIMITIVE TYPES
// =============================================================================

/// Consensus round number
pub type Round = u64;

/// Participant identifier (160-bit account address)
pub type ParticipantId = [u8; 20];

/// Subscriber handle identifier, unique for the process lifetime
pub type SubscriberId = u64;

/// Prefix used for rendered addresses
pub const ADDRESS_PREFIX: &str = "xdc";

/// Render a 160-bit address in the network's `xdc…` form
pub fn format_address(bytes: &ParticipantId) -> String {
    format!("{}{}", ADDRESS_PREFIX, hex::encode(bytes))
}

/// Round to `places` decimal places for presentation
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

// =============================================================================
// VALIDATORS
// =============================================================================

/// Operational status of a master node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidatorStatus {
    /// Participating normally
    Online,

    /// Missed at least one round recently
    Warning,

    /// Many missed rounds or low uptime
    Offline,

    /// Punished for a safety violation. Terminal.
    Slashed,
}

impl ValidatorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidatorStatus::Online => "online",
            ValidatorStatus::Warning => "warning",
            ValidatorStatus::Offline => "offline",
            ValidatorStatus::Slashed => "slashed",
        }
    }
}

/// A master node record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validator {
    pub id: String,

    /// Rolling 7-day uptime percentage
    pub uptime_7d: f64,

    #[serde(rename = "missed_consensus_rounds_24h")]
    pub missed_rounds_24h: u32,

    #[serde(rename = "total_stake")]
    pub stake: f64,

    pub status: ValidatorStatus,
}

impl Validator {
    pub fn is_slashed(&self) -> bool {
        self.status == ValidatorStatus::Slashed
    }
}

// =============================================================================
// SNAPSHOT (wire payload)
// =============================================================================

/// Round cadence and load figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkHealth {
    pub latest_consensus_round: Round,
    pub avg_round_time: f64,
    pub transaction_finality: f64,
    pub realtime_tps: f64,
    pub active_participants: u64,
    pub total_network_nodes: u64,
    pub total_master_nodes: u64,
}

/// Decentralization and fault figures
///
/// The `_24h` counters are cumulative since process start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecentralizationSecurity {
    pub nakamoto_consensus: u32,
    pub nakamoto_stake: u32,
    pub safety_violations_24h: u64,
    pub liveness_violations_24h: u64,
    pub total_blame_messages_24h: u64,
    pub gini_coefficient: f64,
}

/// One tick's view of the network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub network_health: NetworkHealth,
    pub decentralization_security: DecentralizationSecurity,
    pub validator_operations: Vec<Validator>,
}

/// Events pushed over the subscriber channel
#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent<'a> {
    NetworkUpdate(&'a Snapshot),
}

impl<'a> ServerEvent<'a> {
    /// Encode as a JSON text frame
    pub fn to_json(&self) -> Result<String, crate::error::MonitorError> {
        Ok(serde_json::to_string(self)?)
    }
}
