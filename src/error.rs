//! Error types for the consensus monitor

/// Errors surfaced by configuration loading and the broadcast path.
///
/// Simulated safety and liveness violations are not errors; they are
/// recorded as counters in the network state.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Tick scheduler has been stopped")]
    SchedulerStopped,
}
