//! Metrics Collection
//!
//! Operational counters for the tick loop and the event channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Metrics collector for the monitor
#[derive(Default)]
pub struct Metrics {
    /// Start time for uptime calculation
    start_time: Option<Instant>,

    /// Completed simulation ticks
    pub ticks: AtomicU64,

    /// Ticks that panicked and were skipped
    pub tick_faults: AtomicU64,

    /// Tick loops spawned (must never exceed 1)
    pub loops_started: AtomicU64,

    /// Snapshots handed to subscriber queues
    pub snapshots_delivered: AtomicU64,

    /// Snapshots dropped because a subscriber queue was full
    pub snapshots_dropped: AtomicU64,

    /// Subscriber connections accepted
    pub subscribers_connected: AtomicU64,

    /// Subscriber disconnections (explicit or pruned)
    pub subscribers_disconnected: AtomicU64,

    /// Currently registered subscribers
    pub active_subscribers: AtomicU64,

    /// Latest simulated consensus round
    pub latest_round: AtomicU64,

    /// Simulated violations observed by the loop
    pub safety_violations: AtomicU64,
    pub liveness_violations: AtomicU64,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0)
    }

    pub fn inc_ticks(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_tick_faults(&self) {
        self.tick_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_loops_started(&self) {
        self.loops_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_delivered(&self, count: u64) {
        self.snapshots_delivered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_dropped(&self, count: u64) {
        self.snapshots_dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_connected(&self) {
        self.subscribers_connected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_disconnected(&self, count: u64) {
        self.subscribers_disconnected.fetch_add(count, Ordering::Relaxed);
    }

    pub fn set_active_subscribers(&self, count: u64) {
        self.active_subscribers.store(count, Ordering::Relaxed);
    }

    pub fn set_latest_round(&self, round: u64) {
        self.latest_round.store(round, Ordering::Relaxed);
    }

    pub fn inc_safety_violations(&self) {
        self.safety_violations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_liveness_violations(&self) {
        self.liveness_violations.fetch_add(1, Ordering::Relaxed);
    }

    /// Export metrics in Prometheus format
    pub fn to_prometheus(&self) -> String {
        let series: [(&str, &str, &str, u64); 12] = [
            ("uptime_seconds", "gauge", "Monitor uptime in seconds", self.uptime_secs()),
            ("ticks_total", "counter", "Completed simulation ticks", self.ticks.load(Ordering::Relaxed)),
            ("tick_faults_total", "counter", "Ticks skipped after an internal fault", self.tick_faults.load(Ordering::Relaxed)),
            ("tick_loops_started", "gauge", "Tick loops spawned", self.loops_started.load(Ordering::Relaxed)),
            ("snapshots_delivered_total", "counter", "Snapshots queued to subscribers", self.snapshots_delivered.load(Ordering::Relaxed)),
            ("snapshots_dropped_total", "counter", "Snapshots dropped on full subscriber queues", self.snapshots_dropped.load(Ordering::Relaxed)),
            ("subscribers_connected_total", "counter", "Subscriber connections accepted", self.subscribers_connected.load(Ordering::Relaxed)),
            ("subscribers_disconnected_total", "counter", "Subscriber disconnections", self.subscribers_disconnected.load(Ordering::Relaxed)),
            ("active_subscribers", "gauge", "Currently connected subscribers", self.active_subscribers.load(Ordering::Relaxed)),
            ("latest_round", "gauge", "Latest simulated consensus round", self.latest_round.load(Ordering::Relaxed)),
            ("safety_violations_total", "counter", "Simulated safety violations", self.safety_violations.load(Ordering::Relaxed)),
            ("liveness_violations_total", "counter", "Simulated liveness violations", self.liveness_violations.load(Ordering::Relaxed)),
        ];

        let mut output = String::new();
        for (name, kind, help, value) in series {
            output.push_str(&format!(
                "# HELP consensus_monitor_{name} {help}\n\
                 # TYPE consensus_monitor_{name} {kind}\n\
                 consensus_monitor_{name} {value}\n\n"
            ));
        }

        output
    }

    /// Export metrics as JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "uptime_secs": self.uptime_secs(),
            "ticks": {
                "total": self.ticks.load(Ordering::Relaxed),
                "faults": self.tick_faults.load(Ordering::Relaxed),
                "loops_started": self.loops_started.load(Ordering::Relaxed),
            },
            "snapshots": {
                "delivered": self.snapshots_delivered.load(Ordering::Relaxed),
                "dropped": self.snapshots_dropped.load(Ordering::Relaxed),
            },
            "subscribers": {
                "active": self.active_subscribers.load(Ordering::Relaxed),
                "connected": self.subscribers_connected.load(Ordering::Relaxed),
                "disconnected": self.subscribers_disconnected.load(Ordering::Relaxed),
            },
            "network": {
                "latest_round": self.latest_round.load(Ordering::Relaxed),
                "safety_violations": self.safety_violations.load(Ordering::Relaxed),
                "liveness_violations": self.liveness_violations.load(Ordering::Relaxed),
            },
        })
    }
}
