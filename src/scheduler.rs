//! Tick Scheduler
//!
//! Drives the simulation at a fixed interval and hands every snapshot to the
//! subscriber registry.
//!
//! ## State machine
//!
//! ```text
//!   Idle ──(first subscriber, CAS)──► Running ──(stop)──► Stopped
//! ```
//!
//! The loop is started lazily and exactly once: concurrent callers race on a
//! single compare-and-swap and only the winner spawns the task. It keeps
//! running with zero subscribers until stopped.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::api::Metrics;
use crate::broadcast::{DeliveryReport, SubscriberRegistry};
use crate::error::MonitorError;
use crate::simulation::Simulation;

/// Lifecycle of the tick loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    /// No subscriber has connected yet
    Idle,

    /// Tick loop active
    Running,

    /// Stopped for shutdown; cannot be restarted
    Stopped,
}

/// Fixed-interval driver of the simulation
pub struct TickScheduler {
    simulation: Arc<RwLock<Simulation>>,
    subscribers: Arc<SubscriberRegistry>,
    metrics: Arc<Metrics>,

    /// Pause between two ticks
    interval: Duration,

    /// Set once by the first caller of `start_once`
    started: AtomicBool,

    shutdown: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TickScheduler {
    pub fn new(
        simulation: Arc<RwLock<Simulation>>,
        subscribers: Arc<SubscriberRegistry>,
        metrics: Arc<Metrics>,
        interval: Duration,
    ) -> Self {
        Self {
            simulation,
            subscribers,
            metrics,
            interval,
            started: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
            handle: Mutex::new(None),
        }
    }

    /// Start the tick loop unless it has already been started
    ///
    /// Returns `Ok(true)` for the single caller that actually started it.
    pub fn start_once(self: &Arc<Self>) -> Result<bool, MonitorError> {
        if self.shutdown.is_cancelled() {
            return Err(MonitorError::SchedulerStopped);
        }

        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(false);
        }

        self.metrics.inc_loops_started();
        info!("▶️  Starting background data stream (interval: {:?})", self.interval);

        let scheduler = self.clone();
        let handle = tokio::spawn(async move { scheduler.run().await });
        *self.handle.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);

        Ok(true)
    }

    /// Ask the loop to stop and wait for it to finish
    pub async fn stop(&self) {
        self.shutdown.cancel();

        let handle = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Tick loop ended abnormally: {}", e);
            }
        }
    }

    pub fn state(&self) -> SchedulerState {
        if self.shutdown.is_cancelled() {
            SchedulerState::Stopped
        } else if self.started.load(Ordering::SeqCst) {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    async fn run(self: Arc<Self>) {
        info!("📡 Tick loop running");

        while !self.shutdown.is_cancelled() {
            self.run_tick().await;

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("🛑 Tick loop stopped");
    }

    /// Run one simulation step and broadcast its snapshot
    ///
    /// A panicking step is logged and skipped; `None` is returned.
    pub async fn run_tick(&self) -> Option<DeliveryReport> {
        let outcome = {
            let mut simulation = self.simulation.write().await;
            match std::panic::catch_unwind(AssertUnwindSafe(|| simulation.tick())) {
                Ok(outcome) => outcome,
                Err(_) => {
                    error!("Simulation tick faulted, skipping to next tick");
                    self.metrics.inc_tick_faults();
                    return None;
                }
            }
        };

        let round = outcome.snapshot.network_health.latest_consensus_round;
        self.metrics.inc_ticks();
        self.metrics.set_latest_round(round);
        if outcome.violations.safety {
            self.metrics.inc_safety_violations();
        }
        if outcome.violations.liveness {
            self.metrics.inc_liveness_violations();
        }

        let report = self.subscribers.deliver(Arc::new(outcome.snapshot)).await;

        self.metrics.add_delivered(report.delivered as u64);
        self.metrics.add_dropped(report.dropped as u64);
        if report.pruned > 0 {
            self.metrics.add_disconnected(report.pruned as u64);
            self.metrics.set_active_subscribers(self.subscribers.count().await as u64);
        }

        debug!(
            "Round {} broadcast: {} delivered, {} dropped, {} pruned",
            round, report.delivered, report.dropped, report.pruned
        );

        Some(report)
    }
}
