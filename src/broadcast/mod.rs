//! Broadcast Module
//!
//! Connect/disconnect handling for dashboard subscribers. The first connection
//! ever made starts the tick scheduler; disconnections never stop it.

mod subscribers;

pub use subscribers::{DeliveryReport, SnapshotReceiver, SubscriberRegistry};

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::api::Metrics;
use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::scheduler::TickScheduler;
use crate::simulation::Simulation;
use crate::types::SubscriberId;

/// A connected subscriber's handle and snapshot stream
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: SnapshotReceiver,
}

/// Entry point for the event channel
pub struct Broadcaster {
    subscribers: Arc<SubscriberRegistry>,
    scheduler: Arc<TickScheduler>,
    simulation: Arc<RwLock<Simulation>>,
    metrics: Arc<Metrics>,
}

impl Broadcaster {
    /// Build the simulation, subscriber set and (idle) scheduler
    pub fn new(config: &MonitorConfig, metrics: Arc<Metrics>) -> Self {
        Self::with_simulation(config, Simulation::new(config), metrics)
    }

    pub fn with_simulation(config: &MonitorConfig, simulation: Simulation, metrics: Arc<Metrics>) -> Self {
        let simulation = Arc::new(RwLock::new(simulation));
        let subscribers = Arc::new(SubscriberRegistry::new(config.subscriber_queue_depth));
        let scheduler = Arc::new(TickScheduler::new(
            simulation.clone(),
            subscribers.clone(),
            metrics.clone(),
            config.tick_interval(),
        ));

        Self {
            subscribers,
            scheduler,
            simulation,
            metrics,
        }
    }

    /// Register a subscriber, starting the tick loop on the first connection
    pub async fn connect(&self) -> Result<Subscription, MonitorError> {
        let (id, receiver) = self.subscribers.register().await;

        if let Err(e) = self.scheduler.start_once() {
            self.subscribers.remove(id).await;
            return Err(e);
        }

        self.metrics.inc_connected();
        self.metrics.set_active_subscribers(self.subscribers.count().await as u64);
        info!("🔌 Subscriber {} connected", id);

        Ok(Subscription { id, receiver })
    }

    /// Remove a subscriber; the tick loop keeps running
    pub async fn disconnect(&self, id: SubscriberId) {
        if self.subscribers.remove(id).await {
            self.metrics.add_disconnected(1);
            self.metrics.set_active_subscribers(self.subscribers.count().await as u64);
            info!("👋 Subscriber {} disconnected", id);
        }
    }

    pub fn scheduler(&self) -> &Arc<TickScheduler> {
        &self.scheduler
    }

    pub fn subscribers(&self) -> &Arc<SubscriberRegistry> {
        &self.subscribers
    }

    /// Read access to the simulation for status endpoints
    pub fn simulation(&self) -> &Arc<RwLock<Simulation>> {
        &self.simulation
    }

    /// Stop the tick loop (graceful shutdown)
    pub async fn shutdown(&self) {
        self.scheduler.stop().await;
    }
}
