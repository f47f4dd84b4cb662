//! Subscriber Registry
//!
//! Connected subscriber handles and fire-and-forget fan-out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

use crate::types::{Snapshot, SubscriberId};

/// Receiving half handed to a connected subscriber
pub type SnapshotReceiver = mpsc::Receiver<Arc<Snapshot>>;

/// Outcome of pushing one snapshot to every subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Queued for the subscriber
    pub delivered: usize,

    /// Subscriber queue was full; this update was skipped for it
    pub dropped: usize,

    /// Subscriber had gone away; handle removed
    pub pruned: usize,
}

/// Set of currently connected subscribers
pub struct SubscriberRegistry {
    subscribers: RwLock<HashMap<SubscriberId, mpsc::Sender<Arc<Snapshot>>>>,

    /// Next handle id
    next_id: AtomicU64,

    /// Per-subscriber queue depth
    queue_depth: usize,

    /// Most recent snapshot delivered
    latest: RwLock<Option<Arc<Snapshot>>>,
}

impl SubscriberRegistry {
    pub fn new(queue_depth: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            queue_depth: queue_depth.max(1),
            latest: RwLock::new(None),
        }
    }

    /// Register a new handle
    pub async fn register(&self) -> (SubscriberId, SnapshotReceiver) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.queue_depth);

        self.subscribers.write().await.insert(id, tx);
        debug!("Subscriber {} registered", id);

        (id, rx)
    }

    /// Remove a handle; returns whether it was registered
    pub async fn remove(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.write().await.remove(&id).is_some();
        if removed {
            debug!("Subscriber {} removed", id);
        }
        removed
    }

    /// Push a snapshot to every registered handle without waiting
    pub async fn deliver(&self, snapshot: Arc<Snapshot>) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let mut closed = Vec::new();

        {
            let subscribers = self.subscribers.read().await;
            for (id, tx) in subscribers.iter() {
                match tx.try_send(snapshot.clone()) {
                    Ok(()) => report.delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        debug!("Subscriber {} lagging, update dropped", id);
                        report.dropped += 1;
                    }
                    Err(TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }

        if !closed.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in closed {
                if subscribers.remove(&id).is_some() {
                    report.pruned += 1;
                }
            }
        }

        *self.latest.write().await = Some(snapshot);

        report
    }

    /// Most recent snapshot, if any tick has completed
    pub async fn latest(&self) -> Option<Arc<Snapshot>> {
        self.latest.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.read().await.contains_key(&id)
    }
}
