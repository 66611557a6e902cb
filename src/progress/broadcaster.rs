//! Periodic job snapshots fanned out to any number of observers.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::ProgressConfig;
use crate::error::Result;
use crate::jobs::{JobId, JobRegistry, JobSnapshot};

/// One serialized registry snapshot.
pub type Frame = Arc<str>;

/// Snapshot map keyed by job id, newest job first.
pub fn snapshot_map(registry: &JobRegistry) -> IndexMap<JobId, JobSnapshot> {
    registry
        .snapshot_all()
        .into_iter()
        .map(|snapshot| (snapshot.id, snapshot))
        .collect()
}

/// Publishes registry snapshots on a fixed interval.
///
/// Every subscriber owns an independent receiver with a bounded buffer. A
/// subscriber that falls behind loses its oldest frames (it observes
/// `RecvError::Lagged`) while the producer and other subscribers carry on.
#[derive(Clone, Debug)]
pub struct ProgressBroadcaster {
    tx: broadcast::Sender<Frame>,
    registry: Arc<JobRegistry>,
    interval: Duration,
}

impl ProgressBroadcaster {
    pub fn new(registry: Arc<JobRegistry>, settings: &ProgressConfig) -> Self {
        let (tx, _) = broadcast::channel(settings.subscriber_buffer.max(1));
        Self {
            tx,
            registry,
            interval: settings.interval(),
        }
    }

    /// Subscribe to all future frames.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.tx.subscribe()
    }

    /// Number of connected observers.
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Serialize the registry as it is right now.
    pub fn current_frame(&self) -> Result<Frame> {
        let json = serde_json::to_string(&snapshot_map(&self.registry))?;
        Ok(Frame::from(json))
    }

    /// Publish one frame immediately; returns how many observers got it.
    ///
    /// Nothing is serialized when no observer is connected.
    pub fn publish_now(&self) -> Result<usize> {
        if self.tx.receiver_count() == 0 {
            return Ok(0);
        }
        let frame = self.current_frame()?;
        Ok(self.tx.send(frame).unwrap_or(0))
    }

    /// Run the publishing loop until the returned task is aborted.
    pub fn spawn(&self) -> JoinHandle<()> {
        let broadcaster = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(broadcaster.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(e) = broadcaster.publish_now() {
                    tracing::warn!("Failed to publish progress snapshot: {}", e);
                }
            }
        })
    }
}
