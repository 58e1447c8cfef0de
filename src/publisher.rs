//! Estimate publication to external observers
//!
//! The renderer (or any other collaborator) registers a callback and is
//! notified synchronously after each accepted recompute with a read-only
//! snapshot. The publisher keeps no estimate history.

use serde::{Deserialize, Serialize};

use crate::core::{Anchor, MasterNode, PositionEstimate, Room};

/// Read-only engine view handed to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Latest accepted estimate, `None` until the first solve succeeds
    pub estimate: Option<PositionEstimate>,
    pub anchors: Vec<Anchor>,
    pub room: Room,
    pub master: MasterNode,
}

/// Observer callback invoked after each accepted recompute
pub type SnapshotCallback = Box<dyn Fn(&EngineSnapshot) + Send>;

/// Registration handle returned by `subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberHandle(u32);

impl SubscriberHandle {
    pub fn id(&self) -> u32 {
        self.0
    }
}

/// Observer registry; notification follows registration order
#[derive(Default)]
pub struct EstimatePublisher {
    subscribers: Vec<(SubscriberHandle, SnapshotCallback)>,
    counter: u32,
}

impl EstimatePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer; returns the handle needed to unsubscribe
    pub fn subscribe(&mut self, callback: SnapshotCallback) -> SubscriberHandle {
        self.counter += 1;
        let handle = SubscriberHandle(self.counter);
        self.subscribers.push((handle, callback));
        handle
    }

    /// Remove an observer. Returns false for an unknown handle.
    pub fn unsubscribe(&mut self, handle: SubscriberHandle) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(h, _)| *h != handle);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Synchronously invoke every registered observer
    pub fn notify(&self, snapshot: &EngineSnapshot) {
        for (_, callback) in &self.subscribers {
            callback(snapshot);
        }
    }
}
