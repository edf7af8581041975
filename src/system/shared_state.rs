//! Shared state between the ingestion thread and the visualizer.
//!
//! The stores are written by ingestion (replay or tracking) and read by the
//! visualizer through snapshots. Both are internally synchronized, so they
//! are shared as plain `Arc`s.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::map::{LoopCandidateStore, LoopEdgeStore, PoseStore, TrajectoryStore};

pub struct SharedState {
    /// Frames and poses, appended in timestamp order.
    pub trajectory: Arc<TrajectoryStore>,

    /// Loop candidates, appended in discovery order.
    pub loops: Arc<LoopEdgeStore>,

    /// Request ingestion threads to finish and exit.
    pub shutdown_requested: AtomicBool,
}

impl SharedState {
    /// Create a new SharedState with empty stores.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Trajectory as the visualizer sees it.
    pub fn pose_store(&self) -> Arc<dyn PoseStore> {
        self.trajectory.clone()
    }

    /// Loop candidates as the visualizer sees them.
    pub fn loop_store(&self) -> Arc<dyn LoopCandidateStore> {
        self.loops.clone()
    }

    /// Request shutdown of the ingestion threads.
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
    }

    /// Check if shutdown was requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            trajectory: Arc::new(TrajectoryStore::new()),
            loops: Arc::new(LoopEdgeStore::new()),
            shutdown_requested: AtomicBool::new(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Timestamp;

    #[test]
    fn test_views_share_the_same_stores() {
        let shared = SharedState::new();
        let view = shared.pose_store();
        shared
            .trajectory
            .insert_frame(Timestamp(1), false, None)
            .unwrap();
        assert_eq!(view.snapshot().len(), 1);
        assert_eq!(shared.loop_store().count(), 0);
    }

    #[test]
    fn test_shutdown_flag() {
        let shared = SharedState::new();
        assert!(!shared.is_shutdown_requested());
        shared.request_shutdown();
        assert!(shared.is_shutdown_requested());
    }
}
