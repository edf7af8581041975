//! Trajectory store: ordered timestamp -> frame record mapping.
//!
//! The store is written by the ingestion side (tracking / replay) and read
//! by the visualizer. Readers never iterate under the lock: `snapshot()`
//! copies the ordered records out and releases the lock immediately, so
//! concurrent appends neither corrupt a scan nor block for a whole tick.

use std::collections::BTreeMap;
use std::collections::btree_map;

use parking_lot::RwLock;

use crate::error::{Result, VizError};
use crate::geometry::SE3;

use super::frame::FrameRecord;
use super::types::Timestamp;

/// Read access to a trajectory, as consumed by the visualizer.
pub trait PoseStore: Send + Sync {
    /// Point-in-time copy of all frames, ordered by timestamp.
    fn snapshot(&self) -> PoseSnapshot;

    /// Reference time zero for relative-time labels.
    fn origin_timestamp(&self) -> Option<Timestamp>;
}

/// Immutable, ordered view of the trajectory taken at one instant.
#[derive(Debug, Clone, Default)]
pub struct PoseSnapshot {
    frames: BTreeMap<Timestamp, FrameRecord>,
}

impl PoseSnapshot {
    pub fn new(frames: BTreeMap<Timestamp, FrameRecord>) -> Self {
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, timestamp: &Timestamp) -> Option<&FrameRecord> {
        self.frames.get(timestamp)
    }

    /// Frames in timestamp order.
    pub fn iter(&self) -> btree_map::Iter<'_, Timestamp, FrameRecord> {
        self.frames.iter()
    }
}

#[derive(Default)]
struct TrajectoryInner {
    frames: BTreeMap<Timestamp, FrameRecord>,
    origin: Option<Timestamp>,
}

/// Thread-safe trajectory store with append-only frames.
#[derive(Default)]
pub struct TrajectoryStore {
    inner: RwLock<TrajectoryInner>,
}

impl TrajectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame and return its sequence index.
    ///
    /// Timestamps must be strictly increasing so the sequence index equals
    /// the timestamp rank and never has to be recomputed.
    pub fn insert_frame(
        &self,
        timestamp: Timestamp,
        is_keyframe: bool,
        pose: Option<SE3>,
    ) -> Result<usize> {
        let mut inner = self.inner.write();
        if let Some((&latest, _)) = inner.frames.iter().next_back() {
            if timestamp <= latest {
                return Err(VizError::NonMonotonicTimestamp { timestamp, latest });
            }
        }
        let seq = inner.frames.len();
        if pose.is_some() && inner.origin.is_none() {
            inner.origin = Some(timestamp);
        }
        inner
            .frames
            .insert(timestamp, FrameRecord::new(seq, is_keyframe, pose));
        Ok(seq)
    }

    /// Provide the pose of a frame inserted without one.
    ///
    /// A pose becomes available exactly once; later corrections are not
    /// modelled by this store.
    pub fn set_pose(&self, timestamp: Timestamp, pose: SE3) -> Result<()> {
        let mut inner = self.inner.write();
        let record = inner
            .frames
            .get_mut(&timestamp)
            .ok_or(VizError::UnknownFrame(timestamp))?;
        if record.pose.is_some() {
            return Err(VizError::PoseAlreadySet(timestamp));
        }
        record.pose = Some(pose);
        // Origin is the earliest posed frame, even if poses arrive out of order
        match inner.origin {
            Some(origin) if origin <= timestamp => {}
            _ => inner.origin = Some(timestamp),
        }
        Ok(())
    }

    /// Promote a frame to keyframe.
    pub fn set_keyframe(&self, timestamp: Timestamp) -> Result<()> {
        let mut inner = self.inner.write();
        let record = inner
            .frames
            .get_mut(&timestamp)
            .ok_or(VizError::UnknownFrame(timestamp))?;
        record.is_keyframe = true;
        Ok(())
    }

    pub fn get(&self, timestamp: &Timestamp) -> Option<FrameRecord> {
        self.inner.read().frames.get(timestamp).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().frames.is_empty()
    }
}

impl PoseStore for TrajectoryStore {
    fn snapshot(&self) -> PoseSnapshot {
        PoseSnapshot::new(self.inner.read().frames.clone())
    }

    fn origin_timestamp(&self) -> Option<Timestamp> {
        self.inner.read().origin
    }
}
