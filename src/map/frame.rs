//! Frame records stored in the trajectory.

use nalgebra::Vector3;

use crate::geometry::SE3;

/// One recorded pose-graph node.
///
/// Records are small and `Clone`, so a snapshot can copy them instead of
/// holding a lock on the owning store.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    /// Sequence index, assigned once at insertion. Equal to the rank of the
    /// timestamp because insertion order is timestamp order.
    pub seq: usize,

    /// Whether this frame was promoted to a keyframe.
    pub is_keyframe: bool,

    /// Camera pose (T_wc). `None` until the estimator provides it.
    pub pose: Option<SE3>,
}

impl FrameRecord {
    pub fn new(seq: usize, is_keyframe: bool, pose: Option<SE3>) -> Self {
        Self {
            seq,
            is_keyframe,
            pose,
        }
    }

    pub fn is_pose_available(&self) -> bool {
        self.pose.is_some()
    }

    pub fn is_keyframe(&self) -> bool {
        self.is_keyframe
    }

    pub fn pose(&self) -> Option<&SE3> {
        self.pose.as_ref()
    }

    /// Camera center in world coordinates, if the pose is known.
    pub fn position(&self) -> Option<Vector3<f64>> {
        self.pose.as_ref().map(SE3::position)
    }
}
