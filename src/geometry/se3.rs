//! Rigid body transforms (SE3) for camera poses.
//!
//! Poses are stored as T_wc (camera to world): `p_world = R * p_cam + t`.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Rigid transform: rotation (unit quaternion) + translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SE3 {
    pub rotation: UnitQuaternion<f64>,
    pub translation: Vector3<f64>,
}

impl SE3 {
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn new(rotation: UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Pure translation.
    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation,
        }
    }

    /// Build from a w-first quaternion (normalized here) and a position.
    pub fn from_quaternion(qw: f64, qx: f64, qy: f64, qz: f64, translation: Vector3<f64>) -> Self {
        let rotation = UnitQuaternion::from_quaternion(Quaternion::new(qw, qx, qy, qz));
        Self {
            rotation,
            translation,
        }
    }

    /// Camera center in world coordinates (the translation column of T_wc).
    pub fn position(&self) -> Vector3<f64> {
        self.translation
    }
}

impl Default for SE3 {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_from_quaternion_normalizes() {
        let pose = SE3::from_quaternion(2.0, 0.0, 0.0, 0.0, Vector3::new(1.0, 1.0, 1.0));
        assert!((pose.rotation.norm() - 1.0).abs() < 1e-12);
        assert_eq!(pose.position(), Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_position_ignores_rotation() {
        let pose = SE3::new(
            UnitQuaternion::from_euler_angles(0.0, 0.0, FRAC_PI_2),
            Vector3::new(0.5, -1.0, 2.0),
        );
        assert_eq!(pose.position(), Vector3::new(0.5, -1.0, 2.0));
        assert!((pose.rotation.angle() - FRAC_PI_2).abs() < 1e-12);
    }
}
