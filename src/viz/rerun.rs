//! Rerun transport for visualization markers.
//!
//! Entity hierarchy (under the configured base path, default `world`):
//!     chatter                     - Heartbeat text log
//!     cam_pose_vis/<seq>          - Camera frustum per frame
//!     cam_pose_pt/<seq>           - Position point per frame
//!     cam_pose_txt/<seq>          - Sequence-index label per frame
//!     loopcandidates_line/<idx>   - Loop candidate edge
//!
//! Every marker identity maps to its own entity path, so re-logging a
//! marker overwrites the previous value instead of accumulating.

use std::time::Instant;

use nalgebra::Vector3;
use rerun::{RecordingStream, external::glam};
use tracing::warn;

use crate::geometry::SE3;

use super::marker::{Heartbeat, Marker, MarkerId, Shape};
use super::sink::MarkerSink;

/// Frustum field of view (radians) and aspect ratio for camera markers.
const CAMERA_FOV_RAD: f32 = 1.0;
const CAMERA_ASPECT: f32 = 4.0 / 3.0;

pub struct RerunSink {
    rec: RecordingStream,
    base_path: String,
    started: Instant,
}

impl RerunSink {
    /// Spawn a Rerun viewer in a separate process and stream to it.
    pub fn spawn(app_name: &str, base_path: &str) -> Result<Self, rerun::RecordingStreamError> {
        let rec = rerun::RecordingStreamBuilder::new(app_name).spawn()?;
        Ok(Self::from_stream(rec, base_path))
    }

    /// Wrap an existing recording stream (file, buffered, remote...).
    pub fn from_stream(rec: RecordingStream, base_path: &str) -> Self {
        let base_path = base_path.trim_end_matches('/').to_string();
        // Trajectories from the estimator are Z-up
        if let Err(e) = rec.log_static(base_path.as_str(), &rerun::ViewCoordinates::RFU()) {
            warn!("Failed to set view coordinates: {}", e);
        }
        Self {
            rec,
            base_path,
            started: Instant::now(),
        }
    }

    pub fn entity_path(&self, id: &MarkerId) -> String {
        format!("{}/{}/{}", self.base_path, id.ns, id.id)
    }

    fn log_camera(&self, path: &str, pose: &SE3, scale: f32) {
        let t = &pose.translation;
        let q = &pose.rotation;
        let translation = glam::Vec3::new(t.x as f32, t.y as f32, t.z as f32);
        let rotation = glam::Quat::from_xyzw(
            q.coords.x as f32,
            q.coords.y as f32,
            q.coords.z as f32,
            q.w as f32,
        );
        self.rec
            .log(
                path,
                &rerun::Transform3D::from_translation_rotation(translation, rotation),
            )
            .ok();
        self.rec
            .log(
                path,
                &rerun::Pinhole::from_fov_and_aspect_ratio(CAMERA_FOV_RAD, CAMERA_ASPECT)
                    .with_image_plane_distance(scale),
            )
            .ok();
    }
}

impl MarkerSink for RerunSink {
    fn begin_tick(&mut self, _tick: u64) {
        self.rec
            .set_duration_secs("time", self.started.elapsed().as_secs_f64());
    }

    fn publish(&mut self, marker: &Marker) {
        let path = self.entity_path(&marker.id);
        let color = marker.color;
        match &marker.shape {
            Shape::Point { position, radius } => {
                self.rec
                    .log(
                        path.as_str(),
                        &rerun::Points3D::new([to_f32(position)])
                            .with_colors([color])
                            .with_radii([*radius]),
                    )
                    .ok();
            }
            Shape::Camera { pose, scale } => self.log_camera(&path, pose, *scale),
            Shape::Text {
                position,
                text,
                height,
            } => {
                self.rec
                    .log(
                        path.as_str(),
                        &rerun::Points3D::new([to_f32(position)])
                            .with_colors([color])
                            .with_radii([*height * 0.5])
                            .with_labels([text.as_str()]),
                    )
                    .ok();
            }
            Shape::Line { from, to, width } => {
                self.rec
                    .log(
                        path.as_str(),
                        &rerun::LineStrips3D::new([vec![to_f32(from), to_f32(to)]])
                            .with_colors([color])
                            .with_radii([*width * 0.5]),
                    )
                    .ok();
            }
        }
    }

    fn heartbeat(&mut self, heartbeat: &Heartbeat) {
        let path = format!("{}/chatter", self.base_path);
        self.rec
            .log(path.as_str(), &rerun::TextLog::new(heartbeat.text.as_str()))
            .ok();
    }
}

fn to_f32(p: &Vector3<f64>) -> [f32; 3] {
    [p.x as f32, p.y as f32, p.z as f32]
}
