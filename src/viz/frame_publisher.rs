//! Frame publisher: camera / point / text markers for trajectory frames.
//!
//! Each pass scans one trajectory snapshot in timestamp order and emits the
//! frames the [`FramePublishTracker`] says are due. Frames without a pose
//! produce nothing and are not charged against the cap; they are simply
//! reconsidered on the next pass.

use std::fmt::Write;

use tracing::trace;

use crate::geometry::SE3;
use crate::map::{FrameRecord, PoseSnapshot, Timestamp};

use super::config::VizConfig;
use super::marker::{Marker, MarkerId, NS_CAMERA, NS_POINT, NS_TEXT, Shape};
use super::sampler::Sampler;
use super::sink::MarkerSink;
use super::tracker::FramePublishTracker;

/// Outcome of one frame pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FramePassReport {
    /// Frames in the snapshot.
    pub scanned: usize,
    /// Frames emitted (and counted) this pass.
    pub published: usize,
    /// Frames skipped because their pose is not available yet.
    pub skipped_no_pose: usize,
    /// Markers handed to the sink.
    pub markers: usize,
}

pub struct FramePublisher {
    config: VizConfig,
    tracker: FramePublishTracker,
}

impl FramePublisher {
    pub fn new(config: &VizConfig) -> Self {
        Self {
            config: config.clone(),
            tracker: FramePublishTracker::new(config.republish_cap, config.refresh_probability),
        }
    }

    /// Publish counters, for inspection.
    pub fn tracker(&self) -> &FramePublishTracker {
        &self.tracker
    }

    /// Run one pass over `snapshot`.
    ///
    /// `origin` is time zero for verbose labels.
    pub fn publish(
        &mut self,
        snapshot: &PoseSnapshot,
        origin: Option<Timestamp>,
        sink: &mut dyn MarkerSink,
        sampler: &mut dyn Sampler,
    ) -> FramePassReport {
        let mut report = FramePassReport {
            scanned: snapshot.len(),
            ..Default::default()
        };
        if snapshot.is_empty() {
            return report;
        }

        for (&timestamp, record) in snapshot.iter() {
            let Some(pose) = record.pose() else {
                report.skipped_no_pose += 1;
                continue;
            };
            if !self.tracker.should_publish(timestamp, sampler) {
                continue;
            }

            report.markers += self.emit_frame(timestamp, record, pose, origin, sink);
            trace!(
                "Publish seq_id={} xc={} t={}",
                record.seq,
                self.tracker.count(timestamp),
                timestamp
            );
            self.tracker.record_publish(timestamp);
            report.published += 1;
        }

        report
    }

    /// Emit the enabled markers of one frame; returns how many were sent.
    fn emit_frame(
        &self,
        timestamp: Timestamp,
        record: &FrameRecord,
        pose: &SE3,
        origin: Option<Timestamp>,
        sink: &mut dyn MarkerSink,
    ) -> usize {
        let style = &self.config.style;
        let id = record.seq as u64;
        let color = if record.is_keyframe() {
            style.keyframe_color
        } else {
            style.frame_color
        };
        let position = pose.position();
        let mut sent = 0;

        if self.config.publish_camera {
            sink.publish(&Marker {
                id: MarkerId::new(NS_CAMERA, id),
                color,
                shape: Shape::Camera {
                    pose: *pose,
                    scale: style.camera_scale,
                },
            });
            sent += 1;
        }

        if self.config.publish_point {
            sink.publish(&Marker {
                id: MarkerId::new(NS_POINT, id),
                color,
                shape: Shape::Point {
                    position,
                    radius: style.point_radius,
                },
            });
            sent += 1;
        }

        if self.config.emits_text() {
            sink.publish(&Marker {
                id: MarkerId::new(NS_TEXT, id),
                color: style.text_color,
                shape: Shape::Text {
                    position,
                    text: self.label(record.seq, timestamp, origin),
                    height: style.text_height,
                },
            });
            sent += 1;
        }

        sent
    }

    /// `"<seq>;"`, verbose adds `"<secs since origin>;<absolute secs>;"`.
    fn label(&self, seq: usize, timestamp: Timestamp, origin: Option<Timestamp>) -> String {
        let mut text = format!("{};", seq);
        if self.config.verbose_text {
            let relative = origin.map(|o| timestamp.secs_since(o)).unwrap_or(0.0);
            let _ = write!(text, "{:.6};{:.6};", relative, timestamp.as_secs_f64());
        }
        text
    }
}
