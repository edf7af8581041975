//! Loop candidate publisher: one line marker per loop edge.
//!
//! Only the most recent `loop_window` candidates are redrawn each pass,
//! except for an occasional full-history redraw. Within the window every
//! candidate is re-emitted on every pass.

use nalgebra::Vector3;
use tracing::{error, trace};

use crate::error::{Result, VizError};
use crate::map::{LoopCandidateStore, PoseSnapshot, Timestamp};

use super::config::VizConfig;
use super::marker::{Marker, MarkerId, NS_LOOP, Shape};
use super::sampler::Sampler;
use super::sink::MarkerSink;

/// Outcome of one loop candidate pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopPassReport {
    /// Candidates known when the pass started.
    pub total: usize,
    /// First candidate index drawn.
    pub start: usize,
    /// Candidates emitted out of the range `[start, total)`.
    pub published: usize,
    /// Candidates in range held back because an endpoint has no pose yet.
    pub skipped_no_pose: usize,
    /// Whether the full-history refresh fired.
    pub full_refresh: bool,
}

pub struct LoopCandidatePublisher {
    window: usize,
    refresh_probability: f64,
    color: [u8; 3],
    line_width: f32,
}

impl LoopCandidatePublisher {
    pub fn new(config: &VizConfig) -> Self {
        Self {
            window: config.loop_window,
            refresh_probability: config.loop_refresh_probability,
            color: config.style.loop_color,
            line_width: config.style.loop_line_width,
        }
    }

    /// First index to draw out of `total` candidates.
    pub fn window_start(&self, total: usize, sampler: &mut dyn Sampler) -> (usize, bool) {
        if sampler.sample(self.refresh_probability) {
            (0, true)
        } else {
            (total.saturating_sub(self.window), false)
        }
    }

    /// Run one pass over candidates `[0, total)`.
    ///
    /// `total` must be read from `candidates` before `snapshot` is taken, so
    /// every counted candidate's frames exist in the snapshot. An endpoint
    /// missing from `snapshot` is a consistency violation and aborts the
    /// pass with [`VizError::UnknownTimestamp`]. An endpoint whose pose is
    /// not available yet only skips that candidate for this pass.
    pub fn publish(
        &self,
        candidates: &dyn LoopCandidateStore,
        total: usize,
        snapshot: &PoseSnapshot,
        sink: &mut dyn MarkerSink,
        sampler: &mut dyn Sampler,
    ) -> Result<LoopPassReport> {
        if total == 0 {
            return Ok(LoopPassReport::default());
        }

        let (start, full_refresh) = self.window_start(total, sampler);
        trace!("publish_loopcandidates start={} end={}", start, total);

        let mut report = LoopPassReport {
            total,
            start,
            published: 0,
            skipped_no_pose: 0,
            full_refresh,
        };

        for index in start..total {
            // Append-only: anything below the count read above stays valid
            let Some(edge) = candidates.candidate_at(index) else {
                break;
            };
            let from = resolve_position(snapshot, index, edge.current)?;
            let to = resolve_position(snapshot, index, edge.previous)?;
            let (Some(from), Some(to)) = (from, to) else {
                trace!("Loop candidate {} waits for an endpoint pose", index);
                report.skipped_no_pose += 1;
                continue;
            };

            sink.publish(&Marker {
                id: MarkerId::new(NS_LOOP, index as u64),
                color: self.color,
                shape: Shape::Line {
                    from,
                    to,
                    width: self.line_width,
                },
            });
            report.published += 1;
        }

        Ok(report)
    }
}

/// Position of a candidate endpoint, `None` while its pose is pending.
fn resolve_position(
    snapshot: &PoseSnapshot,
    candidate: usize,
    timestamp: Timestamp,
) -> Result<Option<Vector3<f64>>> {
    match snapshot.get(&timestamp) {
        Some(record) => Ok(record.position()),
        None => {
            error!(
                "Loop candidate {} references timestamp {} missing from the trajectory",
                candidate, timestamp
            );
            Err(VizError::UnknownTimestamp {
                candidate,
                timestamp,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::SE3;
    use crate::map::{LoopEdge, LoopEdgeStore, PoseStore, TrajectoryStore};
    use crate::viz::sampler::{FixedSampler, RngSampler};
    use crate::viz::sink::RecordingSink;

    fn setup(frames: u64, candidates: u64) -> (TrajectoryStore, LoopEdgeStore) {
        let trajectory = TrajectoryStore::new();
        for i in 0..frames {
            let pose = SE3::from_translation(Vector3::new(i as f64, 0.0, 1.0));
            trajectory
                .insert_frame(Timestamp(i * 10), true, Some(pose))
                .unwrap();
        }
        let loops = LoopEdgeStore::new();
        for i in 0..candidates {
            // candidate i links frame i+20 back to frame i
            loops.push(LoopEdge::new(Timestamp((i + 20) * 10), Timestamp(i * 10), 0.9));
        }
        (trajectory, loops)
    }

    fn publisher(window: usize, refresh: f64) -> LoopCandidatePublisher {
        LoopCandidatePublisher::new(&VizConfig {
            loop_window: window,
            loop_refresh_probability: refresh,
            ..Default::default()
        })
    }

    #[test]
    fn test_no_candidates_is_noop() {
        let (trajectory, loops) = setup(5, 0);
        let mut sink = RecordingSink::new();
        let report = publisher(10, 1.0)
            .publish(
                &loops,
                loops.count(),
                &trajectory.snapshot(),
                &mut sink,
                &mut FixedSampler(true),
            )
            .unwrap();
        assert_eq!(report, LoopPassReport::default());
        assert!(sink.markers.is_empty());
    }

    #[test]
    fn test_window_covers_most_recent_candidates() {
        let (trajectory, loops) = setup(40, 15);
        let mut sink = RecordingSink::new();
        let mut sampler = RngSampler::from_seed(Some(2));
        let report = publisher(10, 0.0)
            .publish(
                &loops,
                loops.count(),
                &trajectory.snapshot(),
                &mut sink,
                &mut sampler,
            )
            .unwrap();

        assert_eq!(report.start, 5);
        assert_eq!(report.published, 10);
        assert!(!report.full_refresh);
        assert_eq!(sink.ids_in(NS_LOOP), (5..15).collect::<Vec<u64>>());

        let style = VizConfig::default().style;
        for marker in &sink.markers {
            let i = marker.id.id as f64;
            assert_eq!(marker.color, style.loop_color);
            match &marker.shape {
                Shape::Line { from, to, .. } => {
                    assert_eq!(*from, Vector3::new(i + 20.0, 0.0, 1.0));
                    assert_eq!(*to, Vector3::new(i, 0.0, 1.0));
                }
                other => panic!("unexpected shape {:?}", other),
            }
        }
    }

    #[test]
    fn test_window_larger_than_history() {
        let (trajectory, loops) = setup(30, 4);
        let mut sink = RecordingSink::new();
        let report = publisher(10, 0.0)
            .publish(
                &loops,
                loops.count(),
                &trajectory.snapshot(),
                &mut sink,
                &mut FixedSampler(false),
            )
            .unwrap();
        assert_eq!(report.start, 0);
        assert_eq!(sink.ids_in(NS_LOOP), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_full_refresh_draws_everything() {
        let (trajectory, loops) = setup(40, 15);
        let mut sink = RecordingSink::new();
        let report = publisher(10, 1.0)
            .publish(
                &loops,
                loops.count(),
                &trajectory.snapshot(),
                &mut sink,
                &mut RngSampler::from_seed(None),
            )
            .unwrap();
        assert!(report.full_refresh);
        assert_eq!(report.published, 15);
        assert_eq!(sink.ids_in(NS_LOOP), (0..15).collect::<Vec<u64>>());
    }

    #[test]
    fn test_window_is_redrawn_every_pass() {
        let (trajectory, loops) = setup(40, 3);
        let mut sink = RecordingSink::new();
        let p = publisher(10, 0.0);
        for _ in 0..4 {
            p.publish(
                &loops,
                loops.count(),
                &trajectory.snapshot(),
                &mut sink,
                &mut FixedSampler(false),
            )
            .unwrap();
        }
        assert_eq!(sink.markers.len(), 12);
    }

    #[test]
    fn test_unknown_timestamp_is_fatal() {
        let (trajectory, loops) = setup(10, 0);
        loops.push(LoopEdge::new(Timestamp(90), Timestamp(5), 0.5));
        let mut sink = RecordingSink::new();
        let err = publisher(10, 0.0)
            .publish(
                &loops,
                loops.count(),
                &trajectory.snapshot(),
                &mut sink,
                &mut FixedSampler(false),
            )
            .unwrap_err();
        match err {
            VizError::UnknownTimestamp {
                candidate,
                timestamp,
            } => {
                assert_eq!(candidate, 0);
                assert_eq!(timestamp, Timestamp(5));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(sink.markers.is_empty());
    }

    #[test]
    fn test_endpoint_without_pose_waits_for_it() {
        let trajectory = TrajectoryStore::new();
        trajectory
            .insert_frame(Timestamp(1), true, Some(SE3::identity()))
            .unwrap();
        trajectory.insert_frame(Timestamp(2), true, None).unwrap();
        let loops = LoopEdgeStore::new();
        loops.push(LoopEdge::new(Timestamp(2), Timestamp(1), 0.8));
        let p = publisher(10, 0.0);

        let mut sink = RecordingSink::new();
        let report = p
            .publish(
                &loops,
                loops.count(),
                &trajectory.snapshot(),
                &mut sink,
                &mut FixedSampler(false),
            )
            .unwrap();
        assert_eq!(report.published, 0);
        assert_eq!(report.skipped_no_pose, 1);
        assert!(sink.markers.is_empty());

        let pose = SE3::from_translation(Vector3::new(3.0, 0.0, 0.0));
        trajectory.set_pose(Timestamp(2), pose).unwrap();
        let report = p
            .publish(
                &loops,
                loops.count(),
                &trajectory.snapshot(),
                &mut sink,
                &mut FixedSampler(false),
            )
            .unwrap();
        assert_eq!((report.published, report.skipped_no_pose), (1, 0));
        match &sink.find(MarkerId::new(NS_LOOP, 0)).unwrap().shape {
            Shape::Line { from, to, .. } => {
                assert_eq!(*from, Vector3::new(3.0, 0.0, 0.0));
                assert_eq!(*to, Vector3::zeros());
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }
}
