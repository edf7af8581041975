//! Dataset replay: feeds recorded poses into the shared stores at a fixed
//! rate, standing in for a live tracking pipeline.
//!
//! Per replayed frame:
//! 1. Insert the frame (keyframe every `keyframe_every` frames), pose pending
//! 2. Provide the pose of the frame `pose_delay_frames` back
//! 3. If that frame is a keyframe, look for a loop against older keyframes

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use nalgebra::Vector3;
use serde::Deserialize;
use tracing::{debug, info};

use crate::io::GroundTruthEntry;
use crate::map::{LoopEdge, Timestamp};

use super::shared_state::SharedState;

/// Configuration for the replay feeder.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Frames inserted per second.
    pub rate_hz: f64,

    /// Keep every n-th dataset entry (EuRoC ground truth is 200 Hz).
    pub decimate: usize,

    /// Every n-th replayed frame is a keyframe.
    pub keyframe_every: usize,

    /// A keyframe closer than this to an older keyframe forms a loop.
    pub loop_radius_m: f64,

    /// Minimum frame gap between the two keyframes of a loop.
    pub loop_min_gap: usize,

    /// Frames between inserting a frame and providing its pose.
    pub pose_delay_frames: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            rate_hz: 20.0,
            decimate: 10,
            keyframe_every: 5,
            loop_radius_m: 0.3,
            loop_min_gap: 50,
            pose_delay_frames: 2,
        }
    }
}

/// Statistics for the replay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub frames: usize,
    pub keyframes: usize,
    pub poses: usize,
    pub loops: usize,
}

struct PostedKeyFrame {
    frame_index: usize,
    timestamp: Timestamp,
    position: Vector3<f64>,
}

pub struct ReplayFeeder {
    shared: Arc<SharedState>,
    config: ReplayConfig,
    entries: Vec<GroundTruthEntry>,
    /// Frames inserted without a pose yet: (frame index, is_keyframe).
    pending: VecDeque<(usize, bool)>,
    keyframes: Vec<PostedKeyFrame>,
    stats: ReplayStats,
}

impl ReplayFeeder {
    pub fn new(
        shared: Arc<SharedState>,
        config: ReplayConfig,
        entries: Vec<GroundTruthEntry>,
    ) -> Self {
        Self {
            shared,
            config,
            entries,
            pending: VecDeque::new(),
            keyframes: Vec::new(),
            stats: ReplayStats::default(),
        }
    }

    pub fn stats(&self) -> ReplayStats {
        self.stats
    }

    /// Replay frame `index`.
    pub fn step(&mut self, index: usize) -> Result<()> {
        let entry = &self.entries[index];
        let is_keyframe = index % self.config.keyframe_every.max(1) == 0;
        self.shared
            .trajectory
            .insert_frame(entry.timestamp, is_keyframe, None)?;
        self.stats.frames += 1;
        if is_keyframe {
            self.stats.keyframes += 1;
        }

        self.pending.push_back((index, is_keyframe));
        while self.pending.len() > self.config.pose_delay_frames {
            self.release_oldest_pose()?;
        }
        Ok(())
    }

    /// Provide every pose still pending.
    pub fn flush(&mut self) -> Result<()> {
        while !self.pending.is_empty() {
            self.release_oldest_pose()?;
        }
        Ok(())
    }

    fn release_oldest_pose(&mut self) -> Result<()> {
        let Some((index, is_keyframe)) = self.pending.pop_front() else {
            return Ok(());
        };
        let entry = &self.entries[index];
        let (timestamp, pose) = (entry.timestamp, entry.pose);
        self.shared.trajectory.set_pose(timestamp, pose)?;
        self.stats.poses += 1;

        if is_keyframe {
            // Pose is in the store before the edge is pushed
            if let Some(edge) = self.detect_loop(index, timestamp, &pose.translation) {
                let idx = self.shared.loops.push(edge);
                self.stats.loops += 1;
                debug!(
                    "Loop candidate {}: {} -> {} (score: {:.3})",
                    idx, edge.current, edge.previous, edge.score
                );
            }
            self.keyframes.push(PostedKeyFrame {
                frame_index: index,
                timestamp,
                position: pose.translation,
            });
        }
        Ok(())
    }

    /// Closest older keyframe within the loop radius, respecting the gap.
    fn detect_loop(
        &self,
        index: usize,
        timestamp: Timestamp,
        position: &Vector3<f64>,
    ) -> Option<LoopEdge> {
        let radius = self.config.loop_radius_m;
        self.keyframes
            .iter()
            .filter(|kf| kf.frame_index + self.config.loop_min_gap <= index)
            .map(|kf| (kf, (kf.position - position).norm()))
            .filter(|(_, d)| *d < radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(kf, d)| LoopEdge::new(timestamp, kf.timestamp, 1.0 - d / radius))
    }

    /// Replay all entries at `rate_hz`, stopping early on shutdown.
    pub fn run(&mut self) -> Result<ReplayStats> {
        info!(
            "Replay started: {} frames at {:.1} Hz",
            self.entries.len(),
            self.config.rate_hz
        );
        let period = Duration::from_secs_f64(1.0 / self.config.rate_hz.max(1e-3));
        let mut next = Instant::now();

        for index in 0..self.entries.len() {
            if self.shared.is_shutdown_requested() {
                break;
            }
            self.step(index)?;

            next += period;
            let now = Instant::now();
            if next > now {
                thread::sleep(next - now);
            }
        }
        self.flush()?;

        info!(
            "Replay finished. Stats: frames={}, keyframes={}, poses={}, loops={}",
            self.stats.frames, self.stats.keyframes, self.stats.poses, self.stats.loops
        );
        Ok(self.stats)
    }
}

/// Spawn the replay thread.
///
/// Returns a handle to the spawned thread.
pub fn spawn_replay(
    shared: Arc<SharedState>,
    config: ReplayConfig,
    entries: Vec<GroundTruthEntry>,
) -> std::io::Result<thread::JoinHandle<Result<ReplayStats>>> {
    thread::Builder::new()
        .name("slam-viz-replay".to_string())
        .spawn(move || {
            let mut feeder = ReplayFeeder::new(shared, config, entries);
            feeder.run()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::SE3;
    use crate::map::{LoopCandidateStore, PoseStore};

    /// Out along +x and back, so late keyframes revisit early ones.
    fn out_and_back(n: usize) -> Vec<GroundTruthEntry> {
        (0..n)
            .map(|i| {
                let half = n / 2;
                let step = if i < half { i } else { n - 1 - i };
                let x = step as f64 * 0.1;
                GroundTruthEntry {
                    timestamp: Timestamp(1_000 + i as u64 * 50),
                    pose: SE3::from_translation(Vector3::new(x, 0.0, 0.0)),
                }
            })
            .collect()
    }

    fn config() -> ReplayConfig {
        ReplayConfig {
            rate_hz: 1000.0,
            keyframe_every: 5,
            loop_radius_m: 0.25,
            loop_min_gap: 20,
            pose_delay_frames: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_pose_arrives_after_delay() {
        let shared = SharedState::new();
        let entries = out_and_back(10);
        let first = entries[0].timestamp;
        let mut feeder = ReplayFeeder::new(shared.clone(), config(), entries);

        feeder.step(0).unwrap();
        feeder.step(1).unwrap();
        assert!(!shared.trajectory.get(&first).unwrap().is_pose_available());
        feeder.step(2).unwrap();
        assert!(shared.trajectory.get(&first).unwrap().is_pose_available());
        assert_eq!(shared.trajectory.origin_timestamp(), Some(first));

        feeder.flush().unwrap();
        let snap = shared.trajectory.snapshot();
        assert!(snap.iter().all(|(_, r)| r.is_pose_available()));
        assert_eq!(feeder.stats().poses, 3);
    }

    #[test]
    fn test_keyframe_cadence() {
        let shared = SharedState::new();
        let mut feeder = ReplayFeeder::new(shared.clone(), config(), out_and_back(11));
        for i in 0..11 {
            feeder.step(i).unwrap();
        }
        let keyframes: Vec<usize> = shared
            .trajectory
            .snapshot()
            .iter()
            .filter(|(_, r)| r.is_keyframe())
            .map(|(_, r)| r.seq)
            .collect();
        assert_eq!(keyframes, vec![0, 5, 10]);
    }

    #[test]
    fn test_return_path_produces_consistent_loops() {
        let shared = SharedState::new();
        let mut feeder = ReplayFeeder::new(shared.clone(), config(), out_and_back(60));
        let stats = feeder.run().unwrap();

        assert_eq!(stats.frames, 60);
        assert!(stats.loops > 0);
        let snap = shared.trajectory.snapshot();
        for i in 0..shared.loops.count() {
            let edge = shared.loops.candidate_at(i).unwrap();
            let a = snap.get(&edge.current).unwrap();
            let b = snap.get(&edge.previous).unwrap();
            assert!(a.is_keyframe() && b.is_keyframe());
            assert!(a.seq >= b.seq + 20);
            let d = (a.position().unwrap() - b.position().unwrap()).norm();
            assert!(d < 0.25);
            assert!(edge.score > 0.0 && edge.score <= 1.0);
        }
    }

    #[test]
    fn test_shutdown_stops_replay() {
        let shared = SharedState::new();
        shared.request_shutdown();
        let handle = spawn_replay(shared.clone(), config(), out_and_back(30)).unwrap();
        let stats = handle.join().unwrap().unwrap();
        assert_eq!(stats.frames, 0);
        assert!(shared.trajectory.is_empty());
    }
}
