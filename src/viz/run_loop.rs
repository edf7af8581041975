//! Visualizer run loop.
//!
//! The `Visualizer` owns the publish state (counters, sampler) and drives
//! both publishers at a fixed rate:
//!
//! ```text
//! Idle --run()/spawn()--> Running --stop requested--> Stopped
//!                            |
//!                            +--consistency violation--> Stopped (Err)
//! ```
//!
//! Each tick runs to completion: frame pass, loop candidate pass,
//! heartbeat, then sleep until the next tick boundary. A stop request wakes
//! the sleeper early but is only acted on at the top of the next tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use tracing::{debug, error, info};

use crate::error::{Result, VizError};
use crate::map::{LoopCandidateStore, PoseStore};

use super::config::VizConfig;
use super::frame_publisher::{FramePassReport, FramePublisher};
use super::loop_publisher::{LoopCandidatePublisher, LoopPassReport};
use super::marker::Heartbeat;
use super::sampler::{RngSampler, Sampler};
use super::sink::MarkerSink;
use super::tracker::FramePublishTracker;

/// Lifecycle of the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Constructed, not started.
    Idle,
    /// Ticking.
    Running,
    /// Terminal.
    Stopped,
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub frames: FramePassReport,
    /// `None` when no loop candidate store is attached.
    pub loops: Option<LoopPassReport>,
}

/// Totals over the lifetime of a run loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VizStats {
    pub ticks: u64,
    pub frames_published: u64,
    pub markers_published: u64,
    pub candidates_published: u64,
}

/// Cloneable handle to request a cooperative stop.
#[derive(Clone)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
    waker: Sender<()>,
}

impl StopHandle {
    /// Request a stop; the loop exits at the top of its next tick.
    pub fn stop(&self) {
        self.requested.store(true, Ordering::SeqCst);
        // Full channel means a wake-up is already pending
        let _ = self.waker.try_send(());
    }

    pub fn is_stop_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

pub struct Visualizer {
    config: VizConfig,
    pose_store: Option<Arc<dyn PoseStore>>,
    loop_store: Option<Arc<dyn LoopCandidateStore>>,
    enabled: bool,
    state: RunState,
    frames: FramePublisher,
    loops: LoopCandidatePublisher,
    sampler: Box<dyn Sampler>,
    stop: StopHandle,
    wake_rx: Receiver<()>,
    stats: VizStats,
}

impl Visualizer {
    pub fn new(config: VizConfig) -> Self {
        let (waker, wake_rx) = bounded(1);
        Self {
            frames: FramePublisher::new(&config),
            loops: LoopCandidatePublisher::new(&config),
            sampler: Box::new(RngSampler::from_seed(config.seed)),
            config,
            pose_store: None,
            loop_store: None,
            enabled: false,
            state: RunState::Idle,
            stop: StopHandle {
                requested: Arc::new(AtomicBool::new(false)),
                waker,
            },
            wake_rx,
            stats: VizStats::default(),
        }
    }

    /// Replace the probability source used by both publishers.
    pub fn with_sampler(mut self, sampler: Box<dyn Sampler>) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn set_pose_store(&mut self, store: Arc<dyn PoseStore>) {
        self.pose_store = Some(store);
    }

    /// Attach the loop candidate list. Without it the loop pass is skipped.
    pub fn set_loop_store(&mut self, store: Arc<dyn LoopCandidateStore>) {
        self.loop_store = Some(store);
    }

    /// Allow the run loop to start.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn config(&self) -> &VizConfig {
        &self.config
    }

    pub fn stats(&self) -> VizStats {
        self.stats
    }

    pub fn frame_tracker(&self) -> &FramePublishTracker {
        self.frames.tracker()
    }

    /// Verify every precondition for Idle -> Running.
    pub fn check_ready(&self) -> Result<()> {
        if self.state != RunState::Idle {
            return Err(VizError::InvalidState {
                action: "start",
                state: self.state,
            });
        }
        if self.pose_store.is_none() {
            return Err(VizError::MissingPoseStore);
        }
        if !self.enabled {
            return Err(VizError::NotEnabled);
        }
        self.config.validate()
    }

    /// Run one publish pass: frames, loop candidates, heartbeat.
    pub fn tick(&mut self, sink: &mut dyn MarkerSink) -> Result<TickReport> {
        let pose_store = self.pose_store.as_ref().ok_or(VizError::MissingPoseStore)?;
        let tick = self.stats.ticks;

        // Candidates are appended only after their frames, so counting them
        // before the snapshot guarantees the snapshot contains their frames
        let loop_total = self.loop_store.as_ref().map(|s| s.count());
        let snapshot = pose_store.snapshot();
        let origin = pose_store.origin_timestamp();

        sink.begin_tick(tick);
        let frames = self
            .frames
            .publish(&snapshot, origin, sink, self.sampler.as_mut());

        let loops = match (&self.loop_store, loop_total) {
            (Some(store), Some(total)) => Some(self.loops.publish(
                store.as_ref(),
                total,
                &snapshot,
                sink,
                self.sampler.as_mut(),
            )?),
            _ => None,
        };

        sink.heartbeat(&Heartbeat {
            tick,
            text: format!("hello world {:.3}", unix_time_secs()),
        });

        self.stats.ticks += 1;
        self.stats.frames_published += frames.published as u64;
        self.stats.markers_published += frames.markers as u64;
        if let Some(l) = &loops {
            self.stats.candidates_published += l.published as u64;
            self.stats.markers_published += l.published as u64;
        }

        debug!(
            "tick {}: {}/{} frames published ({} without pose), {} loop candidates",
            tick,
            frames.published,
            frames.scanned,
            frames.skipped_no_pose,
            loops.map(|l| l.published).unwrap_or(0)
        );

        Ok(TickReport {
            tick,
            frames,
            loops,
        })
    }

    /// Run the loop on the current thread until a stop is requested.
    ///
    /// Returns the lifetime stats, or the error that stopped the loop.
    pub fn run(&mut self, sink: &mut dyn MarkerSink) -> Result<VizStats> {
        self.check_ready()?;
        let period = Duration::from_secs_f64(1.0 / self.config.tick_rate_hz);
        self.state = RunState::Running;
        info!(
            "Visualizer started at {:.1} Hz (cap={}, window={})",
            self.config.tick_rate_hz, self.config.republish_cap, self.config.loop_window
        );

        let mut next_tick = Instant::now();
        loop {
            if self.stop.is_stop_requested() {
                break;
            }

            if let Err(e) = self.tick(sink) {
                error!("Visualizer stopped on fatal error: {}", e);
                self.state = RunState::Stopped;
                return Err(e);
            }

            next_tick += period;
            let now = Instant::now();
            if next_tick > now {
                match self.wake_rx.recv_timeout(next_tick - now) {
                    Ok(()) | Err(RecvTimeoutError::Timeout) => {}
                    // We hold a sender ourselves, so this cannot happen
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            } else {
                debug!(
                    "tick overran its period by {:?}",
                    now.duration_since(next_tick)
                );
                next_tick = now;
            }
        }

        self.state = RunState::Stopped;
        let tracker = self.frames.tracker();
        info!(
            "Visualizer exiting. Stats: ticks={}, frames={}, markers={}, loop_candidates={}, \
             tracked={}, saturated={}",
            self.stats.ticks,
            self.stats.frames_published,
            self.stats.markers_published,
            self.stats.candidates_published,
            tracker.tracked(),
            tracker.saturated()
        );
        Ok(self.stats)
    }

    /// Run the loop on a dedicated thread.
    ///
    /// Preconditions are checked before the thread is spawned, so a
    /// misconfigured visualizer fails here rather than in the background.
    pub fn spawn<S>(mut self, sink: S) -> Result<VisualizerHandle>
    where
        S: MarkerSink + 'static,
    {
        self.check_ready()?;
        let stop = self.stop_handle();
        let handle = thread::Builder::new()
            .name("slam-viz".to_string())
            .spawn(move || {
                let mut sink = sink;
                self.run(&mut sink)
            })?;
        Ok(VisualizerHandle {
            stop,
            handle: Some(handle),
        })
    }
}

/// Handle to a visualizer running on its own thread.
///
/// Dropping the handle stops the loop and waits for it.
pub struct VisualizerHandle {
    stop: StopHandle,
    handle: Option<JoinHandle<Result<VizStats>>>,
}

impl VisualizerHandle {
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Wait for the loop to exit. Does not request a stop by itself.
    pub fn join(mut self) -> Result<VizStats> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| VizError::ThreadPanicked)?,
            None => Err(VizError::InvalidState {
                action: "join",
                state: RunState::Stopped,
            }),
        }
    }
}

impl Drop for VisualizerHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.stop.stop();
            let _ = handle.join();
        }
    }
}

fn unix_time_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
