//! Throttled trajectory visualization.
//!
//! The [`Visualizer`] periodically samples the trajectory and loop candidate
//! stores and turns them into [`Marker`]s for a viewer, bounding how often
//! unchanged history is re-sent:
//!
//! - **Frames** (`frame_publisher.rs`): every frame is sent up to
//!   `republish_cap` times, then only on a small random refresh
//!   (`tracker.rs`).
//! - **Loop candidates** (`loop_publisher.rs`): the last `loop_window`
//!   candidates are redrawn every tick, with an occasional full redraw.
//! - **Transport** (`sink.rs`, `rerun.rs`): markers keyed by
//!   `(namespace, id)` so a viewer overwrites instead of duplicating.
//!
//! # Threading Model
//!
//! The run loop lives on its own thread and only reads the stores through
//! point-in-time snapshots. Counters and the sampler are private to that
//! thread, so nothing here takes a lock across a tick.

pub mod config;
pub mod frame_publisher;
pub mod loop_publisher;
pub mod marker;
pub mod rerun;
pub mod run_loop;
pub mod sampler;
pub mod sink;
pub mod tracker;

pub use config::{StyleConfig, VizConfig};
pub use frame_publisher::{FramePassReport, FramePublisher};
pub use loop_publisher::{LoopCandidatePublisher, LoopPassReport};
pub use marker::{Heartbeat, Marker, MarkerId, MarkerKind, Shape};
pub use self::rerun::RerunSink;
pub use run_loop::{RunState, StopHandle, TickReport, Visualizer, VisualizerHandle, VizStats};
pub use sampler::{FixedSampler, RngSampler, Sampler};
pub use sink::{MarkerSink, RecordingSink, TracingSink};
pub use tracker::FramePublishTracker;
