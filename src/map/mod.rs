//! Map module - trajectory and loop candidate stores.
//!
//! This module contains the data the visualizer reads:
//! - [`TrajectoryStore`] - ordered timestamp -> [`FrameRecord`] mapping
//! - [`LoopEdgeStore`] - append-only list of [`LoopEdge`]s
//!
//! The visualizer only depends on the read traits ([`PoseStore`],
//! [`LoopCandidateStore`]); the concrete stores are what the ingestion
//! side (tracking or dataset replay) writes into.

pub mod frame;
pub mod loop_edges;
pub mod trajectory;
pub mod types;

pub use frame::FrameRecord;
pub use loop_edges::{LoopCandidateStore, LoopEdge, LoopEdgeStore};
pub use trajectory::{PoseSnapshot, PoseStore, TrajectoryStore};
pub use types::Timestamp;
