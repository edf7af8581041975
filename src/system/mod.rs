//! Ingestion side: shared stores and the dataset replay thread.
//!
//! In a live system the tracker writes the stores; the replay feeder
//! plays that role for recorded datasets.

pub mod replay;
pub mod shared_state;

pub use replay::{spawn_replay, ReplayConfig, ReplayFeeder, ReplayStats};
pub use shared_state::SharedState;
