//! Dataset loaders.

pub mod euroc;

pub use euroc::{EurocGroundTruth, GroundTruthEntry};
