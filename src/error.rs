//! Error types for the visualization publisher and its stores.

use thiserror::Error;

use crate::map::Timestamp;
use crate::viz::RunState;

/// slam_viz error type
#[derive(Error, Debug)]
pub enum VizError {
    #[error("no pose store set: call Visualizer::set_pose_store() before starting")]
    MissingPoseStore,

    #[error("visualizer not enabled: call Visualizer::enable() before starting")]
    NotEnabled,

    #[error("tick rate must be a positive finite number, got {0}")]
    InvalidTickRate(f64),

    #[error("cannot {action} while visualizer is {state:?}")]
    InvalidState {
        action: &'static str,
        state: RunState,
    },

    #[error("loop candidate {candidate} references timestamp {timestamp} that is not in the trajectory")]
    UnknownTimestamp {
        candidate: usize,
        timestamp: Timestamp,
    },

    #[error("frame timestamp {timestamp} is not after the latest frame {latest}")]
    NonMonotonicTimestamp {
        timestamp: Timestamp,
        latest: Timestamp,
    },

    #[error("no frame with timestamp {0}")]
    UnknownFrame(Timestamp),

    #[error("pose for frame {0} was already set")]
    PoseAlreadySet(Timestamp),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to spawn visualizer thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("visualizer thread panicked")]
    ThreadPanicked,
}

impl From<serde_yaml::Error> for VizError {
    fn from(e: serde_yaml::Error) -> Self {
        VizError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VizError>;
