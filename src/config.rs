//! Application configuration, loaded from YAML.
//!
//! ```yaml
//! sink: rerun          # or "log"
//! viz:
//!   tick_rate_hz: 10
//!   publish_camera: true
//!   republish_cap: 10
//! replay:
//!   rate_hz: 20
//!   keyframe_every: 5
//! ```
//!
//! Every field is optional; missing ones take their defaults.

use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, VizError};
use crate::system::ReplayConfig;
use crate::viz::VizConfig;

/// Where markers are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Spawn a Rerun viewer.
    #[default]
    Rerun,
    /// Log markers through `tracing` only.
    Log,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sink: SinkKind,
    pub viz: VizConfig,
    pub replay: ReplayConfig,
}

impl AppConfig {
    /// Load from a YAML file and validate the visualizer section.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| VizError::Config(format!("cannot open {}: {}", path.display(), e)))?;
        let config: AppConfig = serde_yaml::from_reader(file)?;
        config.viz.validate()?;
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(text)?;
        config.viz.validate()?;
        Ok(config)
    }
}
