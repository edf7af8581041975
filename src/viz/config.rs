//! Configuration for the visualization publisher.

use serde::Deserialize;

use crate::error::{Result, VizError};

/// Publisher configuration: tick rate, which primitives to emit and the
/// throttling parameters for frames and loop candidates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    /// Run loop rate in Hz. Must be positive.
    pub tick_rate_hz: f64,

    /// Emit a camera frustum per frame.
    pub publish_camera: bool,

    /// Emit a position point per frame.
    pub publish_point: bool,

    /// Emit a text label with the sequence index per frame.
    pub publish_text: bool,

    /// Append relative and absolute time to text labels. Implies text.
    pub verbose_text: bool,

    /// Number of times a frame is published before it falls back to
    /// random refreshes only.
    pub republish_cap: u32,

    /// Per-frame, per-tick probability of republishing regardless of count.
    pub refresh_probability: f64,

    /// Number of most recent loop candidates redrawn every tick.
    pub loop_window: usize,

    /// Per-tick probability of redrawing every loop candidate.
    pub loop_refresh_probability: f64,

    /// Seed for the sampling RNG. Random if unset.
    pub seed: Option<u64>,

    /// Root entity path / topic prefix for all markers.
    pub base_path: String,

    pub style: StyleConfig,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 10.0,
            publish_camera: false,
            publish_point: true,
            publish_text: true,
            verbose_text: false,
            republish_cap: 10,
            refresh_probability: 0.02,
            loop_window: 10,
            loop_refresh_probability: 0.02,
            seed: None,
            base_path: "world".to_string(),
            style: StyleConfig::default(),
        }
    }
}

impl VizConfig {
    /// Check the values that make the run loop meaningless if wrong.
    pub fn validate(&self) -> Result<()> {
        if !(self.tick_rate_hz.is_finite() && self.tick_rate_hz > 0.0) {
            return Err(VizError::InvalidTickRate(self.tick_rate_hz));
        }
        for (name, p) in [
            ("refresh_probability", self.refresh_probability),
            ("loop_refresh_probability", self.loop_refresh_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(VizError::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, p
                )));
            }
        }
        Ok(())
    }

    /// Whether any per-frame text label is emitted.
    pub fn emits_text(&self) -> bool {
        self.publish_text || self.verbose_text
    }
}

/// Colors and sizes of the emitted primitives.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub keyframe_color: [u8; 3],
    pub frame_color: [u8; 3],
    pub text_color: [u8; 3],
    pub loop_color: [u8; 3],

    /// Frustum size in meters.
    pub camera_scale: f32,
    pub point_radius: f32,
    pub text_height: f32,
    pub loop_line_width: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            keyframe_color: [0, 255, 0],
            frame_color: [255, 140, 0],
            text_color: [255, 255, 255],
            loop_color: [255, 0, 0],
            camera_scale: 0.5,
            point_radius: 0.015,
            text_height: 0.03,
            loop_line_width: 0.01,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_publish_policy() {
        let config = VizConfig::default();
        assert!(!config.publish_camera);
        assert!(config.publish_point);
        assert!(config.publish_text);
        assert!(!config.verbose_text);
        assert_eq!(config.republish_cap, 10);
        assert_eq!(config.loop_window, 10);
        assert!((config.refresh_probability - 0.02).abs() < 1e-12);
        assert!((config.loop_refresh_probability - 0.02).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_tick_rate() {
        for rate in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let config = VizConfig {
                tick_rate_hz: rate,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(VizError::InvalidTickRate(_))
            ));
        }
    }

    #[test]
    fn test_validate_rejects_bad_probability() {
        let config = VizConfig {
            loop_refresh_probability: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(VizError::Config(_))));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "tick_rate_hz: 30\npublish_camera: true\nstyle:\n  loop_color: [0, 0, 255]\n";
        let config: VizConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.tick_rate_hz, 30.0);
        assert!(config.publish_camera);
        assert!(config.publish_point);
        assert_eq!(config.style.loop_color, [0, 0, 255]);
        assert_eq!(config.style.keyframe_color, [0, 255, 0]);
    }
}
