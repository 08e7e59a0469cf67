use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Upper bound on the segment count; keeps slot counts in a range a host can render.
pub const MAX_SEGMENTS: usize = 1024;

/// Tuning for a dome gallery. Every field has a default, so a config file only
/// needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// Number of angular columns tiling the shell.
    pub segment_count: usize,
    /// Symmetric pitch clamp (degrees).
    pub max_pitch_deg: f64,
    /// Pointer pixels per degree of rotation. Larger feels heavier.
    pub drag_sensitivity: f64,
    /// Squared pointer displacement (px²) above which a gesture counts as a drag.
    pub tap_threshold_px2: f64,
    pub inertia: InertiaConfig,
    pub radius: RadiusConfig,
    pub hover: HoverConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InertiaConfig {
    /// Release speed (either axis) needed to start a free spin.
    pub release_threshold: f64,
    /// Per-axis clamp on the release velocity.
    pub max_release_velocity: f64,
    /// Release velocity to engine units.
    pub velocity_scale: f64,
    /// Per-frame velocity multiplier, in (0, 1).
    pub friction: f64,
    /// Spin stops once both velocities fall below this.
    pub stop_threshold: f64,
    /// Hard ceiling on applied frames per spin.
    pub max_frames: u32,
    /// Engine units per degree.
    pub angle_divisor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusConfig {
    /// Fraction of the shorter viewport side.
    pub fit: f64,
    /// Cap as a multiple of the viewport height.
    pub height_guard: f64,
    /// Lower bound (px).
    pub min_px: f64,
}

/// Presentation-only lift applied to the hovered slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoverConfig {
    pub lift_px: f64,
    pub scale: f64,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            segment_count: 35,
            max_pitch_deg: 5.0,
            drag_sensitivity: 20.0,
            tap_threshold_px2: 16.0,
            inertia: InertiaConfig::default(),
            radius: RadiusConfig::default(),
            hover: HoverConfig::default(),
        }
    }
}

impl Default for InertiaConfig {
    fn default() -> Self {
        Self {
            release_threshold: 0.005,
            max_release_velocity: 1.4,
            velocity_scale: 80.0,
            friction: 0.9614,
            stop_threshold: 0.009,
            max_frames: 162,
            angle_divisor: 200.0,
        }
    }
}

impl Default for RadiusConfig {
    fn default() -> Self {
        Self {
            fit: 0.5,
            height_guard: 1.35,
            min_px: 600.0,
        }
    }
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            lift_px: 20.0,
            scale: 1.05,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "config I/O error: {err}"),
            ConfigError::Parse(err) => write!(f, "config parse error: {err}"),
            ConfigError::Invalid { field, reason } => {
                write!(f, "invalid config value for `{field}`: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Invalid { .. } => None,
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn finite(field: &'static str, v: f64) -> Result<f64, ConfigError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(invalid(field, format!("{v} is not finite")))
    }
}

fn positive(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if finite(field, v)? <= 0.0 {
        return Err(invalid(field, format!("{v} must be > 0")));
    }
    Ok(())
}

fn non_negative(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if finite(field, v)? < 0.0 {
        return Err(invalid(field, format!("{v} must be >= 0")));
    }
    Ok(())
}

impl GalleryConfig {
    pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
        let config: GalleryConfig = serde_json::from_str(payload).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let payload = fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&payload)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segment_count > MAX_SEGMENTS {
            return Err(invalid(
                "segment_count",
                format!("{} exceeds {MAX_SEGMENTS}", self.segment_count),
            ));
        }
        non_negative("max_pitch_deg", self.max_pitch_deg)?;
        if self.max_pitch_deg > 90.0 {
            return Err(invalid("max_pitch_deg", "must be <= 90"));
        }
        positive("drag_sensitivity", self.drag_sensitivity)?;
        non_negative("tap_threshold_px2", self.tap_threshold_px2)?;

        let i = &self.inertia;
        non_negative("inertia.release_threshold", i.release_threshold)?;
        non_negative("inertia.max_release_velocity", i.max_release_velocity)?;
        positive("inertia.velocity_scale", i.velocity_scale)?;
        let friction = finite("inertia.friction", i.friction)?;
        if !(friction > 0.0 && friction < 1.0) {
            return Err(invalid(
                "inertia.friction",
                format!("{friction} must lie in (0, 1)"),
            ));
        }
        non_negative("inertia.stop_threshold", i.stop_threshold)?;
        positive("inertia.angle_divisor", i.angle_divisor)?;

        let r = &self.radius;
        positive("radius.fit", r.fit)?;
        positive("radius.height_guard", r.height_guard)?;
        positive("radius.min_px", r.min_px)?;

        finite("hover.lift_px", self.hover.lift_px)?;
        positive("hover.scale", self.hover.scale)?;
        Ok(())
    }
}
