use foundation::math::{Vec2, clamp, wrap_deg_signed};
use runtime::FrameBudget;
use serde::Serialize;

use crate::config::InertiaConfig;
use crate::orientation::ShellOrientation;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Both velocities fell below the stop threshold.
    Settled,
    /// The per-spin frame ceiling was reached.
    FrameCeiling,
    /// A new pointer-down took over.
    Cancelled,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InertiaStep {
    Applied { pitch_deg: f64, yaw_deg: f64 },
    Stopped(StopReason),
}

/// Decaying free spin after a flick.
///
/// Velocities are in engine units; one degree is `angle_divisor` units.
#[derive(Debug, Clone, PartialEq)]
pub struct Inertia {
    v_yaw: f64,
    v_pitch: f64,
    budget: FrameBudget,
    frames: u32,
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

impl Inertia {
    /// Whether a release velocity (px/ms) is fast enough to start a spin.
    pub fn exceeds_threshold(velocity: Vec2, cfg: &InertiaConfig) -> bool {
        finite_or_zero(velocity.x).abs() > cfg.release_threshold
            || finite_or_zero(velocity.y).abs() > cfg.release_threshold
    }

    pub fn from_release(velocity: Vec2, cfg: &InertiaConfig) -> Self {
        let max = cfg.max_release_velocity;
        let scale = |v: f64| clamp(finite_or_zero(v), -max, max) * cfg.velocity_scale;
        Self {
            v_yaw: scale(velocity.x),
            v_pitch: scale(velocity.y),
            budget: FrameBudget::new(cfg.max_frames),
            frames: 0,
        }
    }

    pub fn v_yaw(&self) -> f64 {
        self.v_yaw
    }

    pub fn v_pitch(&self) -> f64 {
        self.v_pitch
    }

    pub fn frames_applied(&self) -> u32 {
        self.frames
    }

    /// Advances one frame from `current`.
    ///
    /// Friction is applied before the stop checks, so the first applied frame
    /// already runs at the decayed velocity.
    pub fn step(
        &mut self,
        current: &ShellOrientation,
        max_pitch_deg: f64,
        cfg: &InertiaConfig,
    ) -> InertiaStep {
        self.v_yaw *= cfg.friction;
        self.v_pitch *= cfg.friction;

        if self.v_yaw.abs() < cfg.stop_threshold && self.v_pitch.abs() < cfg.stop_threshold {
            return InertiaStep::Stopped(StopReason::Settled);
        }
        if !self.budget.try_consume(1) {
            return InertiaStep::Stopped(StopReason::FrameCeiling);
        }
        self.frames += 1;

        let pitch_deg = clamp(
            current.pitch_deg() - self.v_pitch / cfg.angle_divisor,
            -max_pitch_deg,
            max_pitch_deg,
        );
        let yaw_deg = wrap_deg_signed(current.yaw_deg() + self.v_yaw / cfg.angle_divisor);
        InertiaStep::Applied { pitch_deg, yaw_deg }
    }
}
