//! Interaction engine: pointer gestures, taps and inertia.

mod engine;
mod gesture;
mod inertia;
mod velocity;

use std::sync::Arc;

use catalog::MediaItem;
use foundation::math::Vec2;
use serde::Serialize;

use crate::layout::SlotId;

pub use engine::GalleryEngine;
pub use gesture::GestureSession;
pub use inertia::{Inertia, InertiaStep, StopReason};
pub use velocity::VelocityTracker;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionState {
    Idle,
    Dragging,
    Inertia,
}

/// What the host found under the pointer at release.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum HitTarget {
    /// The host resolved an element carrying this slot id.
    Slot(SlotId),
    /// Pointer offset from the viewport centre, resolved geometrically.
    Screen(Vec2),
    Nothing,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// No gesture was active.
    Ignored,
    /// Tap; `slot` is the selected slot if the tap hit one.
    Tap { slot: Option<SlotId> },
    /// Drag released too slowly to spin.
    Settled,
    InertiaStarted,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The callback belonged to a cancelled or superseded request.
    Stale,
    Applied,
    Stopped(StopReason),
}

/// Outbound notifications, drained by the host after each call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GalleryEvent {
    Selected { slot: SlotId, item: Arc<MediaItem> },
    SelectionCleared,
    OrientationChanged { pitch_deg: f64, yaw_deg: f64 },
    RadiusChanged { radius_px: f64 },
    InertiaStarted { v_yaw: f64, v_pitch: f64 },
    InertiaStopped { reason: StopReason, frames: u32 },
    LayoutRebuilt { slots: usize },
}
