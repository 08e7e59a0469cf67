use foundation::math::{Vec2, clamp};

use crate::config::GalleryConfig;
use crate::orientation::ShellOrientation;

/// State of one pointer interaction, from pointer-down to pointer-up.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureSession {
    start: Vec2,
    last: Vec2,
    start_orientation: ShellOrientation,
    moved: bool,
}

impl GestureSession {
    pub fn new(start: Vec2, orientation: ShellOrientation) -> Self {
        Self {
            start,
            last: start,
            start_orientation: orientation,
            moved: false,
        }
    }

    pub fn start(&self) -> Vec2 {
        self.start
    }

    pub fn last(&self) -> Vec2 {
        self.last
    }

    pub fn start_orientation(&self) -> &ShellOrientation {
        &self.start_orientation
    }

    /// Once set, stays set for the rest of the gesture.
    pub fn moved(&self) -> bool {
        self.moved
    }

    /// Records a pointer position and returns the total displacement since
    /// the gesture started.
    pub fn observe(&mut self, position: Vec2, tap_threshold_px2: f64) -> Vec2 {
        self.last = position;
        let d = position - self.start;
        if d.length_squared() > tap_threshold_px2 {
            self.moved = true;
        }
        d
    }

    /// Orientation for a total displacement `d`: `(pitch, yaw)` in degrees.
    ///
    /// Pitch is clamped; yaw is left unbounded.
    pub fn drag_target(&self, d: Vec2, config: &GalleryConfig) -> (f64, f64) {
        let s = config.drag_sensitivity;
        let max = config.max_pitch_deg;
        let pitch = clamp(self.start_orientation.pitch_deg() - d.y / s, -max, max);
        let yaw = self.start_orientation.yaw_deg() + d.x / s;
        (pitch, yaw)
    }
}

#[cfg(test)]
mod tests {
    use super::GestureSession;
    use crate::config::GalleryConfig;
    use crate::orientation::ShellOrientation;
    use foundation::math::Vec2;

    #[test]
    fn jitter_within_threshold_is_not_a_drag() {
        let mut g = GestureSession::new(Vec2::new(10.0, 10.0), ShellOrientation::default());
        g.observe(Vec2::new(12.0, 13.0), 16.0);
        assert!(!g.moved());
        g.observe(Vec2::new(14.0, 10.0), 16.0);
        assert!(!g.moved(), "exactly 16 px² is still a tap");
        g.observe(Vec2::new(15.0, 10.0), 16.0);
        assert!(g.moved());
        g.observe(Vec2::new(10.0, 10.0), 16.0);
        assert!(g.moved(), "returning to the start keeps the drag");
    }

    #[test]
    fn drag_maps_pixels_to_degrees() {
        let cfg = GalleryConfig::default();
        let g = GestureSession::new(Vec2::ZERO, ShellOrientation::new(1.0, 170.0));
        assert_eq!(g.drag_target(Vec2::new(100.0, 0.0), &cfg), (1.0, 175.0));
        assert_eq!(g.drag_target(Vec2::new(400.0, 0.0), &cfg), (1.0, 190.0));
        assert_eq!(g.drag_target(Vec2::new(0.0, -1000.0), &cfg), (5.0, 170.0));
        assert_eq!(g.drag_target(Vec2::new(0.0, 40.0), &cfg), (-1.0, 170.0));
    }
}
