use std::collections::VecDeque;

use foundation::Time;
use foundation::math::Vec2;

/// Samples kept for the estimate.
const VELOCITY_HISTORY_SIZE: usize = 5;

/// Samples older than this (relative to the newest) are ignored.
const VELOCITY_WINDOW_MS: f64 = 100.0;

#[derive(Debug, Clone, Copy)]
struct PointerSample {
    time: Time,
    position: Vec2,
}

/// Terminal pointer velocity in px/ms, for hosts without a gesture library
/// that reports one.
#[derive(Debug, Clone, Default)]
pub struct VelocityTracker {
    history: VecDeque<PointerSample>,
}

impl VelocityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn push(&mut self, time: Time, position: Vec2) {
        if !position.is_finite() || !time.0.is_finite() {
            return;
        }
        if let Some(last) = self.history.back() {
            if time.millis() < last.time.millis() {
                self.history.clear();
            }
        }
        self.history.push_back(PointerSample { time, position });
        if self.history.len() > VELOCITY_HISTORY_SIZE {
            self.history.pop_front();
        }
    }

    /// Average velocity across the recent window; zero with fewer than two samples.
    pub fn velocity(&self) -> Vec2 {
        let Some(newest) = self.history.back() else {
            return Vec2::ZERO;
        };
        let Some(oldest) = self
            .history
            .iter()
            .find(|s| newest.time.millis() - s.time.millis() <= VELOCITY_WINDOW_MS)
        else {
            return Vec2::ZERO;
        };
        let dt_ms = newest.time.millis() - oldest.time.millis();
        if !(dt_ms > 0.0) {
            return Vec2::ZERO;
        }
        (newest.position - oldest.position).scale(1.0 / dt_ms)
    }
}
