use foundation::time::Time;

/// Nominal display refresh interval.
pub const DEFAULT_FRAME_DT_S: f64 = 1.0 / 60.0;

/// Deterministic frame metadata.
///
/// Frames are counted, not timed: the host decides when a frame happens and the
/// engine only ever sees the index. `time` is derived from the index so a
/// recorded session replays identically.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Fixed delta time (seconds).
    pub dt_s: f64,
    /// Engine time at the start of the frame (seconds).
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time: Time(index as f64 * dt_s),
        }
    }

    pub fn first() -> Self {
        Self::new(0, DEFAULT_FRAME_DT_S)
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1, self.dt_s)
    }
}
