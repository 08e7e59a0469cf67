use foundation::math::wrap_deg_signed;
use serde::Serialize;

/// Pitch and yaw of the shell, in degrees.
///
/// Anyone can read an orientation; only the interaction engine in this crate
/// can change the one it owns. Yaw is stored raw so a drag never jumps at the
/// ±180° seam; readers that do arithmetic on it use [`Self::normalized_yaw_deg`].
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize)]
pub struct ShellOrientation {
    pitch_deg: f64,
    yaw_deg: f64,
}

impl ShellOrientation {
    pub fn new(pitch_deg: f64, yaw_deg: f64) -> Self {
        Self { pitch_deg, yaw_deg }
    }

    pub fn pitch_deg(&self) -> f64 {
        self.pitch_deg
    }

    /// Raw yaw. Unbounded while a drag is in progress.
    pub fn yaw_deg(&self) -> f64 {
        self.yaw_deg
    }

    /// Yaw wrapped into `(-180, 180]`.
    pub fn normalized_yaw_deg(&self) -> f64 {
        wrap_deg_signed(self.yaw_deg)
    }

    pub fn is_finite(&self) -> bool {
        self.pitch_deg.is_finite() && self.yaw_deg.is_finite()
    }

    /// Returns `true` if the value changed.
    pub(crate) fn set(&mut self, pitch_deg: f64, yaw_deg: f64) -> bool {
        if self.pitch_deg == pitch_deg && self.yaw_deg == yaw_deg {
            return false;
        }
        self.pitch_deg = pitch_deg;
        self.yaw_deg = yaw_deg;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::ShellOrientation;

    #[test]
    fn yaw_normalizes_on_read() {
        let o = ShellOrientation::new(0.0, 540.0);
        assert_eq!(o.yaw_deg(), 540.0);
        assert_eq!(o.normalized_yaw_deg(), 180.0);
        assert_eq!(ShellOrientation::new(0.0, -190.0).normalized_yaw_deg(), 170.0);
    }

    #[test]
    fn set_reports_change() {
        let mut o = ShellOrientation::default();
        assert!(!o.set(0.0, 0.0));
        assert!(o.set(1.0, 2.0));
        assert_eq!((o.pitch_deg(), o.yaw_deg()), (1.0, 2.0));
    }
}
