//! Angle helpers. All angles here are in degrees.

/// Clamp that also maps NaN to `lo`.
#[inline]
pub fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    if v.is_nan() {
        return lo;
    }
    v.max(lo).min(hi)
}

/// Wraps an angle into `(-180, 180]`.
///
/// Non-finite input maps to `0.0`.
pub fn wrap_deg_signed(deg: f64) -> f64 {
    if !deg.is_finite() {
        return 0.0;
    }
    let a = (deg + 180.0).rem_euclid(360.0) - 180.0;
    if a <= -180.0 { a + 360.0 } else { a }
}
