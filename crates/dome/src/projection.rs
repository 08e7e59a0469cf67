//! Projection of the layout onto the shell.
//!
//! Transforms follow CSS conventions: x right, y down, z toward the viewer.
//! The host nests one shell element inside a stage with perspective `2R`, and
//! every slot element inside the shell:
//!
//! ```text
//! stage  perspective: 2R
//! shell  translateZ(-R) rotateX(pitch) rotateY(yaw)
//! slot   rotateY(a) rotateX(b) translateZ(R)
//! ```
//!
//! Slot transforms depend only on the layout and are computed once. Orientation
//! or radius changes only touch the shell transform.

use foundation::math::precision::canonical_f64;
use foundation::math::{Mat4, Vec2, Vec3, clamp};
use serde::Serialize;

use crate::config::{HoverConfig, RadiusConfig};
use crate::layout::{GridCoordinate, Layout, SlotId};
use crate::orientation::ShellOrientation;

/// Formats a CSS number: at most four decimals, no trailing zeros, never `-0`.
pub fn css_number(v: f64) -> String {
    let v = canonical_f64(if v.is_finite() { v } else { 0.0 });
    let s = format!("{v:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// Sphere radius in px, derived from the observed container size.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ViewportRadius(f64);

impl ViewportRadius {
    /// `round(max(min(fit * min(w, h), height_guard * h), min_px))`.
    ///
    /// Dimensions below 1 px (including zero, negative and NaN) count as 1 px,
    /// so the result is always finite and at least `min_px`.
    pub fn from_size(width: f64, height: f64, cfg: &RadiusConfig) -> Self {
        let w = sanitize_dim(width);
        let h = sanitize_dim(height);
        let fitted = (w.min(h) * cfg.fit).min(h * cfg.height_guard);
        let r = clamp(fitted, cfg.min_px, f64::INFINITY);
        Self(r.round())
    }

    pub fn from_px(px: f64) -> Self {
        Self(px)
    }

    pub fn px(self) -> f64 {
        self.0
    }

    /// Value for the `--radius` custom property.
    pub fn css(self) -> String {
        format!("{}px", css_number(self.0))
    }

    /// Stage perspective distance.
    pub fn perspective_px(self) -> f64 {
        self.0 * 2.0
    }

    /// Edge length of one grid cell: `π·R / S`. Slots span two cells.
    pub fn cell_edge_px(self, segment_count: usize) -> f64 {
        if segment_count == 0 {
            return 0.0;
        }
        self.0 * std::f64::consts::PI / segment_count as f64
    }
}

fn sanitize_dim(v: f64) -> f64 {
    if v.is_finite() { v.max(1.0) } else { 1.0 }
}

/// Static placement of one slot on the shell.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ItemTransform {
    pub yaw_deg: f64,
    pub pitch_deg: f64,
}

impl ItemTransform {
    pub fn for_coord(coord: &GridCoordinate, step_deg: f64) -> Self {
        Self {
            yaw_deg: step_deg * coord.yaw_units(),
            pitch_deg: step_deg * coord.pitch_units(),
        }
    }

    /// Uses `var(--radius)` so a resize never touches slot elements.
    pub fn css(&self) -> String {
        format!(
            "rotateY({}deg) rotateX({}deg) translateZ(var(--radius))",
            css_number(self.yaw_deg),
            css_number(self.pitch_deg)
        )
    }

    pub fn matrix(&self, radius: ViewportRadius) -> Mat4 {
        Mat4::rotation_y_deg(self.yaw_deg)
            .mul(&Mat4::rotation_x_deg(self.pitch_deg))
            .mul(&Mat4::translation(Vec3::new(0.0, 0.0, radius.px())))
    }

    /// Outward unit normal in shell space.
    pub fn direction(&self) -> Vec3 {
        Mat4::rotation_y_deg(self.yaw_deg)
            .mul(&Mat4::rotation_x_deg(self.pitch_deg))
            .transform_vector(Vec3::Z)
    }
}

/// The animated transform applied to the shell element.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ShellTransform {
    pub pitch_deg: f64,
    /// Normalized into `(-180, 180]`.
    pub yaw_deg: f64,
    pub radius: ViewportRadius,
}

impl ShellTransform {
    pub fn new(orientation: &ShellOrientation, radius: ViewportRadius) -> Self {
        Self {
            pitch_deg: orientation.pitch_deg(),
            yaw_deg: orientation.normalized_yaw_deg(),
            radius,
        }
    }

    pub fn css(&self) -> String {
        format!(
            "translateZ(calc(var(--radius) * -1)) rotateX({}deg) rotateY({}deg)",
            css_number(self.pitch_deg),
            css_number(self.yaw_deg)
        )
    }

    /// Rotation part only.
    pub fn rotation(&self) -> Mat4 {
        Mat4::rotation_x_deg(self.pitch_deg).mul(&Mat4::rotation_y_deg(self.yaw_deg))
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::translation(Vec3::new(0.0, 0.0, -self.radius.px())).mul(&self.rotation())
    }
}

/// Rendering surface a host applies transforms to.
///
/// Receives read-only values; the orientation itself stays with the engine.
pub trait ShellSurface {
    fn apply_radius(&mut self, radius: ViewportRadius);
    fn apply_shell(&mut self, transform: &ShellTransform);
}

/// Per-slot transforms for one layout plus the hover affordance.
#[derive(Debug, Clone)]
pub struct Projection {
    step_deg: f64,
    items: Vec<ItemTransform>,
    hover: HoverConfig,
}

impl Projection {
    pub fn new(layout: &Layout, hover: HoverConfig) -> Self {
        let step_deg = layout.angular_step_deg();
        let items = layout
            .items()
            .iter()
            .map(|p| ItemTransform::for_coord(&p.coord, step_deg))
            .collect();
        Self {
            step_deg,
            items,
            hover,
        }
    }

    pub fn step_deg(&self) -> f64 {
        self.step_deg
    }

    pub fn items(&self) -> &[ItemTransform] {
        &self.items
    }

    pub fn item(&self, slot: SlotId) -> Option<&ItemTransform> {
        self.items.get(slot.index())
    }

    /// Transform layered on the hovered slot's image. Never touches model state.
    pub fn hover_css(&self) -> String {
        format!(
            "translateZ({}px) scale({})",
            css_number(self.hover.lift_px),
            css_number(self.hover.scale)
        )
    }

    /// Outward normal of `slot` after the shell rotation.
    pub fn world_direction(&self, slot: SlotId, orientation: &ShellOrientation) -> Option<Vec3> {
        let item = self.item(slot)?;
        let shell = ShellTransform::new(orientation, ViewportRadius(1.0));
        Some(shell.rotation().transform_vector(item.direction()))
    }

    /// Screen position of a slot's centre, relative to the viewport centre.
    ///
    /// `None` for slots facing away from the viewer (their backface is hidden).
    pub fn project_slot(
        &self,
        slot: SlotId,
        orientation: &ShellOrientation,
        radius: ViewportRadius,
    ) -> Option<Vec2> {
        let w = self.world_direction(slot, orientation)?;
        project_direction(w, radius)
    }
}

/// Perspective projection of a front-facing shell point with outward normal `w`.
///
/// The point sits at `R·w - (0, 0, R)`; the eye is at `(0, 0, 2R)`. A slot
/// faces the eye exactly when `w.z > 1/3`.
pub fn project_direction(w: Vec3, radius: ViewportRadius) -> Option<Vec2> {
    if !(w.z > 1.0 / 3.0) {
        return None;
    }
    let k = radius.px() * 2.0 / (3.0 - w.z);
    Some(Vec2::new(w.x * k, w.y * k))
}

/// Inverse of [`project_direction`]: the outward normal of the front shell
/// surface under a screen offset, or `None` if the offset misses the shell.
pub fn unproject_offset(offset: Vec2, radius: ViewportRadius) -> Option<Vec3> {
    let r = radius.px();
    if !(r > 0.0) || !offset.is_finite() {
        return None;
    }
    let eye = Vec3::new(0.0, 0.0, 2.0 * r);
    let center = Vec3::new(0.0, 0.0, -r);
    let u = Vec3::new(offset.x, offset.y, -2.0 * r).normalized()?;
    let l = eye - center;
    let b = u.dot(l);
    let disc = b * b - (l.dot(l) - r * r);
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    let hit = Vec3::new(eye.x + u.x * t, eye.y + u.y * t, eye.z + u.z * t);
    (hit - center).normalized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GalleryConfig;
    use catalog::Catalog;
    use pretty_assertions::assert_eq;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn radius_follows_the_container() {
        let cfg = RadiusConfig::default();
        assert_eq!(ViewportRadius::from_size(1920.0, 1080.0, &cfg).px(), 600.0);
        assert_eq!(ViewportRadius::from_size(3000.0, 2001.0, &cfg).px(), 1001.0);
        // The height guard wins for very short, wide containers.
        let wide = RadiusConfig {
            min_px: 1.0,
            ..RadiusConfig::default()
        };
        assert_eq!(ViewportRadius::from_size(4000.0, 100.0, &wide).px(), 50.0);
    }

    #[test]
    fn radius_never_degenerates() {
        let cfg = RadiusConfig::default();
        for (w, h) in [(0.0, 0.0), (-10.0, 5.0), (f64::NAN, 100.0), (f64::INFINITY, 1.0)] {
            let r = ViewportRadius::from_size(w, h, &cfg).px();
            assert!(r.is_finite() && r >= 600.0, "{w}x{h} -> {r}");
        }
    }

    #[test]
    fn radius_derived_values() {
        let r = ViewportRadius::from_px(700.0);
        assert_eq!(r.css(), "700px");
        assert_eq!(r.perspective_px(), 1400.0);
        assert!(close(r.cell_edge_px(35), 700.0 * std::f64::consts::PI / 35.0));
        assert_eq!(r.cell_edge_px(0), 0.0);
    }

    #[test]
    fn css_numbers_are_compact() {
        assert_eq!(css_number(5.0), "5");
        assert_eq!(css_number(-0.0), "0");
        assert_eq!(css_number(2.5714285), "2.5714");
        assert_eq!(css_number(-0.00001), "0");
        assert_eq!(css_number(f64::NAN), "0");
    }

    #[test]
    fn item_css_uses_centred_footprint() {
        let step = 360.0 / 4.0 / 2.0;
        let t = ItemTransform::for_coord(&GridCoordinate::new(-3, -4), step);
        assert_eq!(t.css(), "rotateY(-112.5deg) rotateX(-202.5deg) translateZ(var(--radius))");
    }

    #[test]
    fn shell_css_normalizes_yaw() {
        let t = ShellTransform::new(&ShellOrientation::new(-2.5, 365.0), ViewportRadius::from_px(600.0));
        assert_eq!(
            t.css(),
            "translateZ(calc(var(--radius) * -1)) rotateX(-2.5deg) rotateY(5deg)"
        );
    }

    #[test]
    fn item_matrix_places_centre_on_the_sphere() {
        let r = ViewportRadius::from_px(600.0);
        let t = ItemTransform {
            yaw_deg: 37.0,
            pitch_deg: -12.0,
        };
        let p = t.matrix(r).transform_point(Vec3::new(0.0, 0.0, 0.0));
        assert!(close(p.length(), 600.0));
        let d = t.direction();
        assert!(close(p.x, d.x * 600.0) && close(p.y, d.y * 600.0) && close(p.z, d.z * 600.0));
    }

    #[test]
    fn projection_round_trips_through_the_shell() {
        let r = ViewportRadius::from_px(800.0);
        let w = Vec3::new(0.2, -0.1, 0.9).normalized().expect("unit");
        let s = project_direction(w, r).expect("front facing");
        let back = unproject_offset(s, r).expect("on shell");
        assert!(close(back.x, w.x) && close(back.y, w.y) && close(back.z, w.z));
    }

    #[test]
    fn centre_of_screen_is_the_front_of_the_shell() {
        let back = unproject_offset(Vec2::ZERO, ViewportRadius::from_px(600.0)).expect("hit");
        assert!(close(back.z, 1.0));
        assert!(unproject_offset(Vec2::new(1.0e6, 0.0), ViewportRadius::from_px(600.0)).is_none());
    }

    #[test]
    fn slot_transforms_are_static_and_hover_is_presentation_only() {
        let cfg = GalleryConfig::default();
        let layout = Layout::build(&Catalog::builtin(), cfg.segment_count);
        let projection = Projection::new(&layout, cfg.hover.clone());
        assert_eq!(projection.items().len(), 175);
        assert_eq!(projection.hover_css(), "translateZ(20px) scale(1.05)");

        let before = projection.item(SlotId(3)).copied();
        let turned = ShellOrientation::new(4.0, 120.0);
        let _ = projection.project_slot(SlotId(3), &turned, ViewportRadius::from_px(600.0));
        assert_eq!(projection.item(SlotId(3)).copied(), before);
    }

    #[test]
    fn back_facing_slots_do_not_project() {
        let cfg = GalleryConfig::default();
        let layout = Layout::build(&Catalog::builtin(), cfg.segment_count);
        let projection = Projection::new(&layout, cfg.hover.clone());
        let r = ViewportRadius::from_px(600.0);
        let front = ShellOrientation::default();
        let flipped = ShellOrientation::new(0.0, 180.0);
        // Column 0 faces the viewer at rest and away after a half turn.
        let slot = SlotId(17 * 5 + 2);
        assert!(projection.project_slot(slot, &front, r).is_some());
        assert!(projection.project_slot(slot, &flipped, r).is_none());
    }
}
