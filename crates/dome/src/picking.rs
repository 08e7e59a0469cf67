use foundation::math::precision::stable_total_cmp_f64;
use foundation::math::{Mat4, Vec2, Vec3};
use serde::Serialize;

use crate::layout::{Layout, SLOT_SPAN, SlotId};
use crate::orientation::ShellOrientation;
use crate::projection::{Projection, ViewportRadius, unproject_offset};

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct PickHit {
    pub slot: SlotId,
    /// Angle between the tapped shell point and the slot centre.
    pub angle_deg: f64,
}

/// Tap resolution against the layout.
///
/// Two ways in:
/// - [`HitIndex::resolve`] takes a slot id reported by the host (the element
///   under the pointer) and checks it against the layout.
/// - [`HitIndex::pick`] maps a screen offset through the shell geometry to the
///   nearest slot by angular distance.
///
/// Only slots that carry media are selectable.
#[derive(Debug, Clone)]
pub struct HitIndex {
    directions: Vec<Vec3>,
    selectable: Vec<bool>,
    max_angle_deg: f64,
}

impl HitIndex {
    pub fn new(layout: &Layout, projection: &Projection) -> Self {
        let directions = projection.items().iter().map(|t| t.direction()).collect();
        let selectable = layout.items().iter().map(|p| p.has_media()).collect();
        Self {
            directions,
            selectable,
            max_angle_deg: projection.step_deg() * SLOT_SPAN as f64,
        }
    }

    pub fn len(&self) -> usize {
        self.directions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }

    pub fn is_selectable(&self, slot: SlotId) -> bool {
        self.selectable.get(slot.index()).copied().unwrap_or(false)
    }

    pub fn resolve(&self, slot: SlotId) -> Option<SlotId> {
        self.is_selectable(slot).then_some(slot)
    }

    /// Nearest selectable slot under a screen offset (px from the viewport centre).
    ///
    /// Ordering contract:
    /// - The slot whose centre is angularly closest to the tapped shell point wins.
    /// - On equal angles the lower slot index wins.
    ///
    /// Misses when the offset is off the shell or farther than one slot
    /// footprint from every selectable centre.
    pub fn pick(
        &self,
        offset: Vec2,
        orientation: &ShellOrientation,
        radius: ViewportRadius,
    ) -> Option<PickHit> {
        let world = unproject_offset(offset, radius)?;
        let inverse = Mat4::rotation_y_deg(-orientation.normalized_yaw_deg())
            .mul(&Mat4::rotation_x_deg(-orientation.pitch_deg()));
        let local = inverse.transform_vector(world);

        let mut best: Option<(f64, usize)> = None;
        for (i, dir) in self.directions.iter().enumerate() {
            if !self.selectable[i] {
                continue;
            }
            let dot = dir.dot(local);
            best = match best {
                None => Some((dot, i)),
                Some((bd, bi)) => {
                    // Larger dot product means a smaller angle.
                    let ord = stable_total_cmp_f64(bd, dot).then_with(|| i.cmp(&bi));
                    if ord.is_lt() {
                        Some((dot, i))
                    } else {
                        Some((bd, bi))
                    }
                }
            };
        }

        let (dot, index) = best?;
        let angle_deg = dot.clamp(-1.0, 1.0).acos().to_degrees();
        if angle_deg > self.max_angle_deg {
            return None;
        }
        Some(PickHit {
            slot: SlotId(index as u32),
            angle_deg,
        })
    }
}
