use std::sync::Arc;

use catalog::{Catalog, MediaItem};
use foundation::math::Vec2;
use runtime::{Event, EventBus, FrameScheduler, FrameTicket, Metrics, TaskSlot};
use tracing::{debug, trace};

use super::{
    FrameOutcome, GalleryEvent, GestureSession, HitTarget, Inertia, InertiaStep,
    InteractionState, ReleaseOutcome, StopReason,
};
use crate::config::{ConfigError, GalleryConfig};
use crate::layout::{Layout, PlacedItem, SlotId};
use crate::orientation::ShellOrientation;
use crate::picking::HitIndex;
use crate::projection::{Projection, ShellSurface, ShellTransform, ViewportRadius};

/// Owns the shell orientation and everything that may change it.
///
/// All calls are expected on one thread, in the order the host delivers
/// pointer events and frame callbacks. Frame requests go through the
/// `FrameScheduler` passed to each call; the engine keeps at most one live
/// ticket and ignores callbacks for any other.
#[derive(Debug)]
pub struct GalleryEngine {
    config: GalleryConfig,
    catalog: Catalog,
    layout: Layout,
    projection: Projection,
    hits: HitIndex,
    orientation: ShellOrientation,
    radius: ViewportRadius,
    gesture: Option<GestureSession>,
    inertia: Option<Inertia>,
    frame_task: TaskSlot,
    hovered: Option<SlotId>,
    selected: Option<SlotId>,
    sequence: u64,
    events: EventBus<GalleryEvent>,
    metrics: Metrics,
}

impl GalleryEngine {
    pub fn new(catalog: Catalog, config: GalleryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let layout = Layout::build(&catalog, config.segment_count);
        let projection = Projection::new(&layout, config.hover.clone());
        let hits = HitIndex::new(&layout, &projection);
        let radius = ViewportRadius::from_size(0.0, 0.0, &config.radius);
        debug!(
            "dome gallery: {} slots, {} catalog items",
            layout.len(),
            catalog.len()
        );
        let mut metrics = Metrics::new();
        metrics.set_gauge("viewport.radius_px", radius.px() as i64);
        Ok(Self {
            config,
            catalog,
            layout,
            projection,
            hits,
            orientation: ShellOrientation::default(),
            radius,
            gesture: None,
            inertia: None,
            frame_task: TaskSlot::new(),
            hovered: None,
            selected: None,
            sequence: 0,
            events: EventBus::new(),
            metrics,
        })
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn hits(&self) -> &HitIndex {
        &self.hits
    }

    pub fn orientation(&self) -> &ShellOrientation {
        &self.orientation
    }

    pub fn radius(&self) -> ViewportRadius {
        self.radius
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn state(&self) -> InteractionState {
        if self.gesture.is_some() {
            InteractionState::Dragging
        } else if self.inertia.is_some() {
            InteractionState::Inertia
        } else {
            InteractionState::Idle
        }
    }

    pub fn gesture(&self) -> Option<&GestureSession> {
        self.gesture.as_ref()
    }

    pub fn inertia(&self) -> Option<&Inertia> {
        self.inertia.as_ref()
    }

    /// The ticket the next inertia frame must carry, if one is pending.
    pub fn pending_frame(&self) -> Option<FrameTicket> {
        self.frame_task.live()
    }

    pub fn hovered(&self) -> Option<SlotId> {
        self.hovered
    }

    pub fn selected(&self) -> Option<&PlacedItem> {
        self.selected.and_then(|slot| self.layout.get(slot))
    }

    pub fn drain_events(&mut self) -> Vec<Event<GalleryEvent>> {
        self.events.drain()
    }

    pub fn shell_transform(&self) -> ShellTransform {
        ShellTransform::new(&self.orientation, self.radius)
    }

    /// Static transform of a slot element.
    pub fn item_transform_css(&self, slot: SlotId) -> Option<String> {
        self.projection.item(slot).map(|t| t.css())
    }

    /// Hover transform for a slot's image, if it is the hovered one.
    pub fn hover_css(&self, slot: SlotId) -> Option<String> {
        (self.hovered == Some(slot)).then(|| self.projection.hover_css())
    }

    pub fn present(&self, surface: &mut dyn ShellSurface) {
        surface.apply_radius(self.radius);
        surface.apply_shell(&self.shell_transform());
    }

    /// Starts a gesture. Any running spin stops before this returns.
    pub fn pointer_down(&mut self, position: Vec2, sched: &mut dyn FrameScheduler) {
        self.sequence += 1;
        self.stop_inertia(sched, StopReason::Cancelled);
        if !position.is_finite() {
            return;
        }
        // Raw yaw only needs to survive one drag; each gesture starts wrapped.
        let start = ShellOrientation::new(
            self.orientation.pitch_deg(),
            self.orientation.normalized_yaw_deg(),
        );
        self.gesture = Some(GestureSession::new(position, start));
        self.metrics.inc("gesture.started");
        trace!("gesture started at ({}, {})", position.x, position.y);
    }

    /// Returns `true` if the orientation changed.
    pub fn pointer_move(&mut self, position: Vec2) -> bool {
        self.sequence += 1;
        let Some(mut session) = self.gesture.take() else {
            return false;
        };
        let changed = self.apply_drag(&mut session, position);
        self.gesture = Some(session);
        changed
    }

    /// Ends the gesture.
    ///
    /// `velocity` is the terminal pointer velocity in px/ms; `target` is what
    /// the host found under the pointer.
    pub fn pointer_up(
        &mut self,
        position: Vec2,
        velocity: Vec2,
        target: HitTarget,
        sched: &mut dyn FrameScheduler,
    ) -> ReleaseOutcome {
        self.sequence += 1;
        let Some(mut session) = self.gesture.take() else {
            return ReleaseOutcome::Ignored;
        };
        self.apply_drag(&mut session, position);

        if !session.moved() {
            self.metrics.inc("gesture.taps");
            let slot = self.resolve_target(target);
            if let Some(slot) = slot {
                self.select(slot);
            }
            return ReleaseOutcome::Tap { slot };
        }

        self.metrics.inc("gesture.drags");
        if !Inertia::exceeds_threshold(velocity, &self.config.inertia) {
            return ReleaseOutcome::Settled;
        }

        let inertia = Inertia::from_release(velocity, &self.config.inertia);
        let (v_yaw, v_pitch) = (inertia.v_yaw(), inertia.v_pitch());
        self.inertia = Some(inertia);
        self.frame_task.schedule(sched);
        self.metrics.inc("inertia.started");
        self.emit(GalleryEvent::InertiaStarted { v_yaw, v_pitch });
        debug!("inertia started: v_yaw={v_yaw} v_pitch={v_pitch}");
        ReleaseOutcome::InertiaStarted
    }

    /// Abandons the gesture without a tap or a spin (pointer capture lost).
    pub fn pointer_cancel(&mut self) -> bool {
        self.sequence += 1;
        self.gesture.take().is_some()
    }

    /// Returns `true` if the hovered slot changed.
    pub fn pointer_hover(&mut self, slot: Option<SlotId>) -> bool {
        let slot = slot.filter(|s| self.layout.get(*s).is_some());
        if self.hovered == slot {
            return false;
        }
        self.hovered = slot;
        true
    }

    /// Handles the frame callback for `ticket`.
    pub fn animation_frame(
        &mut self,
        ticket: FrameTicket,
        sched: &mut dyn FrameScheduler,
    ) -> FrameOutcome {
        if !self.frame_task.fire(ticket) {
            self.metrics.inc("inertia.stale_frames");
            trace!("dropping stale frame {}", ticket.index());
            return FrameOutcome::Stale;
        }
        self.sequence += 1;
        let Some(inertia) = self.inertia.as_mut() else {
            self.metrics.inc("inertia.stale_frames");
            return FrameOutcome::Stale;
        };

        match inertia.step(
            &self.orientation,
            self.config.max_pitch_deg,
            &self.config.inertia,
        ) {
            InertiaStep::Applied { pitch_deg, yaw_deg } => {
                self.metrics.inc("inertia.frames");
                self.set_orientation(pitch_deg, yaw_deg);
                self.frame_task.schedule(sched);
                FrameOutcome::Applied
            }
            InertiaStep::Stopped(reason) => {
                self.finish_inertia(reason);
                FrameOutcome::Stopped(reason)
            }
        }
    }

    /// Re-derives the radius. Orientation is untouched.
    pub fn resize(&mut self, width: f64, height: f64) -> bool {
        self.sequence += 1;
        let radius = ViewportRadius::from_size(width, height, &self.config.radius);
        self.metrics.inc("viewport.resizes");
        if radius == self.radius {
            return false;
        }
        self.radius = radius;
        self.metrics.set_gauge("viewport.radius_px", radius.px() as i64);
        self.emit(GalleryEvent::RadiusChanged {
            radius_px: radius.px(),
        });
        debug!("radius {}px for {width}x{height}", radius.px());
        true
    }

    /// Swaps the catalog. The layout is rebuilt only if the content differs.
    pub fn set_catalog(&mut self, catalog: Catalog) -> bool {
        self.sequence += 1;
        if self.layout.is_current_for(&catalog, self.config.segment_count) {
            return false;
        }
        self.catalog = catalog;
        self.rebuild();
        true
    }

    /// Changes the segment count and rebuilds if it differs.
    pub fn set_segment_count(&mut self, segment_count: usize) -> Result<bool, ConfigError> {
        let mut config = self.config.clone();
        config.segment_count = segment_count;
        config.validate()?;
        self.sequence += 1;
        if self.layout.is_current_for(&self.catalog, segment_count) {
            return Ok(false);
        }
        self.config = config;
        self.rebuild();
        Ok(true)
    }

    /// Returns `true` if there was a selection.
    pub fn clear_selection(&mut self) -> bool {
        self.sequence += 1;
        if self.selected.take().is_none() {
            return false;
        }
        self.emit(GalleryEvent::SelectionCleared);
        true
    }

    fn apply_drag(&mut self, session: &mut GestureSession, position: Vec2) -> bool {
        if !position.is_finite() {
            return false;
        }
        let d = session.observe(position, self.config.tap_threshold_px2);
        let (pitch_deg, yaw_deg) = session.drag_target(d, &self.config);
        self.set_orientation(pitch_deg, yaw_deg)
    }

    fn set_orientation(&mut self, pitch_deg: f64, yaw_deg: f64) -> bool {
        if !self.orientation.set(pitch_deg, yaw_deg) {
            return false;
        }
        self.emit(GalleryEvent::OrientationChanged {
            pitch_deg,
            yaw_deg: self.orientation.normalized_yaw_deg(),
        });
        true
    }

    fn resolve_target(&self, target: HitTarget) -> Option<SlotId> {
        match target {
            HitTarget::Slot(slot) => self.hits.resolve(slot),
            HitTarget::Screen(offset) => self
                .hits
                .pick(offset, &self.orientation, self.radius)
                .map(|hit| hit.slot),
            HitTarget::Nothing => None,
        }
    }

    fn select(&mut self, slot: SlotId) {
        let Some(placed) = self.layout.get(slot) else {
            return;
        };
        let item: Arc<MediaItem> = Arc::clone(&placed.media);
        self.selected = Some(slot);
        self.metrics.inc("selection.emitted");
        debug!("selected slot {} ({})", slot.0, item.label);
        self.emit(GalleryEvent::Selected { slot, item });
    }

    fn stop_inertia(&mut self, sched: &mut dyn FrameScheduler, reason: StopReason) {
        self.frame_task.cancel(sched);
        if self.inertia.is_some() {
            self.metrics.inc("inertia.cancelled");
            self.finish_inertia(reason);
        }
    }

    fn finish_inertia(&mut self, reason: StopReason) {
        let Some(inertia) = self.inertia.take() else {
            return;
        };
        let frames = inertia.frames_applied();
        self.metrics
            .record_histogram("inertia.frames_per_spin", i64::from(frames));
        self.emit(GalleryEvent::InertiaStopped { reason, frames });
        debug!("inertia stopped after {frames} frames: {reason:?}");
    }

    fn rebuild(&mut self) {
        self.layout = Layout::build(&self.catalog, self.config.segment_count);
        self.projection = Projection::new(&self.layout, self.config.hover.clone());
        self.hits = HitIndex::new(&self.layout, &self.projection);
        self.hovered = self.hovered.filter(|s| self.layout.get(*s).is_some());
        if self
            .selected
            .is_some_and(|s| !self.hits.is_selectable(s))
        {
            self.selected = None;
            self.emit(GalleryEvent::SelectionCleared);
        }
        self.emit(GalleryEvent::LayoutRebuilt {
            slots: self.layout.len(),
        });
        debug!("layout rebuilt: {} slots", self.layout.len());
    }

    fn emit(&mut self, event: GalleryEvent) {
        self.events.emit(self.sequence, event);
    }
}
