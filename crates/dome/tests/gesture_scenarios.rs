//! End-to-end gesture scenarios driven through a deterministic frame scheduler.

use catalog::{Catalog, MediaItem};
use dome::{
    FrameOutcome, GalleryConfig, GalleryEngine, GalleryEvent, HitTarget, InteractionState,
    ReleaseOutcome, ROWS_PER_COLUMN, SlotId, StopReason, build_layout,
};
use foundation::Handle;
use foundation::math::Vec2;
use pretty_assertions::assert_eq;
use runtime::{FrameScheduler, FrameTicket, ManualScheduler};

fn items(n: usize) -> Vec<MediaItem> {
    (0..n)
        .map(|i| MediaItem::new(format!("assets/{i}.jpg"), format!("item {i}"), format!("detail {i}")))
        .collect()
}

fn engine() -> GalleryEngine {
    GalleryEngine::new(Catalog::builtin(), GalleryConfig::default()).expect("engine")
}

/// Runs frames until nothing is pending. Returns the outcomes in order.
fn run_frames(engine: &mut GalleryEngine, sched: &mut ManualScheduler) -> Vec<FrameOutcome> {
    let mut outcomes = Vec::new();
    while sched.has_pending() {
        let (_, due) = sched.advance();
        for ticket in due {
            outcomes.push(engine.animation_frame(ticket, sched));
        }
        assert!(outcomes.len() < 10_000, "frame loop did not terminate");
    }
    outcomes
}

/// A host that ignores cancellation and keeps every callback it was asked for.
#[derive(Default)]
struct LeakyScheduler {
    next: u32,
    pending: Vec<FrameTicket>,
}

impl FrameScheduler for LeakyScheduler {
    fn request_frame(&mut self) -> FrameTicket {
        let ticket = FrameTicket(Handle::new(self.next, 0));
        self.next += 1;
        self.pending.push(ticket);
        ticket
    }

    fn cancel_frame(&mut self, _ticket: FrameTicket) {}
}

#[test]
fn layout_is_deterministic() {
    let catalog = items(14);
    assert_eq!(build_layout(&catalog, 35), build_layout(&catalog, 35));
}

#[test]
fn every_coordinate_gets_one_item() {
    for s in [1usize, 2, 7, 35, 64] {
        let placed = build_layout(&items(3), s);
        assert_eq!(placed.len(), s * ROWS_PER_COLUMN);
        assert!(placed.iter().all(|p| p.has_media()));
        for (i, p) in placed.iter().enumerate() {
            assert_eq!(p.slot, SlotId(i as u32));
        }
    }
}

#[test]
fn wraparound_assigns_catalog_modulo() {
    let s = 6;
    let slots = s * ROWS_PER_COLUMN;
    for k in [1, slots, slots + 7] {
        let catalog = items(k);
        let placed = build_layout(&catalog, s);
        for (i, p) in placed.iter().enumerate() {
            assert_eq!(*p.media, catalog[i % k], "k={k} i={i}");
            assert_eq!(p.catalog_index, Some(i % k));
        }
    }
}

#[test]
fn example_scenario() {
    let mut e = engine();
    assert_eq!(e.layout().len(), 175);
    let mut sched = ManualScheduler::new();

    e.pointer_down(Vec2::new(200.0, 300.0), &mut sched);
    assert!(e.pointer_move(Vec2::new(300.0, 300.0)));
    assert_eq!(e.orientation().yaw_deg(), 5.0);
    assert_eq!(e.orientation().pitch_deg(), 0.0);

    let out = e.pointer_up(
        Vec2::new(300.0, 300.0),
        Vec2::new(0.02, 0.0),
        HitTarget::Nothing,
        &mut sched,
    );
    assert_eq!(out, ReleaseOutcome::InertiaStarted);
    let inertia = e.inertia().expect("spinning");
    assert!((inertia.v_yaw() - 1.6).abs() < 1e-12);
    assert_eq!(inertia.v_pitch(), 0.0);

    let outcomes = run_frames(&mut e, &mut sched);
    let applied = outcomes.iter().filter(|o| **o == FrameOutcome::Applied).count();
    assert!((100..140).contains(&applied), "applied {applied} frames");
    assert_eq!(outcomes.last(), Some(&FrameOutcome::Stopped(StopReason::Settled)));
    assert_eq!(e.state(), InteractionState::Idle);
    assert!(e.orientation().yaw_deg() > 5.0);
}

#[test]
fn pitch_stays_clamped_through_any_drag() {
    let mut e = engine();
    let mut sched = ManualScheduler::new();
    e.pointer_down(Vec2::ZERO, &mut sched);
    let path = [
        (0.0, -5000.0),
        (120.0, 37.0),
        (-40.0, 9000.0),
        (7300.0, -3.0),
        (-7300.0, 260.0),
    ];
    for (x, y) in path {
        e.pointer_move(Vec2::new(x, y));
        let pitch = e.orientation().pitch_deg();
        assert!((-5.0..=5.0).contains(&pitch), "pitch {pitch}");
        let yaw = e.shell_transform().yaw_deg;
        assert!(yaw > -180.0 && yaw <= 180.0, "yaw {yaw}");
    }
    // Yaw is raw while dragging.
    assert_eq!(e.orientation().yaw_deg(), -365.0);
    assert_eq!(e.shell_transform().yaw_deg, -5.0);
}

#[test]
fn tap_selects_without_inertia() {
    let mut e = engine();
    let mut sched = ManualScheduler::new();
    e.pointer_down(Vec2::new(10.0, 10.0), &mut sched);
    e.pointer_move(Vec2::new(12.0, 12.0));
    let out = e.pointer_up(
        Vec2::new(12.0, 12.0),
        Vec2::new(0.8, 0.0),
        HitTarget::Screen(Vec2::ZERO),
        &mut sched,
    );
    let expected = SlotId(17 * 5 + 2);
    assert_eq!(out, ReleaseOutcome::Tap { slot: Some(expected) });
    assert!(!sched.has_pending());
    assert_eq!(e.state(), InteractionState::Idle);

    let selected: Vec<_> = e
        .drain_events()
        .into_iter()
        .filter_map(|ev| match ev.payload {
            GalleryEvent::Selected { slot, item } => Some((slot, item.label.clone())),
            _ => None,
        })
        .collect();
    let label = Catalog::builtin().items()[expected.index() % 14].label.clone();
    assert_eq!(selected, vec![(expected, label)]);
}

#[test]
fn drag_suppresses_selection() {
    let mut e = engine();
    let mut sched = ManualScheduler::new();
    e.pointer_down(Vec2::ZERO, &mut sched);
    let out = e.pointer_up(
        Vec2::new(5.0, 0.0),
        Vec2::new(0.0, 0.0),
        HitTarget::Slot(SlotId(3)),
        &mut sched,
    );
    assert_eq!(out, ReleaseOutcome::Settled);
    assert!(e.selected().is_none());
    assert!(
        !e.drain_events()
            .iter()
            .any(|ev| matches!(ev.payload, GalleryEvent::Selected { .. }))
    );
}

#[test]
fn tap_on_empty_slot_selects_nothing() {
    let mut e = GalleryEngine::new(Catalog::new(Vec::new()), GalleryConfig::default())
        .expect("engine");
    let mut sched = ManualScheduler::new();
    e.pointer_down(Vec2::ZERO, &mut sched);
    let out = e.pointer_up(Vec2::ZERO, Vec2::ZERO, HitTarget::Slot(SlotId(0)), &mut sched);
    assert_eq!(out, ReleaseOutcome::Tap { slot: None });
    assert!(e.selected().is_none());
}

#[test]
fn inertia_respects_the_frame_ceiling() {
    let mut e = engine();
    let mut sched = ManualScheduler::new();
    e.pointer_down(Vec2::ZERO, &mut sched);
    e.pointer_up(
        Vec2::new(-300.0, 300.0),
        Vec2::new(-5.0, 5.0),
        HitTarget::Nothing,
        &mut sched,
    );
    let outcomes = run_frames(&mut e, &mut sched);
    let applied = outcomes.iter().filter(|o| **o == FrameOutcome::Applied).count();
    assert_eq!(applied, e.config().inertia.max_frames as usize);
    assert_eq!(outcomes.last(), Some(&FrameOutcome::Stopped(StopReason::FrameCeiling)));
    let o = e.orientation();
    assert!(o.is_finite());
    assert_eq!(o.pitch_deg(), -5.0);
    assert!(o.yaw_deg() > -180.0 && o.yaw_deg() <= 180.0);
}

#[test]
fn new_drag_cancels_running_inertia() {
    let mut e = engine();
    let mut sched = ManualScheduler::new();
    e.pointer_down(Vec2::ZERO, &mut sched);
    e.pointer_up(Vec2::new(200.0, 0.0), Vec2::new(1.0, 0.0), HitTarget::Nothing, &mut sched);
    for _ in 0..5 {
        let (_, due) = sched.advance();
        for ticket in due {
            assert_eq!(e.animation_frame(ticket, &mut sched), FrameOutcome::Applied);
        }
    }

    e.pointer_down(Vec2::new(50.0, 50.0), &mut sched);
    assert_eq!(e.state(), InteractionState::Dragging);
    assert!(!sched.has_pending());
    assert_eq!(sched.cancelled_count(), 1);
    let held = *e.orientation();
    e.drain_events();

    assert!(run_frames(&mut e, &mut sched).is_empty());
    assert_eq!(*e.orientation(), held);
}

#[test]
fn callbacks_that_outlive_cancellation_change_nothing() {
    let mut e = engine();
    let mut host = LeakyScheduler::default();
    e.pointer_down(Vec2::ZERO, &mut host);
    e.pointer_up(Vec2::new(200.0, 0.0), Vec2::new(1.0, 0.0), HitTarget::Nothing, &mut host);
    let first = host.pending.remove(0);
    assert_eq!(e.animation_frame(first, &mut host), FrameOutcome::Applied);

    // Rapid churn: down/up twice before the next frame arrives.
    e.pointer_down(Vec2::ZERO, &mut host);
    e.pointer_up(Vec2::ZERO, Vec2::ZERO, HitTarget::Nothing, &mut host);
    e.pointer_down(Vec2::ZERO, &mut host);
    e.pointer_up(Vec2::ZERO, Vec2::ZERO, HitTarget::Nothing, &mut host);
    let held = *e.orientation();
    e.drain_events();

    for ticket in std::mem::take(&mut host.pending) {
        assert_eq!(e.animation_frame(ticket, &mut host), FrameOutcome::Stale);
    }
    assert_eq!(*e.orientation(), held);
    assert!(e.drain_events().is_empty());
    assert!(e.metrics().counter("inertia.stale_frames") >= 1);
}

#[test]
fn resize_keeps_orientation() {
    let mut e = engine();
    let mut sched = ManualScheduler::new();
    e.pointer_down(Vec2::ZERO, &mut sched);
    e.pointer_move(Vec2::new(-90.0, 40.0));
    e.pointer_up(Vec2::new(-90.0, 40.0), Vec2::ZERO, HitTarget::Nothing, &mut sched);
    let before = *e.orientation();

    assert!(e.resize(3000.0, 2400.0));
    assert_eq!(e.radius().px(), 1200.0);
    assert_eq!(*e.orientation(), before);

    assert!(e.resize(0.0, 0.0));
    assert_eq!(e.radius().px(), 600.0);
    assert!(!e.resize(-50.0, f64::NAN));
    assert_eq!(*e.orientation(), before);
    assert_eq!(e.shell_transform().pitch_deg, before.pitch_deg());
}
