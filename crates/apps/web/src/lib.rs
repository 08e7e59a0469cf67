//! Browser host for the dome gallery.
//!
//! Wires DOM pointer events, `ResizeObserver` and `requestAnimationFrame` into
//! a [`GalleryEngine`] and applies its transforms to the page. A tap on an item
//! dispatches a `dome-select` `CustomEvent` on the root element whose `detail`
//! is `{ kind: "selected", slot, item: { image, label, detail } }`.

use std::cell::RefCell;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use catalog::Catalog;
use dome::{GalleryConfig, GalleryEngine, GalleryEvent, HitTarget, InteractionState, VelocityTracker};
use foundation::Time;
use foundation::math::Vec2;
use gloo_net::http::Request;
use runtime::FrameTicket;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{CustomEvent, CustomEventInit, HtmlElement, PointerEvent, ResizeObserver};

mod dom;
mod frames;

use dom::DomSurface;
use frames::RafScheduler;

static INITIALIZED: AtomicBool = AtomicBool::new(false);
static PANIC_HOOK_SET: OnceLock<()> = OnceLock::new();

const SELECT_EVENT: &str = "dome-select";

type PointerListener = Closure<dyn FnMut(PointerEvent)>;

struct GalleryHost {
    engine: GalleryEngine,
    sched: RafScheduler,
    dom: DomSurface,
    velocity: VelocityTracker,
    pointer_id: Option<i32>,
    listeners: Vec<(&'static str, PointerListener)>,
    resize: Option<(ResizeObserver, Closure<dyn FnMut(js_sys::Array)>)>,
}

/// Work that must run after the host borrow is released, because page
/// listeners may call back into this module.
#[derive(Debug, PartialEq)]
enum Outbound {
    Select(String),
}

/// What one engine event asks of the page.
#[derive(Debug, PartialEq)]
enum Effect {
    Present,
    RebuildItems,
    Dispatch(Outbound),
    Nothing,
}

fn effect_of(event: &GalleryEvent) -> Result<Effect, serde_json::Error> {
    Ok(match event {
        GalleryEvent::OrientationChanged { .. } | GalleryEvent::RadiusChanged { .. } => {
            Effect::Present
        }
        GalleryEvent::Selected { .. } => {
            Effect::Dispatch(Outbound::Select(serde_json::to_string(event)?))
        }
        GalleryEvent::LayoutRebuilt { .. } => Effect::RebuildItems,
        GalleryEvent::SelectionCleared
        | GalleryEvent::InertiaStarted { .. }
        | GalleryEvent::InertiaStopped { .. } => Effect::Nothing,
    })
}

thread_local! {
    static HOST: RefCell<Option<GalleryHost>> = const { RefCell::new(None) };
}

/// Runs `f` on the mounted host. `None` if nothing is mounted, the host is
/// already borrowed further up the stack, or the thread is tearing down.
fn with_host<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut GalleryHost) -> R,
{
    HOST.try_with(|cell| {
        let mut guard = cell.try_borrow_mut().ok()?;
        guard.as_mut().map(f)
    })
    .ok()
    .flatten()
}

fn log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

fn init_panic_hook() {
    PANIC_HOOK_SET.get_or_init(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = info.to_string();
            web_sys::console::error_1(&JsValue::from_str(&msg));
        }));
    });
}

impl GalleryHost {
    /// Drains engine events, applies their visual effect and returns what
    /// still has to reach the page.
    fn flush(&mut self) -> Vec<Outbound> {
        let mut present = false;
        let mut out = Vec::new();
        for event in self.engine.drain_events() {
            match effect_of(&event.payload) {
                Ok(Effect::Present) => present = true,
                Ok(Effect::Dispatch(outbound)) => out.push(outbound),
                Ok(Effect::RebuildItems) => {
                    let rebuilt = web_sys::window()
                        .and_then(|w| w.document())
                        .ok_or_else(|| JsValue::from_str("no document"))
                        .and_then(|doc| self.dom.rebuild_items(&doc, &self.engine));
                    if let Err(err) = rebuilt {
                        log(&format!("dome: layout rebuild failed: {err:?}"));
                    }
                }
                Ok(Effect::Nothing) => {}
                Err(err) => log(&format!("dome: event encode failed: {err}")),
            }
        }
        if present {
            self.engine.present(&mut self.dom);
        }
        self.dom.sync_hover(&self.engine);
        out
    }

    fn offset(&self, pos: Vec2) -> Vec2 {
        pos - self.dom.center()
    }

    fn on_pointer_down(&mut self, e: &PointerEvent) {
        let pos = client_pos(e);
        self.pointer_id = Some(e.pointer_id());
        let _ = self.dom.main().set_pointer_capture(e.pointer_id());
        self.velocity.reset();
        self.velocity.push(Time::from_millis(e.time_stamp()), pos);
        self.engine.pointer_down(pos, &mut self.sched);
    }

    fn on_pointer_move(&mut self, e: &PointerEvent) {
        let pos = client_pos(e);
        if self.engine.state() == InteractionState::Dragging {
            if self.pointer_id != Some(e.pointer_id()) {
                return;
            }
            self.velocity.push(Time::from_millis(e.time_stamp()), pos);
            self.engine.pointer_move(pos);
            return;
        }
        let offset = self.offset(pos);
        let slot = self
            .engine
            .hits()
            .pick(offset, self.engine.orientation(), self.engine.radius())
            .map(|hit| hit.slot);
        self.engine.pointer_hover(slot);
    }

    fn on_pointer_up(&mut self, e: &PointerEvent) {
        if self.pointer_id.take() != Some(e.pointer_id()) {
            return;
        }
        let pos = client_pos(e);
        self.velocity.push(Time::from_millis(e.time_stamp()), pos);
        let velocity = self.velocity.velocity();
        let target = HitTarget::Screen(self.offset(pos));
        self.engine.pointer_up(pos, velocity, target, &mut self.sched);
    }

    fn on_pointer_cancel(&mut self, e: &PointerEvent) {
        if self.pointer_id.take() == Some(e.pointer_id()) {
            self.engine.pointer_cancel();
        }
    }

    fn detach(&mut self) {
        self.sched.cancel_all();
        let target = self.dom.main().clone();
        for (name, listener) in self.listeners.drain(..) {
            let _ = target
                .remove_event_listener_with_callback(name, listener.as_ref().unchecked_ref());
        }
        if let Some((observer, _)) = self.resize.take() {
            observer.disconnect();
        }
        self.dom.detach();
    }
}

fn client_pos(e: &PointerEvent) -> Vec2 {
    Vec2::new(e.client_x() as f64, e.client_y() as f64)
}

fn dispatch(outbound: Vec<Outbound>) {
    if outbound.is_empty() {
        return;
    }
    let Some(root) = with_host(|host| host.dom.root().clone()) else {
        return;
    };
    for item in outbound {
        match item {
            Outbound::Select(json) => {
                if let Err(err) = dispatch_select(&root, &json) {
                    log(&format!("dome: {SELECT_EVENT} dispatch failed: {err:?}"));
                }
            }
        }
    }
}

fn dispatch_select(root: &HtmlElement, json: &str) -> Result<(), JsValue> {
    let init = CustomEventInit::new();
    init.set_bubbles(true);
    init.set_detail(&js_sys::JSON::parse(json)?);
    let event = CustomEvent::new_with_event_init_dict(SELECT_EVENT, &init)?;
    root.dispatch_event(&event)?;
    Ok(())
}

/// Runs one engine call and pushes its effects to the page.
fn drive<F>(f: F)
where
    F: FnOnce(&mut GalleryHost),
{
    let outbound = with_host(|host| {
        f(host);
        host.flush()
    });
    if let Some(outbound) = outbound {
        dispatch(outbound);
    }
}

fn on_animation_frame(ticket: FrameTicket) {
    drive(|host| {
        host.sched.fired(ticket);
        host.engine.animation_frame(ticket, &mut host.sched);
    });
}

fn attach_listeners(target: &HtmlElement) -> Result<Vec<(&'static str, PointerListener)>, JsValue> {
    let handlers: [(&'static str, fn(&mut GalleryHost, &PointerEvent)); 5] = [
        ("pointerdown", GalleryHost::on_pointer_down),
        ("pointermove", GalleryHost::on_pointer_move),
        ("pointerup", GalleryHost::on_pointer_up),
        ("pointercancel", GalleryHost::on_pointer_cancel),
        ("pointerleave", |host, _| {
            host.engine.pointer_hover(None);
        }),
    ];

    let mut listeners = Vec::with_capacity(handlers.len());
    for (name, handler) in handlers {
        let listener = Closure::wrap(Box::new(move |e: PointerEvent| {
            drive(|host| handler(host, &e));
        }) as Box<dyn FnMut(PointerEvent)>);
        target.add_event_listener_with_callback(name, listener.as_ref().unchecked_ref())?;
        listeners.push((name, listener));
    }
    Ok(listeners)
}

fn observe_resize(
    root: &HtmlElement,
) -> Result<(ResizeObserver, Closure<dyn FnMut(js_sys::Array)>), JsValue> {
    let callback = Closure::wrap(Box::new(move |entries: js_sys::Array| {
        let Ok(entry) = entries.get(0).dyn_into::<web_sys::ResizeObserverEntry>() else {
            return;
        };
        let rect = entry.content_rect();
        let (w, h) = (rect.width(), rect.height());
        drive(|host| {
            host.engine.resize(w, h);
        });
    }) as Box<dyn FnMut(js_sys::Array)>);
    let observer = ResizeObserver::new(callback.as_ref().unchecked_ref())?;
    observer.observe(root);
    Ok((observer, callback))
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    init_panic_hook();
    Ok(())
}

/// Builds the gallery inside the element with id `root_id`.
///
/// `config_json` overrides the default tuning; unspecified fields keep their
/// defaults. Mounting again replaces the previous gallery.
#[wasm_bindgen]
pub fn mount(root_id: &str, config_json: Option<String>) -> Result<(), JsValue> {
    unmount();

    let config = match config_json {
        Some(json) => {
            GalleryConfig::from_json_str(&json).map_err(|e| JsValue::from_str(&e.to_string()))?
        }
        None => GalleryConfig::default(),
    };
    let engine = GalleryEngine::new(Catalog::builtin(), config)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let root = document
        .get_element_by_id(root_id)
        .ok_or_else(|| JsValue::from_str(&format!("missing #{root_id}")))?
        .dyn_into::<HtmlElement>()?;

    let dom = DomSurface::mount(&document, root.clone(), &engine)?;
    let listeners = attach_listeners(dom.main())?;
    let host = GalleryHost {
        engine,
        sched: RafScheduler::new(window, on_animation_frame),
        dom,
        velocity: VelocityTracker::new(),
        pointer_id: None,
        listeners,
        resize: None,
    };
    HOST.with(|cell| *cell.borrow_mut() = Some(host));

    // Observing fires an initial callback, so the radius is set from the real size.
    let resize = observe_resize(&root)?;
    with_host(|host| host.resize = Some(resize));
    log(&format!("dome: mounted on #{root_id}"));
    Ok(())
}

/// Tears the gallery down and cancels any pending frame.
#[wasm_bindgen]
pub fn unmount() {
    let host = HOST.try_with(|cell| cell.try_borrow_mut().ok().and_then(|mut h| h.take()));
    if let Ok(Some(mut host)) = host {
        host.detach();
    }
}

/// Fetches a catalog JSON document and swaps it in. The layout is rebuilt
/// only if the items differ from the current ones.
#[wasm_bindgen]
pub fn load_catalog(url: String) {
    spawn_local(async move {
        match fetch_catalog(&url).await {
            Ok(catalog) => drive(|host| {
                host.engine.set_catalog(catalog);
            }),
            Err(err) => log(&format!("dome: catalog load failed for {url}: {err:?}")),
        }
    });
}

async fn fetch_catalog(url: &str) -> Result<Catalog, JsValue> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    if !resp.ok() {
        return Err(JsValue::from_str(&format!("HTTP {}", resp.status())));
    }
    let text = resp
        .text()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Catalog::from_json_str(&text).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Called by the detail view when it closes.
#[wasm_bindgen]
pub fn close_selection() {
    drive(|host| {
        host.engine.clear_selection();
    });
}

/// Engine counters and histograms as JSON.
#[wasm_bindgen]
pub fn metrics_json() -> String {
    with_host(|host| serde_json::to_string(&host.engine.metrics().snapshot()).ok())
        .flatten()
        .unwrap_or_default()
}

/// Current shell transform as JSON (`pitch_deg`, `yaw_deg`, `radius`).
#[wasm_bindgen]
pub fn shell_json() -> String {
    with_host(|host| serde_json::to_string(&host.engine.shell_transform()).ok())
        .flatten()
        .unwrap_or_default()
}

#[cfg(test)]
mod host_contract_tests {
    use std::sync::Arc;

    use super::*;
    use dome::{SlotId, StopReason};

    #[test]
    fn selection_becomes_a_page_event() {
        let item = Arc::new(Catalog::builtin().items()[0].clone());
        let event = GalleryEvent::Selected {
            slot: SlotId(7),
            item: Arc::clone(&item),
        };
        let Ok(Effect::Dispatch(Outbound::Select(json))) = effect_of(&event) else {
            panic!("selection should dispatch");
        };
        let detail: serde_json::Value = serde_json::from_str(&json).expect("json");
        assert_eq!(detail["kind"], "selected");
        assert_eq!(detail["slot"], 7);
        assert_eq!(detail["item"]["label"], item.label.as_str());
        assert_eq!(detail["item"]["image"], item.image.as_str());
    }

    #[test]
    fn motion_events_repaint() {
        let orientation = GalleryEvent::OrientationChanged {
            pitch_deg: 1.0,
            yaw_deg: -3.0,
        };
        let radius = GalleryEvent::RadiusChanged { radius_px: 640.0 };
        assert_eq!(effect_of(&orientation).expect("effect"), Effect::Present);
        assert_eq!(effect_of(&radius).expect("effect"), Effect::Present);
    }

    #[test]
    fn layout_rebuild_recreates_items() {
        let event = GalleryEvent::LayoutRebuilt { slots: 175 };
        assert_eq!(effect_of(&event).expect("effect"), Effect::RebuildItems);
    }

    #[test]
    fn bookkeeping_events_stay_internal() {
        let events = [
            GalleryEvent::SelectionCleared,
            GalleryEvent::InertiaStarted {
                v_yaw: 10.0,
                v_pitch: 0.0,
            },
            GalleryEvent::InertiaStopped {
                reason: StopReason::Settled,
                frames: 131,
            },
        ];
        for event in &events {
            assert_eq!(effect_of(event).expect("effect"), Effect::Nothing);
        }
    }
}
