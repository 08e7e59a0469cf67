use std::collections::BTreeMap;

use foundation::Handle;
use runtime::{FrameScheduler, FrameTicket};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

type FrameCallback = Closure<dyn FnMut(f64)>;

/// Issues tickets in order. The generation advances each time the index
/// wraps, so a ticket is never handed out twice.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TicketSequence {
    next_index: u32,
    generation: u32,
}

impl TicketSequence {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn starting_at(next_index: u32, generation: u32) -> Self {
        Self {
            next_index,
            generation,
        }
    }

    pub fn next_ticket(&mut self) -> FrameTicket {
        let ticket = FrameTicket(Handle::new(self.next_index, self.generation));
        self.next_index = self.next_index.wrapping_add(1);
        if self.next_index == 0 {
            self.generation = self.generation.wrapping_add(1);
        }
        ticket
    }
}

/// `requestAnimationFrame` behind the engine's scheduler seam.
///
/// Each request owns a one-shot callback carrying its ticket. The callback is
/// freed when the request is cancelled, or one frame after it has run.
pub struct RafScheduler {
    window: web_sys::Window,
    tickets: TicketSequence,
    pending: BTreeMap<FrameTicket, (i32, FrameCallback)>,
    // The callback that fired last; it may still be on the stack when `fired` runs.
    spent: Option<FrameCallback>,
    on_frame: fn(FrameTicket),
}

impl RafScheduler {
    pub fn new(window: web_sys::Window, on_frame: fn(FrameTicket)) -> Self {
        Self {
            window,
            tickets: TicketSequence::new(),
            pending: BTreeMap::new(),
            spent: None,
            on_frame,
        }
    }

    /// Forgets a ticket whose callback is running now.
    pub fn fired(&mut self, ticket: FrameTicket) {
        if let Some((_, callback)) = self.pending.remove(&ticket) {
            self.spent = Some(callback);
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, (id, _callback)) in std::mem::take(&mut self.pending) {
            let _ = self.window.cancel_animation_frame(id);
        }
        self.spent.take();
    }
}

impl Drop for RafScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> FrameTicket {
        let ticket = self.tickets.next_ticket();
        let on_frame = self.on_frame;
        let callback: FrameCallback = Closure::once(move |_timestamp: f64| on_frame(ticket));
        match self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
        {
            Ok(id) => {
                self.pending.insert(ticket, (id, callback));
            }
            Err(err) => {
                web_sys::console::error_1(&JsValue::from_str(&format!(
                    "requestAnimationFrame failed: {err:?}"
                )));
            }
        }
        ticket
    }

    fn cancel_frame(&mut self, ticket: FrameTicket) {
        if let Some((id, _callback)) = self.pending.remove(&ticket) {
            let _ = self.window.cancel_animation_frame(id);
        }
    }
}
