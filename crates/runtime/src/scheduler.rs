use foundation::handles::Handle;
use tracing::trace;

use crate::frame::Frame;

/// Names one requested frame callback.
///
/// A ticket is live from `request_frame` until its callback fires or it is
/// cancelled. Tickets are never reused, so a callback that arrives for a dead
/// ticket can always be recognized and dropped.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameTicket(pub Handle);

impl FrameTicket {
    pub fn index(&self) -> u32 {
        self.0.index()
    }
}

/// Host frame scheduling (`requestAnimationFrame` on the web).
///
/// Requests are one-shot: a repeating animation re-requests from inside its own
/// callback. Callbacks are delivered serially on the thread that owns the
/// scheduler.
pub trait FrameScheduler {
    /// Requests one callback on the next display frame.
    fn request_frame(&mut self) -> FrameTicket;

    /// Cancels a pending request. Cancelling a fired or unknown ticket is a no-op.
    fn cancel_frame(&mut self, ticket: FrameTicket);
}

/// Holds at most one live ticket for a repeating task.
///
/// `schedule` cancels whatever was live before requesting again, so two frame
/// chains can never run side by side.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskSlot {
    live: Option<FrameTicket>,
}

impl TaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, sched: &mut dyn FrameScheduler) -> FrameTicket {
        self.cancel(sched);
        let ticket = sched.request_frame();
        self.live = Some(ticket);
        ticket
    }

    /// Cancels the live ticket, if any. Returns `true` if one was cancelled.
    pub fn cancel(&mut self, sched: &mut dyn FrameScheduler) -> bool {
        match self.live.take() {
            Some(ticket) => {
                sched.cancel_frame(ticket);
                true
            }
            None => false,
        }
    }

    /// Accepts the callback for `ticket`.
    ///
    /// Returns `false` for a ticket that is not the live one; the caller must
    /// then do nothing.
    pub fn fire(&mut self, ticket: FrameTicket) -> bool {
        if self.live == Some(ticket) {
            self.live = None;
            true
        } else {
            false
        }
    }

    pub fn live(&self) -> Option<FrameTicket> {
        self.live
    }

    pub fn is_active(&self) -> bool {
        self.live.is_some()
    }
}

/// Deterministic scheduler driven by hand.
///
/// Used by tests and the CLI simulator in place of a display. `advance` starts
/// the next frame and hands back the tickets that are due; requests made while
/// those are being handled land in the frame after.
#[derive(Debug)]
pub struct ManualScheduler {
    epoch: u32,
    next_index: u32,
    pending: Vec<FrameTicket>,
    frame: Frame,
    cancelled: u64,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            epoch: 0,
            next_index: 0,
            pending: Vec::new(),
            frame: Frame::first(),
            cancelled: 0,
        }
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn pending(&self) -> &[FrameTicket] {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of requests cancelled before they fired.
    pub fn cancelled_count(&self) -> u64 {
        self.cancelled
    }

    pub fn advance(&mut self) -> (Frame, Vec<FrameTicket>) {
        self.frame = self.frame.next();
        let due = std::mem::take(&mut self.pending);
        trace!(frame = self.frame.index, due = due.len(), "manual frame");
        (self.frame, due)
    }

    /// Drops every pending request and starts a new ticket epoch.
    pub fn reset(&mut self) {
        self.cancelled += self.pending.len() as u64;
        self.pending.clear();
        self.epoch = self.epoch.wrapping_add(1);
        self.next_index = 0;
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameTicket {
        let ticket = FrameTicket(Handle::new(self.next_index, self.epoch));
        self.next_index = self.next_index.wrapping_add(1);
        self.pending.push(ticket);
        ticket
    }

    fn cancel_frame(&mut self, ticket: FrameTicket) {
        let before = self.pending.len();
        self.pending.retain(|t| *t != ticket);
        self.cancelled += (before - self.pending.len()) as u64;
    }
}
