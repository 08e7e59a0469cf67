use serde::Serialize;

/// An outbound event stamped with the producer's sequence number.
///
/// The producer bumps the number once per handled call (input, frame,
/// resize), so events raised by the same call share a stamp and stamps never
/// decrease.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event<E> {
    pub sequence: u64,
    pub payload: E,
}

/// Ordered queue of outbound events.
///
/// Producers push while handling input or a frame; the host drains after each
/// call. Order of emission is preserved.
#[derive(Debug)]
pub struct EventBus<E> {
    events: Vec<Event<E>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, sequence: u64, payload: E) {
        self.events.push(Event {
            sequence,
            payload,
        });
    }

    pub fn events(&self) -> &[Event<E>] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Event<E>> {
        std::mem::take(&mut self.events)
    }
}
