//! Damping buffer
//!
//! Trailing-edge debounce for bursts of events: every submission restarts a
//! quiet-period timer, and when the timer finally fires everything accumulated
//! so far is delivered as a single [`Event::Batch`].

use crate::event::Event;
use crate::observer::EventSender;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

/// Accumulates events until no new one arrives for `window`
pub(crate) struct DampingBuffer<T> {
    window: Duration,
    slot: Arc<Mutex<Slot<T>>>,
}

/// Pending events and the one timer that will flush them
///
/// `pending` is non-empty exactly when `timer` is armed.
struct Slot<T> {
    pending: Vec<Event<T>>,
    timer: Option<JoinHandle<()>>,
    /// Bumped on every rearm; a timer that wakes up stale does nothing
    generation: u64,
}

impl<T> Slot<T> {
    fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.generation = self.generation.wrapping_add(1);
    }
}

impl<T> DampingBuffer<T> {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            slot: Arc::new(Mutex::new(Slot {
                pending: Vec::new(),
                timer: None,
                generation: 0,
            })),
        }
    }

    pub(crate) fn window(&self) -> Duration {
        self.window
    }

    /// Change the window; an already armed timer keeps its deadline
    pub(crate) fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    /// Cancel the timer and send whatever is pending right away
    pub(crate) fn flush_now(&self, queue: &EventSender<T>) {
        let mut slot = self.slot.lock();
        slot.disarm();

        let batch = std::mem::take(&mut slot.pending);
        if batch.is_empty() {
            return;
        }

        debug!("Flushing {} damped events early", batch.len());
        if queue.send(Event::Batch(batch)).is_err() {
            debug!("Observer closed before flush, batch dropped");
        }
    }

    /// Cancel the timer and drop whatever is pending
    ///
    /// Returns the number of dropped events.
    pub(crate) fn discard(&self) -> usize {
        let mut slot = self.slot.lock();
        slot.disarm();
        let dropped = slot.pending.len();
        slot.pending.clear();
        dropped
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.slot.lock().pending.len()
    }

    #[cfg(test)]
    fn is_armed(&self) -> bool {
        self.slot.lock().timer.is_some()
    }
}

impl<T: Send + 'static> DampingBuffer<T> {
    /// Append `event` and restart the quiet-period timer
    ///
    /// When the timer fires, the batch is sent on `queue`.
    pub(crate) fn accumulate(&self, event: Event<T>, queue: &EventSender<T>, runtime: &Handle) {
        let mut slot = self.slot.lock();

        match event {
            Event::Batch(events) => slot.pending.extend(events),
            event => slot.pending.push(event),
        }

        slot.disarm();
        let generation = slot.generation;
        let shared = Arc::clone(&self.slot);
        let queue = queue.clone();
        let window = self.window;

        slot.timer = Some(runtime.spawn(async move {
            tokio::time::sleep(window).await;

            let mut slot = shared.lock();
            if slot.generation != generation {
                return;
            }
            slot.timer = None;

            let batch = std::mem::take(&mut slot.pending);
            if batch.is_empty() {
                return;
            }

            debug!("Damping window elapsed, flushing {} events", batch.len());
            if queue.send(Event::Batch(batch)).is_err() {
                debug!("Observer closed before flush, batch dropped");
            }
        }));
    }
}
