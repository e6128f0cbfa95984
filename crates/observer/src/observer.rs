//! The event bus
//!
//! One [`Observer`] owns a listener registry, a single event loop task, an
//! optional damping buffer and an optional file watcher. Events flow:
//!
//! ```text
//! emit / file watcher -> [damping buffer] -> queue -> event loop -> every listener
//! ```
//!
//! The loop never waits for listeners: each call runs as its own blocking
//! task, so a slow listener cannot stall delivery to the others.

use crate::damping::DampingBuffer;
use crate::error::ObserverError;
use crate::event::Event;
use crate::Result;
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use watcher::Watcher;

/// Sender side of the event queue
pub(crate) type EventSender<T> = mpsc::UnboundedSender<Event<T>>;
/// Receiver side of the event queue
pub(crate) type EventReceiver<T> = mpsc::UnboundedReceiver<Event<T>>;

/// A callback invoked once per delivered event
pub type Listener<T> = Arc<dyn Fn(Event<T>) + Send + Sync + 'static>;

/// Lifecycle of the bus
enum State<T> {
    /// Never opened
    Uninitialized,
    /// Event loop running
    Open(Running<T>),
    /// Closed; may be opened again
    Closed,
}

/// Resources that only exist while the bus is open
struct Running<T> {
    queue: EventSender<T>,
    quit: oneshot::Sender<()>,
    runtime: Handle,
    task: JoinHandle<()>,
}

/// State shared with the file watcher's callback
struct Shared<T> {
    state: Mutex<State<T>>,
    listeners: Arc<RwLock<Vec<Listener<T>>>>,
    damping: Mutex<Option<DampingBuffer<T>>>,
}

impl<T> Shared<T>
where
    T: Clone + Send + 'static,
{
    /// Hand an event to the damping buffer, or straight to the queue
    fn submit(&self, event: Event<T>) {
        let state = self.state.lock();
        let State::Open(running) = &*state else {
            warn!("Observer is not open, dropping event");
            return;
        };

        match self.damping.lock().as_ref() {
            Some(buffer) => buffer.accumulate(event, &running.queue, &running.runtime),
            None => {
                if running.queue.send(event).is_err() {
                    warn!("Event loop has stopped, dropping event");
                }
            }
        }
    }
}

/// In-process event bus with optional damping and file watching
///
/// Listeners may be added at any time. Events emitted while the bus is not
/// open are dropped.
pub struct Observer<T = String> {
    shared: Arc<Shared<T>>,
    /// Created on the first `watch` call
    watcher: Mutex<Option<Watcher>>,
}

impl<T> Observer<T>
where
    T: Clone + Send + 'static,
{
    /// Create a closed bus with no listeners and no damping
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::Uninitialized),
                listeners: Arc::new(RwLock::new(Vec::new())),
                damping: Mutex::new(None),
            }),
            watcher: Mutex::new(None),
        }
    }

    /// Allocate the queue and start the event loop
    ///
    /// Must be called from within a Tokio runtime. Fails with
    /// [`ObserverError::AlreadyOpen`] if the loop is already running, leaving
    /// it untouched.
    pub fn open(&self) -> Result<()> {
        let mut state = self.shared.state.lock();
        if matches!(*state, State::Open(_)) {
            return Err(ObserverError::AlreadyOpen);
        }

        let runtime = Handle::try_current().map_err(|_| ObserverError::NoRuntime)?;
        let (queue, events) = mpsc::unbounded_channel();
        let (quit, quit_rx) = oneshot::channel();

        let listeners = Arc::clone(&self.shared.listeners);
        let task = runtime.spawn(run_loop(events, quit_rx, listeners));

        *state = State::Open(Running {
            queue,
            quit,
            runtime,
            task,
        });

        debug!("Observer opened");
        Ok(())
    }

    /// Register a listener
    ///
    /// Listeners are never removed or deduplicated. Every listener registered
    /// when an event is dispatched receives that event.
    pub fn add_listener<F>(&self, listener: F) -> Result<()>
    where
        F: Fn(Event<T>) + Send + Sync + 'static,
    {
        self.shared.listeners.write().push(Arc::new(listener));
        Ok(())
    }

    /// Submit a value for delivery to every listener
    ///
    /// Never blocks on listeners. With damping enabled the value is held
    /// until the damping window closes.
    pub fn emit(&self, value: T) {
        self.shared.submit(Event::Value(value));
    }

    /// Set the damping window
    ///
    /// A zero duration disables damping; anything still pending is flushed
    /// at once as one batch.
    pub fn set_buffer_duration(&self, duration: Duration) {
        let state = self.shared.state.lock();
        let mut damping = self.shared.damping.lock();

        if duration.is_zero() {
            if let Some(buffer) = damping.take() {
                match &*state {
                    State::Open(running) => buffer.flush_now(&running.queue),
                    _ => {
                        buffer.discard();
                    }
                }
                debug!("Damping disabled");
            }
            return;
        }

        match damping.as_mut() {
            Some(buffer) => buffer.set_window(duration),
            None => *damping = Some(DampingBuffer::new(duration)),
        }
        debug!("Damping window set to {:?}", duration);
    }

    /// Deliver writes to the given files or name patterns as events
    ///
    /// Creates the file watcher on first use and opens the bus if it is not
    /// open. Each path is split into a directory, which is watched, and a
    /// shell pattern for names in it, e.g. `src/*.c`. File changes go through
    /// the damping buffer like emitted values.
    ///
    /// On error, paths registered before the failing one stay registered,
    /// and a bus opened by this call is stopped again.
    pub fn watch<I, P>(&self, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut slot = self.watcher.lock();
        let mut watcher = match slot.take() {
            Some(watcher) => watcher,
            None => {
                let shared = Arc::clone(&self.shared);
                let created = Watcher::new(move |res| {
                    let event = match res {
                        Ok(change) => Event::Change(change),
                        Err(e) => Event::WatchError(e.to_string()),
                    };
                    shared.submit(event);
                })?;
                debug!("File watcher created");
                created
            }
        };

        let opened = match self.open() {
            Ok(()) => true,
            Err(ObserverError::AlreadyOpen) => false,
            Err(e) => {
                *slot = Some(watcher);
                return Err(e);
            }
        };

        let registered = watcher.watch(paths);
        *slot = Some(watcher);
        drop(slot);

        if let Err(e) = registered {
            if opened {
                self.stop();
            }
            return Err(e.into());
        }
        Ok(())
    }
}

impl<T> Observer<T> {
    /// Stop the event loop and release the queue and the file watcher
    ///
    /// Events still queued or waiting in the damping buffer are dropped.
    /// Listener calls already in flight run to completion. Closing a bus that
    /// is not open does nothing.
    pub fn close(&self) -> Result<()> {
        self.stop();

        if self.watcher.lock().take().is_some() {
            debug!("File watcher released");
        }

        Ok(())
    }

    /// Stop the event loop, keeping the file watcher and its registrations
    fn stop(&self) {
        let running = {
            let mut state = self.shared.state.lock();
            match std::mem::replace(&mut *state, State::Closed) {
                State::Open(running) => Some(running),
                State::Uninitialized => {
                    *state = State::Uninitialized;
                    None
                }
                State::Closed => None,
            }
        };

        if let Some(running) = running {
            // The loop may already be gone if the runtime shut down
            let _ = running.quit.send(());
            drop(running.queue);
            drop(running.task);

            if let Some(buffer) = self.shared.damping.lock().as_ref() {
                let dropped = buffer.discard();
                if dropped > 0 {
                    debug!("Dropped {} damped events on close", dropped);
                }
            }

            debug!("Observer closed");
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(*self.shared.state.lock(), State::Open(_))
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listeners.read().len()
    }

    /// Current damping window; zero when damping is disabled
    pub fn buffer_duration(&self) -> Duration {
        self.shared
            .damping
            .lock()
            .as_ref()
            .map(DampingBuffer::window)
            .unwrap_or(Duration::ZERO)
    }

    /// Number of events waiting in the damping buffer
    pub fn pending_len(&self) -> usize {
        self.shared
            .damping
            .lock()
            .as_ref()
            .map(DampingBuffer::pending_len)
            .unwrap_or(0)
    }

    /// Directories under watch, in no particular order
    pub fn watched_directories(&self) -> Vec<String> {
        self.watcher
            .lock()
            .as_ref()
            .map(Watcher::directories)
            .unwrap_or_default()
    }

    /// Watch patterns, in registration order
    pub fn watched_patterns(&self) -> Vec<String> {
        self.watcher
            .lock()
            .as_ref()
            .map(Watcher::patterns)
            .unwrap_or_default()
    }
}

impl<T> Default for Observer<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Observer<T> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// The event loop: one per open bus
async fn run_loop<T>(
    mut events: EventReceiver<T>,
    mut quit: oneshot::Receiver<()>,
    listeners: Arc<RwLock<Vec<Listener<T>>>>,
) where
    T: Clone + Send + 'static,
{
    loop {
        tokio::select! {
            biased;
            _ = &mut quit => break,
            event = events.recv() => match event {
                Some(event) => dispatch(&listeners, event),
                None => break,
            },
        }
    }

    debug!("Event loop stopped");
}

/// Start one independent call per registered listener, in registration order
fn dispatch<T>(listeners: &RwLock<Vec<Listener<T>>>, event: Event<T>)
where
    T: Clone + Send + 'static,
{
    let snapshot: Vec<Listener<T>> = listeners.read().clone();

    for (index, listener) in snapshot.into_iter().enumerate() {
        let event = event.clone();
        let call = tokio::task::spawn_blocking(move || listener(event));

        // A panicking listener only loses its own call
        tokio::spawn(async move {
            if let Err(e) = call.await {
                if e.is_panic() {
                    warn!(listener = index, "Listener panicked while handling an event");
                }
            }
        });
    }
}
