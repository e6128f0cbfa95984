//! Events delivered to listeners

use watcher::WatchEvent;

/// An event as seen by listeners
///
/// `T` is the payload type callers emit. File changes and watcher failures
/// travel through the same bus as emitted values.
#[derive(Debug, Clone, PartialEq)]
pub enum Event<T> {
    /// A value passed to `emit`
    Value(T),
    /// A write to a watched file
    Change(WatchEvent),
    /// An error reported asynchronously by the file watcher
    WatchError(String),
    /// Everything submitted during one damping window, in submission order
    ///
    /// Batches never contain other batches.
    Batch(Vec<Event<T>>),
}

impl<T> Event<T> {
    /// The emitted value, if this is a single value
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Event::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The file change, if this is a single change
    pub fn as_change(&self) -> Option<&WatchEvent> {
        match self {
            Event::Change(change) => Some(change),
            _ => None,
        }
    }

    /// The batched events, if this is a damping batch
    pub fn as_batch(&self) -> Option<&[Event<T>]> {
        match self {
            Event::Batch(events) => Some(events),
            _ => None,
        }
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, Event::Batch(_))
    }
}
