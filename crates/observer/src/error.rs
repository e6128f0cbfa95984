//! Observer errors

use thiserror::Error;
use watcher::WatchError;

/// Errors returned by [`crate::Observer`]
#[derive(Debug, Error)]
pub enum ObserverError {
    /// `open` was called on a bus whose event loop is already running
    #[error("observer already open")]
    AlreadyOpen,

    /// `open` needs a Tokio runtime to host the event loop and damping timers
    #[error("observer must be opened from within a Tokio runtime")]
    NoRuntime,

    #[error(transparent)]
    Watch(#[from] WatchError),
}
