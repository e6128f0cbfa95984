//! Watch errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned synchronously by [`crate::Watcher`]
///
/// Failures the OS reports after registration are not errors here: they are
/// handed to the watcher's sink instead.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The OS change-notification capability could not be initialised
    #[error("failed to create file watcher: {0}")]
    Create(#[source] notify::Error),

    /// A directory could not be registered (missing, unreadable, refused)
    #[error("failed to watch {}: {source}", path.display())]
    Register {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// The path has no final name component to match on
    #[error("invalid watch path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// The name component is not a valid shell pattern
    #[error("invalid watch pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}
