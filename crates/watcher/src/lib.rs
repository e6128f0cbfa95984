//! File system watching for observer
//!
//! This crate bridges OS change notifications into observer events:
//! - Directory-level registration, so delete/recreate saves keep firing
//! - Shell-pattern filtering of changed names
//! - Write-class filtering of change records, one per write session
//!
//! Matching changes and asynchronous watcher failures are handed to a sink
//! closure supplied by the owner of the [`Watcher`].

pub mod error;
pub mod pattern;

pub use error::WatchError;
pub use pattern::{PatternSet, WatchPattern};

use notify::event::ModifyKind;
use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};
use observer_core::Set;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// What the watcher knows about: registered directories and name patterns
///
/// Every directory of a registered pattern is in `directories` and is
/// registered with the OS.
#[derive(Debug, Default)]
struct Registry {
    directories: Set,
    patterns: PatternSet,
}

/// File system watcher
///
/// Wraps the platform's recommended notify backend. Dropping the watcher
/// stops all notifications.
pub struct Watcher {
    inner: RecommendedWatcher,
    registry: Arc<RwLock<Registry>>,
}

impl Watcher {
    /// Create a watcher that reports to `sink`
    ///
    /// `sink` runs on the notify backend's thread, once per matching write and
    /// once per error reported by the backend.
    pub fn new<F>(sink: F) -> Result<Self, WatchError>
    where
        F: Fn(Result<WatchEvent, notify::Error>) + Send + 'static,
    {
        let registry = Arc::new(RwLock::new(Registry::default()));
        let handler_registry = Arc::clone(&registry);

        let inner = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    if !EventKind::classify(&event.kind).is_some_and(EventKind::is_write) {
                        return;
                    }

                    let matched: Vec<PathBuf> = {
                        let registry = handler_registry.read();
                        event
                            .paths
                            .iter()
                            .filter_map(|path| {
                                registry.patterns.find(path).map(|p| p.reported_path(path))
                            })
                            .collect()
                    };

                    for path in matched {
                        trace!("Forwarding write to {}", path.display());
                        sink(Ok(WatchEvent {
                            path,
                            kind: EventKind::Modify,
                        }));
                    }
                }
                Err(e) => {
                    warn!("File watcher reported an error: {}", e);
                    sink(Err(e));
                }
            }
        })
        .map_err(WatchError::Create)?;

        Ok(Self { inner, registry })
    }

    /// Start watching the given files or name patterns
    ///
    /// Each path's directory is registered once; later paths in the same
    /// directory only add a pattern. On failure the error for the offending
    /// path is returned and everything registered before it stays registered.
    pub fn watch<I, P>(&mut self, paths: I) -> Result<(), WatchError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            let pattern = WatchPattern::parse(path.as_ref())?;
            let dir_key = pattern.dir().to_string_lossy().into_owned();

            if !self.registry.read().directories.has(&dir_key) {
                self.inner
                    .watch(pattern.dir(), RecursiveMode::NonRecursive)
                    .map_err(|source| WatchError::Register {
                        path: pattern.dir().to_path_buf(),
                        source,
                    })?;

                // Membership was checked above, a duplicate cannot happen here
                let _ = self.registry.write().directories.add(dir_key);
                debug!("Watching directory {}", pattern.dir().display());
            }

            let literal = pattern.as_str().to_string();
            if self.registry.write().patterns.insert(pattern) {
                debug!("Added watch pattern {}", literal);
            }
        }

        Ok(())
    }

    /// Directories registered with the OS, in no particular order
    pub fn directories(&self) -> Vec<String> {
        self.registry.read().directories.values()
    }

    /// Registered name patterns, in registration order
    pub fn patterns(&self) -> Vec<String> {
        self.registry.read().patterns.values()
    }
}

/// File system event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// Path that changed, under the directory as it was passed to `watch`
    pub path: PathBuf,
    /// Type of change
    pub kind: EventKind,
}

impl WatchEvent {
    /// Final component of the changed path
    pub fn name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// Type of file system event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// File created
    Create,
    /// File contents written
    Modify,
    /// File deleted
    Delete,
    /// File renamed
    Rename,
}

impl EventKind {
    /// Classify a raw notify record
    ///
    /// `Modify` is reported once per write session: the close-after-write
    /// record on inotify, the content modification elsewhere.
    /// Other access and metadata-only records have no classification.
    pub fn classify(kind: &notify::EventKind) -> Option<Self> {
        match kind {
            notify::EventKind::Create(_) => Some(EventKind::Create),
            notify::EventKind::Modify(ModifyKind::Name(_)) => Some(EventKind::Rename),
            notify::EventKind::Remove(_) => Some(EventKind::Delete),
            kind if ends_write(kind) => Some(EventKind::Modify),
            _ => None,
        }
    }

    /// Whether this is a content write, the only kind that gets forwarded
    pub fn is_write(self) -> bool {
        self == EventKind::Modify
    }
}

/// Whether a raw record completes one write to a file
///
/// inotify emits a modify record per `write(2)`, and a truncating rewrite
/// makes at least two of them, but only one `IN_CLOSE_WRITE`. Backends
/// without a close record report the content modification itself.
#[cfg(any(target_os = "linux", target_os = "android"))]
fn ends_write(kind: &notify::EventKind) -> bool {
    use notify::event::{AccessKind, AccessMode};

    matches!(
        kind,
        notify::EventKind::Access(AccessKind::Close(AccessMode::Write))
    )
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn ends_write(kind: &notify::EventKind) -> bool {
    matches!(
        kind,
        notify::EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any)
    )
}
