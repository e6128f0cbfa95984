//! Minimal in-process event bus with damping and file watching
//!
//! This crate provides:
//! - `Observer`, an event bus that fans every event out to all listeners
//! - An optional damping buffer that coalesces bursts into one batch
//! - File watching that turns writes to watched files into events
//!
//! ```no_run
//! use observer::{Event, Observer};
//! use std::time::Duration;
//!
//! # async fn demo() -> observer::Result<()> {
//! let observer: Observer<String> = Observer::new();
//! observer.open()?;
//! observer.set_buffer_duration(Duration::from_secs(1));
//! observer.add_listener(|event: Event<String>| println!("Received: {:?}", event))?;
//! observer.watch(["src/*.rs"])?;
//! observer.emit("hello".to_string());
//! # Ok(())
//! # }
//! ```

mod damping;
pub mod error;
pub mod event;
pub mod observer;

// Re-exports
pub use error::ObserverError;
pub use event::Event;
pub use observer::{Listener, Observer};
pub use watcher::{EventKind, WatchError, WatchEvent};

/// Result type for observer operations
pub type Result<T> = std::result::Result<T, ObserverError>;

