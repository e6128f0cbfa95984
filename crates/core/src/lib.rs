//! Observer Core - shared primitives for the observer workspace
//!
//! This crate provides:
//! - `Set`, a deduplicating membership index of strings

pub mod set;

// Re-exports
pub use set::{Set, SetError};
