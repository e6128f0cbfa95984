//! Observer command-line runner
//!
//! Watches files and runs scripts whenever one of them is modified.

pub mod config;
pub mod runner;
pub mod script;

pub use config::Config;
