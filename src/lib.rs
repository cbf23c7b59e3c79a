//! swdev - live-reload client runtime.
//!
//! Attaches to a development server, keeps a background worker installed,
//! listens for change commands and swaps the running module in place.
//!
//! # Module Structure
//!
//! ```text
//! coordinator/   # start guard, dispatcher, lifecycle
//! worker/        # background worker registration and update polling
//! revalidate     # revalidation requests
//! runner/        # single-instance module runner and loaders
//! channel/       # command channel and envelopes
//! config/        # swdev.toml
//! ```

pub mod channel;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod core;
pub mod error;
pub mod logger;
pub mod revalidate;
pub mod runner;
pub mod utils;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use coordinator::{ChangeHandler, Coordinator, Environment, StartOptions, StartOutcome};
pub use error::ReloadError;
