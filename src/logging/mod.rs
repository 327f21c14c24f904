//! Logging and observability
//!
//! Structured logging via `tracing`: console output plus optional
//! rotating JSON file logs for scheduled runs.

pub mod structured;

pub use structured::{init_logging, LoggingGuard};
