//! # easel - automated report export and presentation assembly
//!
//! easel generates a multi-page PowerPoint report from a Power BI report:
//! it exports each configured page through the service's export API,
//! downloads the resulting single-page decks, merges them into one
//! presentation, and delivers the artifact to an Azure file share and/or
//! a notification mail.
//!
//! ## Architecture
//!
//! easel follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (page sources, export orchestration, merge)
//! - [`adapters`] - External integrations (Power BI, file share, mail)
//! - [`domain`] - Core domain types and the error hierarchy
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use easel::config::load_config;
//! use easel::core::export::RunCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("easel.toml")?;
//!
//!     let coordinator = RunCoordinator::new(config)?;
//!     let summary = coordinator.execute_run().await?;
//!
//!     println!(
//!         "Merged {} slides into {:?}",
//!         summary.merged_slides, summary.output_path
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Export orchestration
//!
//! Pages are exported in consecutive chunks to respect the service's
//! concurrent-export quota: all exports inside one chunk run concurrently
//! over a shared connection pool, and a chunk finishes entirely before the
//! next one starts. Each export is an asynchronous job on the service
//! side - submitted, polled on a fixed interval until terminal (with a
//! bounded attempt budget), then downloaded to a run-scoped scratch
//! directory with zero-padded file names.
//!
//! ## Merging
//!
//! The merger concatenates the per-page decks in filename order into one
//! 16:9 presentation. Non-picture shapes are cloned verbatim at the XML
//! element level; pictures are re-materialized from raw image bytes
//! because shape elements alone do not carry their media across
//! independent packages.
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`] with the
//! [`domain::EaselError`] hierarchy; errors propagate to the process
//! boundary and terminate the run with a non-zero exit code. A failed run
//! delivers no partial report.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
