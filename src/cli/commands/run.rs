//! Run command implementation
//!
//! Executes one full report run: export all configured pages, merge them
//! into one deck, and deliver the result.

use crate::config::load_config;
use crate::core::export::RunCoordinator;
use crate::domain::{EaselError, PowerBiError};
use clap::Args;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Narrow the run to one report by display name
    #[arg(long)]
    pub report: Option<String>,

    /// Override the configured chunk size
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Override the merged output file name
    #[arg(long)]
    pub output: Option<String>,

    /// Skip upload and mail notification
    #[arg(long)]
    pub skip_delivery: bool,

    /// Keep the run directory after a delivered run
    #[arg(long)]
    pub keep_run_dir: bool,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting run command");

        let mut config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("{e}");
                return Ok(2);
            }
        };

        // Apply CLI overrides
        if let Some(report) = &self.report {
            tracing::info!(report = %report, "Overriding report selection from CLI");
            config.pages.report_name = Some(report.clone());
        }
        if let Some(chunk_size) = self.chunk_size {
            tracing::info!(chunk_size, "Overriding chunk size from CLI");
            config.export.chunk_size = chunk_size;
        }
        if let Some(output) = &self.output {
            config.export.output_name = Some(output.clone());
        }
        if self.skip_delivery {
            tracing::info!("Delivery disabled from CLI");
            config.delivery.fileshare.enabled = false;
            config.delivery.email.enabled = false;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let delivered = config.delivery.fileshare.enabled || config.delivery.email.enabled;

        let coordinator = match RunCoordinator::new(config) {
            Ok(coordinator) => coordinator,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create run coordinator");
                eprintln!("Failed to initialize run: {e}");
                return Ok(2);
            }
        };

        let summary = match coordinator.execute_run().await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(error = %e, "Run failed");
                eprintln!("Run failed: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        println!();
        println!("Run summary:");
        println!("  Run id: {}", summary.run_id);
        println!("  Pages: {}", summary.total_pages);
        println!("  Exported: {}", summary.exported_pages);
        println!("  Failed: {}", summary.failed_pages);
        println!("  Merged slides: {}", summary.merged_slides);
        if let Some(output) = &summary.output_path {
            println!("  Output: {}", output.display());
        }
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());

        if !summary.errors.is_empty() {
            println!();
            println!("Errors encountered:");
            for error in &summary.errors {
                match &error.context {
                    Some(context) => println!("  - [{context}] {}", error.message),
                    None => println!("  - {}", error.message),
                }
            }
        }

        // The scratch directory belongs to the caller once the run is
        // over; drop it only when the deck went somewhere else.
        if delivered && !self.keep_run_dir && summary.is_successful() {
            if let Some(run_dir) = summary.output_path.as_ref().and_then(|p| p.parent()) {
                if let Err(e) = std::fs::remove_dir_all(run_dir) {
                    tracing::warn!(
                        dir = %run_dir.display(),
                        error = %e,
                        "Failed to remove run directory"
                    );
                } else {
                    tracing::info!(dir = %run_dir.display(), "Removed run directory");
                }
            }
        }

        Ok(if summary.is_successful() { 0 } else { 1 })
    }
}

/// Map a run error to the process exit code
fn exit_code_for(error: &EaselError) -> i32 {
    match error {
        EaselError::Configuration(_) | EaselError::Validation(_) => 2,
        EaselError::Authentication(_) => 4,
        EaselError::PowerBi(
            PowerBiError::AuthenticationFailed(_) | PowerBiError::ConnectionFailed(_),
        ) => 4,
        _ => 5,
    }
}
