//! Validate-config command implementation

use crate::config::{load_config, PageSourceKind};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        match load_config(config_path) {
            Ok(config) => {
                println!("Configuration is valid: {config_path}");
                println!("  Environment: {:?}", config.environment);
                println!("  Workspace: {}", config.powerbi.workspace_id);
                println!("  Report: {}", config.powerbi.report_id);
                match config.pages.source {
                    PageSourceKind::File => {
                        println!("  Pages: file ({})", config.pages.file_path)
                    }
                    PageSourceKind::Database => println!("  Pages: database"),
                }
                println!("  Chunk size: {}", config.export.chunk_size);
                println!(
                    "  Delivery: fileshare={}, email={}",
                    config.delivery.fileshare.enabled, config.delivery.email.enabled
                );
                Ok(0)
            }
            Err(e) => {
                eprintln!("Configuration is invalid: {e}");
                Ok(2)
            }
        }
    }
}
