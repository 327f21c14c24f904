//! Pages command implementation
//!
//! Lists the pages of the configured report as the service sees them,
//! which is the quickest way to check page names against the page
//! configuration.

use crate::adapters::powerbi::{PowerBiClient, TokenProvider, POWERBI_SCOPE};
use crate::config::load_config;
use clap::Args;

/// Arguments for the pages command
#[derive(Args, Debug)]
pub struct PagesArgs {}

impl PagesArgs {
    /// Execute the pages command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{e}");
                return Ok(2);
            }
        };

        let client = match PowerBiClient::new(config.powerbi.clone()) {
            Ok(client) => client,
            Err(e) => {
                eprintln!("Failed to create client: {e}");
                return Ok(2);
            }
        };
        let tokens = TokenProvider::new(&config.powerbi, client.http());

        let token = match tokens.fetch(POWERBI_SCOPE).await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "Token acquisition failed");
                eprintln!("Authentication failed: {e}");
                return Ok(4);
            }
        };

        let pages = match client.list_pages(&token).await {
            Ok(pages) => pages,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list report pages");
                eprintln!("Failed to list report pages: {e}");
                return Ok(4);
            }
        };

        println!("Report {} has {} page(s):", config.powerbi.report_id, pages.len());
        for page in &pages {
            match page.order {
                Some(order) => println!("  {:>3}  {}  ({})", order, page.display_name, page.name),
                None => println!("       {}  ({})", page.display_name, page.name),
            }
        }

        Ok(0)
    }
}
