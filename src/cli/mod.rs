//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for easel using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// easel - automated report export and presentation assembly
#[derive(Parser, Debug)]
#[command(name = "easel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "easel.toml", env = "EASEL_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "EASEL_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export all configured pages, merge them, and deliver the deck
    Run(commands::run::RunArgs),

    /// List the pages of the configured report
    Pages(commands::pages::PagesArgs),

    /// Validate the configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["easel", "run"]);
        assert_eq!(cli.config, "easel.toml");
        assert!(matches!(cli.command, Commands::Run(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["easel", "--config", "custom.toml", "run"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_run_overrides() {
        let cli = Cli::parse_from([
            "easel",
            "run",
            "--report",
            "Full Report",
            "--chunk-size",
            "3",
            "--skip-delivery",
        ]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.report.as_deref(), Some("Full Report"));
                assert_eq!(args.chunk_size, Some(3));
                assert!(args.skip_delivery);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_cli_parse_pages() {
        let cli = Cli::parse_from(["easel", "pages"]);
        assert!(matches!(cli.command, Commands::Pages(_)));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["easel", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["easel", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
