//! Init command implementation
//!
//! Generates a starter configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "easel.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            eprintln!("Configuration file already exists: {}", self.output);
            eprintln!("Use --force to overwrite");
            return Ok(2);
        }

        fs::write(&self.output, SAMPLE_CONFIG)?;

        println!("Configuration file created: {}", self.output);
        println!();
        println!("Next steps:");
        println!("  1. Fill in the [powerbi] section with your service principal");
        println!("     and report identifiers (secrets via ${{VAR}} placeholders)");
        println!("  2. Point [pages] at your page configuration");
        println!("  3. Check the result with: easel validate-config");

        Ok(0)
    }
}

const SAMPLE_CONFIG: &str = r#"# easel configuration

# development, staging or production; non-production runs prefix the
# output file name with DEV_
environment = "development"

[application]
log_level = "info"

[powerbi]
tenant_id = "00000000-0000-0000-0000-000000000000"
client_id = "00000000-0000-0000-0000-000000000001"
client_secret = "${EASEL_CLIENT_SECRET}"
workspace_id = "00000000-0000-0000-0000-000000000002"
report_id = "00000000-0000-0000-0000-000000000003"
# poll_interval_seconds = 5
# max_poll_attempts = 120

[pages]
# "file" or "database"
source = "file"
file_path = "pages.json"
# Narrow a run to one report by display name; omit to export all pages
# report_name = "Full Report"

# [pages.database]
# connection_string = "${EASEL_PAGES_DB}"
# table = "scd.measure_print"

[export]
chunk_size = 5
work_dir = "."
# "abort" stops the run on the first failed page; "skip" records the
# failure and merges whatever succeeded
on_page_failure = "abort"

[delivery.fileshare]
enabled = false
# account = "reportsaccount"
# share = "reports"
# directory = "Reports"
# sas_token = "${EASEL_FILESHARE_SAS}"

[delivery.email]
enabled = false
# sender = "reports@example.org"
# recipients = ["someone@example.org"]
# subject = "Report ready"
# attach_report = true

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_parses_and_validates() {
        let substituted = SAMPLE_CONFIG.replace("${EASEL_CLIENT_SECRET}", "secret");
        let config: crate::config::EaselConfig = toml::from_str(&substituted).unwrap();
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("easel.toml");
        std::fs::write(&path, "existing").unwrap();

        let args = InitArgs {
            output: path.to_string_lossy().into_owned(),
            force: false,
        };
        let code = args.execute().await.unwrap();
        assert_eq!(code, 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "existing");
    }

    #[tokio::test]
    async fn test_init_writes_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("easel.toml");

        let args = InitArgs {
            output: path.to_string_lossy().into_owned(),
            force: false,
        };
        let code = args.execute().await.unwrap();
        assert_eq!(code, 0);
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("[powerbi]"));
    }
}
