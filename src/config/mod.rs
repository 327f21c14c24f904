//! Configuration management for easel.
//!
//! TOML-based configuration loading, parsing, and validation with support
//! for environment variable substitution (`${VAR_NAME}`), `EASEL_*`
//! overrides, defaults for optional settings, and secrecy-wrapped
//! credentials.
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//!
//! [powerbi]
//! tenant_id = "00000000-0000-0000-0000-000000000000"
//! client_id = "00000000-0000-0000-0000-000000000001"
//! client_secret = "${EASEL_CLIENT_SECRET}"
//! workspace_id = "00000000-0000-0000-0000-000000000002"
//! report_id = "00000000-0000-0000-0000-000000000003"
//!
//! [pages]
//! source = "file"
//! file_path = "pages.json"
//! report_name = "Full Report"
//!
//! [export]
//! chunk_size = 5
//!
//! [delivery.fileshare]
//! enabled = true
//! account = "reportsaccount"
//! share = "reports"
//! sas_token = "${EASEL_FILESHARE_SAS}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, DeliveryConfig, EaselConfig, EmailConfig, Environment, ExportConfig,
    FailurePolicy, FileShareConfig, LoggingConfig, PageSourceKind, PagesConfig,
    PagesDatabaseConfig, PowerBiConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
