//! Configuration schema types
//!
//! This module defines the configuration structure mapped from the TOML
//! file. Every section owns a `validate()` method; the loader runs them all
//! after parsing so a bad configuration fails before any network call.

use crate::config::SecretString;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

/// Runtime environment
///
/// Non-production environments prefix the merged output file name with
/// `DEV_` so a staging run can never be mistaken for the delivered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment
    #[default]
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

impl Environment {
    /// Prefix applied to the merged output file name
    pub fn output_prefix(&self) -> &'static str {
        match self {
            Environment::Production => "",
            Environment::Development | Environment::Staging => "DEV_",
        }
    }
}

/// Page-source strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PageSourceKind {
    /// Static JSON page file
    #[default]
    File,
    /// PostgreSQL configuration table
    Database,
}

/// What to do when a page export fails inside a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Abort the run after the failing chunk completes (no partial report)
    #[default]
    Abort,
    /// Record the failure and continue; merge whatever pages succeeded
    Skip,
}

/// Main easel configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EaselConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: Environment,

    /// Power BI service connection and export settings
    pub powerbi: PowerBiConfig,

    /// Page configuration source
    #[serde(default)]
    pub pages: PagesConfig,

    /// Export orchestration settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Delivery settings (file share upload, mail notification)
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EaselConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.powerbi.validate()?;
        self.pages.validate()?;
        self.export.validate()?;
        self.delivery.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Power BI service configuration
///
/// Carries the report identity (the `ReportInstance` of one run) together
/// with endpoint and polling settings. The base URLs are configurable so
/// tests can point the client at a local mock server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerBiConfig {
    /// Azure AD tenant id
    pub tenant_id: String,

    /// Service principal client id
    pub client_id: String,

    /// Service principal client secret
    /// Stored securely in memory and automatically zeroized on drop
    pub client_secret: SecretString,

    /// Power BI workspace (group) id
    pub workspace_id: String,

    /// Report id to export pages from
    pub report_id: String,

    /// Base URL of the Power BI REST API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Base URL of the Azure AD token authority
    #[serde(default = "default_authority_host")]
    pub authority_host: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Delay between export status polls, in seconds
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,

    /// Maximum number of status polls before an export counts as hung
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: usize,

    /// Semantic-model table the measure filter targets
    #[serde(default = "default_filter_table")]
    pub filter_table: String,

    /// Column of `filter_table` the measure filter targets
    #[serde(default = "default_filter_column")]
    pub filter_column: String,
}

impl PowerBiConfig {
    fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("powerbi.tenant_id", &self.tenant_id),
            ("powerbi.client_id", &self.client_id),
            ("powerbi.workspace_id", &self.workspace_id),
            ("powerbi.report_id", &self.report_id),
        ] {
            if value.is_empty() {
                return Err(format!("{name} cannot be empty"));
            }
        }

        if self.client_secret.expose_secret().is_empty() {
            return Err("powerbi.client_secret cannot be empty".to_string());
        }

        for (name, value) in [
            ("powerbi.api_base_url", &self.api_base_url),
            ("powerbi.authority_host", &self.authority_host),
        ] {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(format!("{name} must start with http:// or https://"));
            }
        }

        if self.poll_interval_seconds == 0 {
            return Err("powerbi.poll_interval_seconds must be at least 1".to_string());
        }

        if self.max_poll_attempts == 0 {
            return Err("powerbi.max_poll_attempts must be at least 1".to_string());
        }

        if self.filter_table.is_empty() || self.filter_column.is_empty() {
            return Err(
                "powerbi.filter_table and powerbi.filter_column cannot be empty".to_string(),
            );
        }

        Ok(())
    }
}

/// Page configuration source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesConfig {
    /// Which strategy produces the page list
    #[serde(default)]
    pub source: PageSourceKind,

    /// Narrow the page list to one report by display name (None = all pages)
    #[serde(default)]
    pub report_name: Option<String>,

    /// Path to the JSON page file (file source)
    #[serde(default = "default_pages_file")]
    #[serde(alias = "file")]
    pub file_path: String,

    /// Database settings (required when source = "database")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PagesDatabaseConfig>,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            source: PageSourceKind::default(),
            report_name: None,
            file_path: default_pages_file(),
            database: None,
        }
    }
}

impl PagesConfig {
    fn validate(&self) -> Result<(), String> {
        match self.source {
            PageSourceKind::File => {
                if self.file_path.is_empty() {
                    return Err("pages.file_path cannot be empty".to_string());
                }
            }
            PageSourceKind::Database => match &self.database {
                Some(db) => db.validate()?,
                None => {
                    return Err(
                        "pages.database configuration is required when pages.source = 'database'"
                            .to_string(),
                    )
                }
            },
        }
        Ok(())
    }
}

/// Database settings for the database page source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesDatabaseConfig {
    /// PostgreSQL connection string
    /// Stored securely in memory and automatically zeroized on drop
    pub connection_string: SecretString,

    /// Table holding the page configuration rows
    #[serde(default = "default_pages_table")]
    pub table: String,
}

impl PagesDatabaseConfig {
    fn validate(&self) -> Result<(), String> {
        if self.connection_string.expose_secret().is_empty() {
            return Err("pages.database.connection_string cannot be empty".to_string());
        }

        // The table name is interpolated into the query text, so it must be
        // a plain (optionally schema-qualified) identifier.
        let valid_table = !self.table.is_empty()
            && self
                .table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        if !valid_table {
            return Err(format!(
                "pages.database.table '{}' is not a valid identifier",
                self.table
            ));
        }

        Ok(())
    }
}

/// Export orchestration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Number of pages exported concurrently per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Directory under which run-scoped scratch directories are created
    #[serde(default = "default_work_dir")]
    pub work_dir: String,

    /// Override for the merged output file name (default derives from the
    /// report name and environment)
    #[serde(default)]
    pub output_name: Option<String>,

    /// What to do when a page export fails inside a chunk
    #[serde(default)]
    pub on_page_failure: FailurePolicy,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        // The service caps concurrent exports per workspace; anything past
        // 25 would only queue server-side.
        if !(1..=25).contains(&self.chunk_size) {
            return Err(format!(
                "export.chunk_size must be between 1 and 25, got {}",
                self.chunk_size
            ));
        }

        if self.work_dir.is_empty() {
            return Err("export.work_dir cannot be empty".to_string());
        }

        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            work_dir: default_work_dir(),
            output_name: None,
            on_page_failure: FailurePolicy::default(),
        }
    }
}

/// Delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeliveryConfig {
    /// Mail notification settings
    #[serde(default)]
    pub email: EmailConfig,

    /// Azure file share upload settings
    #[serde(default)]
    pub fileshare: FileShareConfig,
}

impl DeliveryConfig {
    fn validate(&self) -> Result<(), String> {
        self.email.validate()?;
        self.fileshare.validate()?;
        Ok(())
    }
}

/// Mail notification settings (Microsoft Graph sendMail)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Whether to send a notification mail after a successful run
    #[serde(default)]
    pub enabled: bool,

    /// Mailbox the notification is sent from
    #[serde(default)]
    pub sender: Option<String>,

    /// Recipient addresses
    #[serde(default)]
    pub recipients: Vec<String>,

    /// Mail subject
    #[serde(default = "default_mail_subject")]
    pub subject: String,

    /// Attach the merged deck to the notification mail
    #[serde(default)]
    pub attach_report: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sender: None,
            recipients: Vec::new(),
            subject: default_mail_subject(),
            attach_report: false,
        }
    }
}

impl EmailConfig {
    fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }
        if self.sender.as_deref().unwrap_or("").is_empty() {
            return Err("delivery.email.sender is required when email is enabled".to_string());
        }
        if self.recipients.is_empty() {
            return Err("delivery.email.recipients cannot be empty when email is enabled"
                .to_string());
        }
        Ok(())
    }
}

/// Azure file share upload settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileShareConfig {
    /// Whether to upload the merged deck to the file share
    #[serde(default)]
    pub enabled: bool,

    /// Storage account name
    #[serde(default)]
    pub account: String,

    /// File share name
    #[serde(default)]
    pub share: String,

    /// Directory on the share the report is uploaded into
    #[serde(default = "default_fileshare_directory")]
    pub directory: String,

    /// Shared access signature authorizing the upload
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub sas_token: Option<SecretString>,
}

impl Default for FileShareConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            account: String::new(),
            share: String::new(),
            directory: default_fileshare_directory(),
            sas_token: None,
        }
    }
}

impl FileShareConfig {
    fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }
        if self.account.is_empty() {
            return Err("delivery.fileshare.account is required when upload is enabled"
                .to_string());
        }
        if self.share.is_empty() {
            return Err("delivery.fileshare.share is required when upload is enabled".to_string());
        }
        match &self.sas_token {
            Some(token) if !token.expose_secret().is_empty() => Ok(()),
            _ => Err("delivery.fileshare.sas_token is required when upload is enabled"
                .to_string()),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for local log files
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Log rotation (daily or hourly)
    #[serde(default = "default_log_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path cannot be empty when file logging is enabled"
                .to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_log_rotation(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_base_url() -> String {
    "https://api.powerbi.com".to_string()
}

fn default_authority_host() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_poll_interval_seconds() -> u64 {
    5
}

fn default_max_poll_attempts() -> usize {
    120
}

fn default_filter_table() -> String {
    "scd_Measure".to_string()
}

fn default_filter_column() -> String {
    "Measure_ID".to_string()
}

fn default_pages_file() -> String {
    "pages.json".to_string()
}

fn default_pages_table() -> String {
    "measure_print".to_string()
}

fn default_chunk_size() -> usize {
    5
}

fn default_work_dir() -> String {
    ".".to_string()
}

fn default_mail_subject() -> String {
    "Report ready".to_string()
}

fn default_fileshare_directory() -> String {
    "Reports".to_string()
}

fn default_log_path() -> String {
    "logs".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}
