//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables should be run with
//! --test-threads=1 to avoid interference between tests.

use easel::config::{load_config, FailurePolicy, PageSourceKind};
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let file = write_config(
        r#"
environment = "production"

[application]
log_level = "debug"

[powerbi]
tenant_id = "11111111-1111-1111-1111-111111111111"
client_id = "22222222-2222-2222-2222-222222222222"
client_secret = "sp-secret"
workspace_id = "33333333-3333-3333-3333-333333333333"
report_id = "44444444-4444-4444-4444-444444444444"
poll_interval_seconds = 2
max_poll_attempts = 30
filter_table = "scd_Measure"
filter_column = "Measure_ID"

[pages]
source = "file"
file_path = "config/pages.json"
report_name = "Full Report"

[export]
chunk_size = 10
work_dir = "/tmp/easel"
on_page_failure = "skip"

[delivery.fileshare]
enabled = true
account = "reportsaccount"
share = "reports"
directory = "Reports"
sas_token = "sv=2021&sig=abc"

[delivery.email]
enabled = true
sender = "reports@example.org"
recipients = ["one@example.org", "two@example.org"]
subject = "Weekly report"
attach_report = true

[logging]
local_enabled = true
local_path = "/tmp/easel/logs"
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(
        config.powerbi.tenant_id,
        "11111111-1111-1111-1111-111111111111"
    );
    assert_eq!(
        config.powerbi.client_secret.expose_secret().as_ref(),
        "sp-secret"
    );
    assert_eq!(config.powerbi.poll_interval_seconds, 2);
    assert_eq!(config.powerbi.max_poll_attempts, 30);

    assert_eq!(config.pages.source, PageSourceKind::File);
    assert_eq!(config.pages.file_path, "config/pages.json");
    assert_eq!(config.pages.report_name.as_deref(), Some("Full Report"));

    assert_eq!(config.export.chunk_size, 10);
    assert_eq!(config.export.on_page_failure, FailurePolicy::Skip);

    assert!(config.delivery.fileshare.enabled);
    assert_eq!(config.delivery.fileshare.account, "reportsaccount");
    assert!(config.delivery.email.enabled);
    assert_eq!(config.delivery.email.recipients.len(), 2);
    assert!(config.delivery.email.attach_report);

    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_load_minimal_config_applies_defaults() {
    let file = write_config(
        r#"
[powerbi]
tenant_id = "t"
client_id = "c"
client_secret = "s"
workspace_id = "w"
report_id = "r"
"#,
    );

    let config = load_config(file.path()).expect("Failed to load config");

    assert_eq!(config.powerbi.api_base_url, "https://api.powerbi.com");
    assert_eq!(
        config.powerbi.authority_host,
        "https://login.microsoftonline.com"
    );
    assert_eq!(config.powerbi.poll_interval_seconds, 5);
    assert_eq!(config.powerbi.max_poll_attempts, 120);
    assert_eq!(config.powerbi.filter_table, "scd_Measure");
    assert_eq!(config.powerbi.filter_column, "Measure_ID");

    assert_eq!(config.pages.source, PageSourceKind::File);
    assert_eq!(config.pages.file_path, "pages.json");
    assert_eq!(config.export.chunk_size, 5);
    assert_eq!(config.export.on_page_failure, FailurePolicy::Abort);
    assert!(!config.delivery.fileshare.enabled);
    assert!(!config.delivery.email.enabled);
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    std::env::set_var("EASEL_IT_SECRET", "from-env");

    let file = write_config(
        r#"
[powerbi]
tenant_id = "t"
client_id = "c"
client_secret = "${EASEL_IT_SECRET}"
workspace_id = "w"
report_id = "r"
"#,
    );

    let config = load_config(file.path()).expect("Failed to load config");
    assert_eq!(
        config.powerbi.client_secret.expose_secret().as_ref(),
        "from-env"
    );

    std::env::remove_var("EASEL_IT_SECRET");
}

#[test]
fn test_env_override_chunk_size() {
    let _lock = ENV_MUTEX.lock().unwrap();
    std::env::set_var("EASEL_EXPORT_CHUNK_SIZE", "12");

    let file = write_config(
        r#"
[powerbi]
tenant_id = "t"
client_id = "c"
client_secret = "s"
workspace_id = "w"
report_id = "r"

[export]
chunk_size = 3
"#,
    );

    let config = load_config(file.path()).expect("Failed to load config");
    assert_eq!(config.export.chunk_size, 12);

    std::env::remove_var("EASEL_EXPORT_CHUNK_SIZE");
}

#[test]
fn test_database_source_requires_section() {
    let file = write_config(
        r#"
[powerbi]
tenant_id = "t"
client_id = "c"
client_secret = "s"
workspace_id = "w"
report_id = "r"

[pages]
source = "database"
"#,
    );

    assert!(load_config(file.path()).is_err());
}

#[test]
fn test_enabled_fileshare_requires_sas() {
    let file = write_config(
        r#"
[powerbi]
tenant_id = "t"
client_id = "c"
client_secret = "s"
workspace_id = "w"
report_id = "r"

[delivery.fileshare]
enabled = true
account = "acct"
share = "reports"
"#,
    );

    assert!(load_config(file.path()).is_err());
}

#[test]
fn test_invalid_environment_rejected() {
    let file = write_config(
        r#"
environment = "qa"

[powerbi]
tenant_id = "t"
client_id = "c"
client_secret = "s"
workspace_id = "w"
report_id = "r"
"#,
    );

    assert!(load_config(file.path()).is_err());
}
