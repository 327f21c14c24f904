//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{EaselConfig, PageSourceKind};
use super::secret::secret_string;
use crate::domain::errors::EaselError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into EaselConfig
/// 4. Applies environment variable overrides (EASEL_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use easel::config::loader::load_config;
///
/// let config = load_config("easel.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<EaselConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(EaselError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        EaselError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    // Perform environment variable substitution
    let contents = substitute_env_vars(&contents)?;

    // Parse TOML
    let mut config: EaselConfig = toml::from_str(&contents)
        .map_err(|e| EaselError::Configuration(format!("Failed to parse TOML: {e}")))?;

    // Apply environment variable overrides
    apply_env_overrides(&mut config);

    // Validate configuration
    config
        .validate()
        .map_err(|e| EaselError::Configuration(format!("Configuration validation failed: {e}")))?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("substitution pattern is valid");
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    // Process line by line to skip comments
    for line in input.lines() {
        let trimmed = line.trim_start();

        // Don't substitute inside comments
        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(EaselError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the EASEL_* prefix
///
/// Environment variables follow the pattern: EASEL_<SECTION>_<KEY>
/// For example: EASEL_POWERBI_WORKSPACE_ID, EASEL_EXPORT_CHUNK_SIZE
fn apply_env_overrides(config: &mut EaselConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("EASEL_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Power BI overrides
    if let Ok(val) = std::env::var("EASEL_POWERBI_TENANT_ID") {
        config.powerbi.tenant_id = val;
    }
    if let Ok(val) = std::env::var("EASEL_POWERBI_CLIENT_ID") {
        config.powerbi.client_id = val;
    }
    if let Ok(val) = std::env::var("EASEL_POWERBI_CLIENT_SECRET") {
        config.powerbi.client_secret = secret_string(val);
    }
    if let Ok(val) = std::env::var("EASEL_POWERBI_WORKSPACE_ID") {
        config.powerbi.workspace_id = val;
    }
    if let Ok(val) = std::env::var("EASEL_POWERBI_REPORT_ID") {
        config.powerbi.report_id = val;
    }
    if let Ok(val) = std::env::var("EASEL_POWERBI_API_BASE_URL") {
        config.powerbi.api_base_url = val;
    }
    if let Ok(val) = std::env::var("EASEL_POWERBI_POLL_INTERVAL_SECONDS") {
        if let Ok(interval) = val.parse() {
            config.powerbi.poll_interval_seconds = interval;
        }
    }
    if let Ok(val) = std::env::var("EASEL_POWERBI_MAX_POLL_ATTEMPTS") {
        if let Ok(attempts) = val.parse() {
            config.powerbi.max_poll_attempts = attempts;
        }
    }

    // Pages overrides
    if let Ok(val) = std::env::var("EASEL_PAGES_SOURCE") {
        match val.to_lowercase().as_str() {
            "file" => config.pages.source = PageSourceKind::File,
            "database" => config.pages.source = PageSourceKind::Database,
            other => {
                tracing::warn!(source = %other, "Ignoring unknown EASEL_PAGES_SOURCE override")
            }
        }
    }
    if let Ok(val) = std::env::var("EASEL_PAGES_FILE_PATH") {
        config.pages.file_path = val;
    }
    if let Ok(val) = std::env::var("EASEL_PAGES_REPORT_NAME") {
        config.pages.report_name = Some(val);
    }

    // Export overrides
    if let Ok(val) = std::env::var("EASEL_EXPORT_CHUNK_SIZE") {
        if let Ok(size) = val.parse() {
            config.export.chunk_size = size;
        }
    }
    if let Ok(val) = std::env::var("EASEL_EXPORT_WORK_DIR") {
        config.export.work_dir = val;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("EASEL_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("EASEL_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL_TOML: &str = r#"
[powerbi]
tenant_id = "tenant-1"
client_id = "client-1"
client_secret = "secret-1"
workspace_id = "ws-1"
report_id = "rpt-1"
"#;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("EASEL_TEST_SUBST_VAR", "test_value");
        let input = "client_secret = \"${EASEL_TEST_SUBST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "client_secret = \"test_value\"\n");
        std::env::remove_var("EASEL_TEST_SUBST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("EASEL_TEST_MISSING_VAR");
        let input = "client_secret = \"${EASEL_TEST_MISSING_VAR}\"";
        let result = substitute_env_vars(input);
        assert!(result.is_err());
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        std::env::remove_var("EASEL_TEST_COMMENTED_VAR");
        let input = "# client_secret = \"${EASEL_TEST_COMMENTED_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${EASEL_TEST_COMMENTED_VAR}"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_minimal() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL_TOML.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.powerbi.tenant_id, "tenant-1");
        assert_eq!(config.powerbi.api_base_url, "https://api.powerbi.com");
        assert_eq!(config.export.chunk_size, 5);
        assert_eq!(config.powerbi.poll_interval_seconds, 5);
    }

    #[test]
    fn test_load_config_invalid_chunk_size() {
        let toml = format!("{MINIMAL_TOML}\n[export]\nchunk_size = 0\n");
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }
}
