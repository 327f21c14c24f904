//! Azure file share upload
//!
//! Thin collaborator over the Azure Files REST API, authorized by a shared
//! access signature. Uploading a file takes two calls: create the file with
//! its declared length, then write the content as a single range.

use crate::config::FileShareConfig;
use crate::domain::{EaselError, Result};
use secrecy::ExposeSecret;
use std::path::Path;

/// Client for uploading the merged report to an Azure file share
pub struct FileShareClient {
    http: reqwest::Client,
    config: FileShareConfig,
    /// Endpoint override for tests; None means the public Azure endpoint
    endpoint: Option<String>,
}

impl FileShareClient {
    /// Create a client from delivery configuration, reusing the caller's
    /// HTTP connection pool
    pub fn new(config: FileShareConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            config,
            endpoint: None,
        }
    }

    /// Point the client at a different endpoint (used by tests)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    fn file_url(&self, remote_name: &str) -> Result<String> {
        let endpoint = match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.file.core.windows.net", self.config.account),
        };
        let sas = self
            .config
            .sas_token
            .as_ref()
            .ok_or_else(|| {
                EaselError::Configuration(
                    "delivery.fileshare.sas_token is required for upload".to_string(),
                )
            })?
            .expose_secret()
            .as_ref()
            .trim_start_matches('?')
            .to_string();

        Ok(format!(
            "{endpoint}/{}/{}/{remote_name}?{sas}",
            self.config.share,
            self.config.directory.trim_matches('/')
        ))
    }

    /// Upload a local file to the configured share directory
    ///
    /// # Errors
    ///
    /// Returns a delivery error for any non-success response from the
    /// storage service.
    pub async fn upload(&self, local_path: &Path, remote_name: &str) -> Result<()> {
        let bytes = tokio::fs::read(local_path).await.map_err(|e| {
            EaselError::Io(format!("Failed to read {}: {e}", local_path.display()))
        })?;
        let url = self.file_url(remote_name)?;

        tracing::info!(
            share = %self.config.share,
            file = %remote_name,
            bytes = bytes.len(),
            "Uploading report to file share"
        );

        // Create the file with its declared length.
        let response = self
            .http
            .put(&url)
            .header("x-ms-type", "file")
            .header("x-ms-content-length", bytes.len().to_string())
            .header("x-ms-version", "2021-06-08")
            .send()
            .await
            .map_err(|e| EaselError::Delivery(format!("file share create failed: {e}")))?;
        ensure_success(response, "file share create").await?;

        if bytes.is_empty() {
            return Ok(());
        }

        // Write the content as one range.
        let range_url = format!("{url}&comp=range");
        let response = self
            .http
            .put(&range_url)
            .header("x-ms-write", "update")
            .header("x-ms-range", format!("bytes=0-{}", bytes.len() - 1))
            .header("x-ms-version", "2021-06-08")
            .body(bytes)
            .send()
            .await
            .map_err(|e| EaselError::Delivery(format!("file share write failed: {e}")))?;
        ensure_success(response, "file share write").await?;

        tracing::info!(file = %remote_name, "Report uploaded to file share");

        Ok(())
    }
}

async fn ensure_success(response: reqwest::Response, operation: &str) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(EaselError::Delivery(format!(
        "{operation} returned {status}: {body}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn share_config() -> FileShareConfig {
        FileShareConfig {
            enabled: true,
            account: "reportsaccount".to_string(),
            share: "reports".to_string(),
            directory: "Reports".to_string(),
            sas_token: Some(secret_string("sv=2021&sig=abc".to_string())),
        }
    }

    #[test]
    fn test_file_url_shape() {
        let client = FileShareClient::new(share_config(), reqwest::Client::new());
        let url = client.file_url("Full Report.pptx").unwrap();
        assert_eq!(
            url,
            "https://reportsaccount.file.core.windows.net/reports/Reports/Full Report.pptx?sv=2021&sig=abc"
        );
    }

    #[test]
    fn test_file_url_strips_leading_question_mark() {
        let mut config = share_config();
        config.sas_token = Some(secret_string("?sv=2021&sig=abc".to_string()));
        let client = FileShareClient::new(config, reqwest::Client::new());
        let url = client.file_url("r.pptx").unwrap();
        assert!(url.ends_with("r.pptx?sv=2021&sig=abc"));
    }

    #[test]
    fn test_file_url_without_sas_is_configuration_error() {
        let mut config = share_config();
        config.sas_token = None;
        let client = FileShareClient::new(config, reqwest::Client::new());
        assert!(client.file_url("r.pptx").is_err());
    }

    #[tokio::test]
    async fn test_upload_issues_create_then_range() {
        let mut server = mockito::Server::new_async().await;

        let create = server
            .mock("PUT", "/reports/Reports/r.pptx?sv=2021&sig=abc")
            .match_header("x-ms-type", "file")
            .with_status(201)
            .create_async()
            .await;
        let range = server
            .mock("PUT", "/reports/Reports/r.pptx?sv=2021&sig=abc&comp=range")
            .match_header("x-ms-write", "update")
            .with_status(201)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("r.pptx");
        std::fs::write(&local, b"deck-bytes").unwrap();

        let client = FileShareClient::new(share_config(), reqwest::Client::new())
            .with_endpoint(server.url());
        client.upload(&local, "r.pptx").await.unwrap();

        create.assert_async().await;
        range.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_error_is_delivery_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock1 = server
            .mock("PUT", "/reports/Reports/r.pptx?sv=2021&sig=abc")
            .with_status(403)
            .with_body("signature mismatch")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("r.pptx");
        std::fs::write(&local, b"deck-bytes").unwrap();

        let client = FileShareClient::new(share_config(), reqwest::Client::new())
            .with_endpoint(server.url());
        let result = client.upload(&local, "r.pptx").await;

        match result {
            Err(EaselError::Delivery(message)) => assert!(message.contains("signature mismatch")),
            other => panic!("expected delivery error, got {other:?}"),
        }
    }
}
