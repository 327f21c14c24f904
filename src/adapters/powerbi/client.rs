//! Power BI export client
//!
//! Drives the asynchronous page-export workflow against the Power BI REST
//! API: submit an `ExportTo` job for one page, poll its status until
//! terminal, then download the rendered single-page deck. The poll loop is
//! bounded; a job that never reaches a terminal state inside the budget is
//! a poll-timeout error rather than an unbounded block.
//!
//! Failure semantics per page: a vendor-reported job failure, any
//! non-success HTTP status, and an exhausted poll budget all abort only
//! that page's export. No destination file exists on any failure path.

use crate::adapters::powerbi::auth::AccessToken;
use crate::adapters::powerbi::models::{
    ExportRequest, ExportState, ExportStatusResponse, ExportSubmitResponse, PageInfo,
    PagesResponse,
};
use crate::config::PowerBiConfig;
use crate::domain::{EaselError, PowerBiError, ReportPage, Result};
use reqwest::{Response, StatusCode};
use std::path::Path;
use std::time::Duration;

/// Client for the Power BI export API
pub struct PowerBiClient {
    /// HTTP client; shared connection pool across all concurrent exports
    http: reqwest::Client,

    /// Service configuration (report identity, endpoints, poll settings)
    config: PowerBiConfig,
}

impl PowerBiClient {
    /// Create a new client from the service configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(config: PowerBiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                EaselError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self { http, config })
    }

    /// The shared HTTP client, for collaborators that should reuse the pool
    pub fn http(&self) -> reqwest::Client {
        self.http.clone()
    }

    /// URL of the configured report resource
    fn report_url(&self) -> String {
        format!(
            "{}/v1.0/myorg/groups/{}/reports/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.workspace_id,
            self.config.report_id
        )
    }

    /// Build the report-level filter expression for a page
    ///
    /// Pages without a measure id export unfiltered. When a comparative
    /// measure id is present the filter still narrows by the measure id
    /// alone.
    // TODO: confirm with the report owners whether comparative_measure_id
    // should contribute a second `in` predicate; until then it is carried
    // but unused.
    pub fn measure_filter(&self, page: &ReportPage) -> Option<String> {
        page.measure_id.as_ref().map(|measure| {
            format!(
                "{}/{} in ('{}')",
                self.config.filter_table,
                self.config.filter_column,
                measure.as_str()
            )
        })
    }

    /// List the pages of the configured report
    ///
    /// # Errors
    ///
    /// Returns a connection error if the service is unreachable and a
    /// client/server error for any non-success status.
    pub async fn list_pages(&self, token: &AccessToken) -> Result<Vec<PageInfo>> {
        let url = format!("{}/pages", self.report_url());

        let response = self
            .http
            .get(&url)
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| PowerBiError::ConnectionFailed(e.to_string()))?;

        let response = into_success(response).await?;
        let pages: PagesResponse = response
            .json()
            .await
            .map_err(|e| PowerBiError::InvalidResponse(format!("pages response: {e}")))?;

        tracing::info!(count = pages.value.len(), "Fetched report page list");

        Ok(pages.value)
    }

    /// Export one page to a PPTX file at `dest`
    ///
    /// Submits the export job, polls until terminal, downloads the result
    /// and writes it in one operation. Exactly one file is written on
    /// success; nothing is written on failure.
    pub async fn export_page(
        &self,
        token: &AccessToken,
        page: &ReportPage,
        dest: &Path,
    ) -> Result<()> {
        let export_id = self.submit_export(token, page).await?;
        let resource_location = self.poll_export(token, page, &export_id).await?;
        self.download(token, page, &resource_location, dest).await?;

        tracing::info!(
            page = %page.page_name,
            display_name = %page.display_name,
            file = %dest.display(),
            "Page export complete"
        );

        Ok(())
    }

    /// Submit an export job for one page, returning the job id
    async fn submit_export(&self, token: &AccessToken, page: &ReportPage) -> Result<String> {
        let url = format!("{}/ExportTo", self.report_url());
        let request = ExportRequest::single_page(&page.page_name, self.measure_filter(page));

        tracing::debug!(
            page = %page.page_name,
            filtered = request.configuration.report_level_filters.is_some(),
            "Submitting page export"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(token.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| PowerBiError::ConnectionFailed(e.to_string()))?;

        let response = into_success(response).await?;
        if response.status() != StatusCode::ACCEPTED {
            return Err(PowerBiError::InvalidResponse(format!(
                "expected 202 Accepted for export submission, got {}",
                response.status()
            ))
            .into());
        }

        let submit: ExportSubmitResponse = response
            .json()
            .await
            .map_err(|e| PowerBiError::InvalidResponse(format!("export submission: {e}")))?;

        Ok(submit.id)
    }

    /// Poll an export job until it succeeds, fails, or the budget runs out
    ///
    /// Returns the resource location of the rendered file on success.
    async fn poll_export(
        &self,
        token: &AccessToken,
        page: &ReportPage,
        export_id: &str,
    ) -> Result<String> {
        let status_url = format!("{}/exports/{}", self.report_url(), export_id);
        let interval = Duration::from_secs(self.config.poll_interval_seconds);

        for attempt in 1..=self.config.max_poll_attempts {
            let response = self
                .http
                .get(&status_url)
                .bearer_auth(token.as_str())
                .send()
                .await
                .map_err(|e| PowerBiError::ConnectionFailed(e.to_string()))?;

            let response = into_success(response).await?;
            let status: ExportStatusResponse = response
                .json()
                .await
                .map_err(|e| PowerBiError::InvalidResponse(format!("export status: {e}")))?;

            match status.status {
                ExportState::Succeeded => {
                    return status.resource_location.ok_or_else(|| {
                        PowerBiError::InvalidResponse(
                            "succeeded export carries no resourceLocation".to_string(),
                        )
                        .into()
                    });
                }
                ExportState::Failed => {
                    let message = status
                        .error
                        .and_then(|e| e.message)
                        .unwrap_or_else(|| "no failure detail provided".to_string());
                    return Err(PowerBiError::ExportFailed {
                        page: page.page_name.clone(),
                        message,
                    }
                    .into());
                }
                state => {
                    tracing::debug!(
                        page = %page.page_name,
                        state = ?state,
                        percent = status.percent_complete,
                        attempt,
                        "Export still running"
                    );
                    tokio::time::sleep(interval).await;
                }
            }
        }

        Err(PowerBiError::PollTimeout {
            page: page.page_name.clone(),
            attempts: self.config.max_poll_attempts,
        }
        .into())
    }

    /// Download the rendered file and write it to `dest`
    async fn download(
        &self,
        token: &AccessToken,
        page: &ReportPage,
        resource_location: &str,
        dest: &Path,
    ) -> Result<()> {
        let response = self
            .http
            .get(resource_location)
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| PowerBiError::ConnectionFailed(e.to_string()))?;

        let response = into_success(response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PowerBiError::InvalidResponse(format!("export download: {e}")))?;

        tokio::fs::write(dest, &bytes).await.map_err(|e| {
            EaselError::Io(format!("Failed to write {}: {e}", dest.display()))
        })?;

        tracing::debug!(
            page = %page.page_name,
            bytes = bytes.len(),
            "Downloaded exported page"
        );

        Ok(())
    }
}

/// Map a non-success HTTP response into a domain error
async fn into_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    let err = if status.is_server_error() {
        PowerBiError::ServerError {
            status: status.as_u16(),
            message,
        }
    } else {
        PowerBiError::ClientError {
            status: status.as_u16(),
            message,
        }
    };
    Err(err.into())
}
