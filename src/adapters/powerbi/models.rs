//! Power BI wire types
//!
//! Request and response bodies for the export API. Only the fields this
//! crate consumes are modeled; the service sends more.

use serde::{Deserialize, Serialize};

/// Body of an `ExportTo` request for a single page
#[derive(Debug, Clone, Serialize)]
pub struct ExportRequest {
    /// Output format; always "PPTX" here
    pub format: String,

    #[serde(rename = "powerBIReportConfiguration")]
    pub configuration: ReportConfiguration,
}

impl ExportRequest {
    /// Export exactly one named page, optionally narrowed by a
    /// report-level filter.
    pub fn single_page(page_name: impl Into<String>, filter: Option<String>) -> Self {
        Self {
            format: "PPTX".to_string(),
            configuration: ReportConfiguration {
                pages: vec![ExportPage {
                    page_name: page_name.into(),
                }],
                report_level_filters: filter.map(|f| vec![ExportFilter { filter: f }]),
            },
        }
    }
}

/// Report-level export configuration
#[derive(Debug, Clone, Serialize)]
pub struct ReportConfiguration {
    pub pages: Vec<ExportPage>,

    #[serde(rename = "reportLevelFilters", skip_serializing_if = "Option::is_none")]
    pub report_level_filters: Option<Vec<ExportFilter>>,
}

/// One page selector inside an export request
#[derive(Debug, Clone, Serialize)]
pub struct ExportPage {
    #[serde(rename = "pageName")]
    pub page_name: String,
}

/// One report-level filter expression
#[derive(Debug, Clone, Serialize)]
pub struct ExportFilter {
    pub filter: String,
}

/// Response to a successfully accepted export submission
#[derive(Debug, Clone, Deserialize)]
pub struct ExportSubmitResponse {
    /// Export job id, polled until terminal
    pub id: String,
}

/// Lifecycle of an export job
///
/// The service reports a handful of non-terminal states; everything the
/// client doesn't recognize maps to `Other` and keeps the poll loop going,
/// exactly like an unknown in-progress state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    Other,
}

impl<'de> serde::Deserialize<'de> for ExportState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "NotStarted" => ExportState::NotStarted,
            "Running" => ExportState::Running,
            "Succeeded" => ExportState::Succeeded,
            "Failed" => ExportState::Failed,
            _ => ExportState::Other,
        })
    }
}

impl ExportState {
    /// Whether the job has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExportState::Succeeded | ExportState::Failed)
    }
}

/// Response to an export status poll
#[derive(Debug, Clone, Deserialize)]
pub struct ExportStatusResponse {
    pub status: ExportState,

    #[serde(rename = "resourceLocation")]
    pub resource_location: Option<String>,

    #[serde(rename = "percentComplete")]
    pub percent_complete: Option<u8>,

    pub error: Option<ServiceError>,
}

/// Error payload attached to a failed export job
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceError {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Response of the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Response of the report pages listing
#[derive(Debug, Clone, Deserialize)]
pub struct PagesResponse {
    pub value: Vec<PageInfo>,
}

/// One page as reported by the service
#[derive(Debug, Clone, Deserialize)]
pub struct PageInfo {
    /// Internal page name (the export selector)
    pub name: String,

    #[serde(rename = "displayName")]
    pub display_name: String,

    /// Position of the page inside the report
    pub order: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_request_with_filter() {
        let request = ExportRequest::single_page(
            "ReportSection1",
            Some("scd_Measure/Measure_ID in ('BR007')".to_string()),
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["format"], "PPTX");
        assert_eq!(
            json["powerBIReportConfiguration"]["pages"][0]["pageName"],
            "ReportSection1"
        );
        assert_eq!(
            json["powerBIReportConfiguration"]["reportLevelFilters"][0]["filter"],
            "scd_Measure/Measure_ID in ('BR007')"
        );
    }

    #[test]
    fn test_export_request_without_filter_omits_key() {
        let request = ExportRequest::single_page("ReportSection2", None);
        let json = serde_json::to_value(&request).unwrap();

        assert!(json["powerBIReportConfiguration"]
            .get("reportLevelFilters")
            .is_none());
    }

    #[test]
    fn test_export_state_deserialization() {
        let state: ExportState = serde_json::from_str("\"Succeeded\"").unwrap();
        assert_eq!(state, ExportState::Succeeded);
        assert!(state.is_terminal());

        let state: ExportState = serde_json::from_str("\"Running\"").unwrap();
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_export_state_unknown_maps_to_other() {
        let state: ExportState = serde_json::from_str("\"Paused\"").unwrap();
        assert_eq!(state, ExportState::Other);
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_status_response_deserialization() {
        let json = r#"{
            "status": "Succeeded",
            "resourceLocation": "https://api.powerbi.com/exports/abc/file",
            "percentComplete": 100
        }"#;
        let response: ExportStatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, ExportState::Succeeded);
        assert!(response.resource_location.is_some());
        assert!(response.error.is_none());
    }

    #[test]
    fn test_pages_response_deserialization() {
        let json = r#"{"value":[{"name":"ReportSection1","displayName":"Overview","order":0}]}"#;
        let response: PagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.value.len(), 1);
        assert_eq!(response.value[0].display_name, "Overview");
    }
}
