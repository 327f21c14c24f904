//! Static JSON page source
//!
//! Loads the page list from a JSON file: an array of camelCase page
//! records, the historical static configuration format.

use crate::core::pages::source::{select_report, PageSource};
use crate::domain::{EaselError, ReportPage, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Page source backed by a JSON file
pub struct FilePageSource {
    path: PathBuf,
    report_name: Option<String>,
}

impl FilePageSource {
    /// Create a file source for the given path and optional report selector
    pub fn new(path: impl Into<PathBuf>, report_name: Option<String>) -> Self {
        Self {
            path: path.into(),
            report_name,
        }
    }
}

#[async_trait]
impl PageSource for FilePageSource {
    async fn load(&self) -> Result<Vec<ReportPage>> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            EaselError::Configuration(format!(
                "Failed to read page file {}: {e}",
                self.path.display()
            ))
        })?;

        let pages: Vec<ReportPage> = serde_json::from_str(&contents).map_err(|e| {
            EaselError::Configuration(format!(
                "Invalid page file {}: {e}",
                self.path.display()
            ))
        })?;

        tracing::debug!(
            path = %self.path.display(),
            count = pages.len(),
            "Loaded page configuration file"
        );

        select_report(pages, self.report_name.as_deref())
    }
}
