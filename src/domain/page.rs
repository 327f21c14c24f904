//! Report page records
//!
//! A `ReportPage` describes one exportable page of the configured report:
//! its internal service name, the human-facing display name, its position
//! in the merged output, and an optional measure filter. Page lists come
//! from a page source (JSON file or database) and are validated as a whole
//! before any export starts.

use crate::domain::ids::MeasureId;
use crate::domain::{EaselError, Result};
use serde::{Deserialize, Serialize};

/// One page of the report to export
///
/// Serialized with the historical camelCase field names so existing JSON
/// page files keep working unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPage {
    /// Internal page name used by the export API (e.g. "ReportSection1")
    pub page_name: String,

    /// Human-facing page name used for report selection and logging
    pub display_name: String,

    /// Position of this page in the merged output; unique within one run
    pub page_order: u32,

    /// Optional measure filter applied to this page's export
    #[serde(default)]
    pub measure_id: Option<MeasureId>,

    /// Optional comparative measure; carried but not yet part of the
    /// export filter (see the measure_filter docs in the Power BI client)
    #[serde(default)]
    pub comparative_measure_id: Option<String>,
}

impl ReportPage {
    /// File name for this page's exported deck inside the run directory.
    ///
    /// Zero-padding the order number makes lexicographic file order equal
    /// page order, which is what the merger sorts by.
    pub fn export_file_name(&self) -> String {
        format!("Page {:02}.pptx", self.page_order)
    }
}

/// Validates an ordered page list before any network call
///
/// Checks the list-level invariants that individual record parsing cannot
/// see: the list must be non-empty and page orders must be unique. Returns
/// the pages sorted by `page_order` so callers always observe them in
/// output order regardless of source ordering.
///
/// # Errors
///
/// Returns a configuration error on an empty list or a duplicated order.
pub fn validate_pages(mut pages: Vec<ReportPage>) -> Result<Vec<ReportPage>> {
    if pages.is_empty() {
        return Err(EaselError::Configuration(
            "page configuration is empty; nothing to export".to_string(),
        ));
    }

    pages.sort_by_key(|p| p.page_order);

    for pair in pages.windows(2) {
        if pair[0].page_order == pair[1].page_order {
            return Err(EaselError::Configuration(format!(
                "duplicate page order {} ('{}' and '{}')",
                pair[0].page_order, pair[0].display_name, pair[1].display_name
            )));
        }
    }

    Ok(pages)
}
