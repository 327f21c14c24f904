//! Page source trait and factory
//!
//! All page-configuration strategies produce the same thing: an ordered,
//! validated list of `ReportPage` records. The strategy is selected by run
//! configuration, not by divergent loader modules.

use crate::config::{PageSourceKind, PagesConfig};
use crate::core::pages::database::DatabasePageSource;
use crate::core::pages::file::FilePageSource;
use crate::domain::{validate_pages, EaselError, ReportPage, Result};
use async_trait::async_trait;

/// Produces the ordered page list for one run
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Load and validate the page list
    ///
    /// Implementations must return pages already passed through the
    /// domain invariants (non-empty, unique order, sorted by order).
    async fn load(&self) -> Result<Vec<ReportPage>>;
}

/// Create the configured page source
///
/// # Errors
///
/// Returns a configuration error if the selected strategy is missing its
/// settings.
pub fn create_page_source(config: &PagesConfig) -> Result<Box<dyn PageSource>> {
    match config.source {
        PageSourceKind::File => Ok(Box::new(FilePageSource::new(
            &config.file_path,
            config.report_name.clone(),
        ))),
        PageSourceKind::Database => {
            let database = config.database.clone().ok_or_else(|| {
                EaselError::Configuration(
                    "pages.database configuration is required when pages.source = 'database'"
                        .to_string(),
                )
            })?;
            Ok(Box::new(DatabasePageSource::new(
                database,
                config.report_name.clone(),
            )))
        }
    }
}

/// Narrow a loaded page list to one report and run the domain invariants
///
/// With `report_name = None` all pages are kept (the full report). With a
/// display name, only matching pages survive; an empty result means the
/// requested report does not exist in the configuration.
pub(crate) fn select_report(
    pages: Vec<ReportPage>,
    report_name: Option<&str>,
) -> Result<Vec<ReportPage>> {
    let pages = match report_name {
        None => pages,
        Some(name) => {
            let selected: Vec<ReportPage> = pages
                .into_iter()
                .filter(|p| p.display_name == name)
                .collect();
            if selected.is_empty() {
                return Err(EaselError::Configuration(format!(
                    "no page configuration found for report '{name}'"
                )));
            }
            selected
        }
    };

    validate_pages(pages)
}
