//! Database page source
//!
//! Loads the page list from a PostgreSQL configuration table. One query
//! per run; the connection is opened, drained, and dropped.

use crate::config::PagesDatabaseConfig;
use crate::core::pages::source::{select_report, PageSource};
use crate::domain::{EaselError, MeasureId, ReportPage, Result};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use tokio_postgres::{NoTls, Row};

/// Page source backed by a PostgreSQL configuration table
pub struct DatabasePageSource {
    config: PagesDatabaseConfig,
    report_name: Option<String>,
}

impl DatabasePageSource {
    /// Create a database source for the given settings and report selector
    pub fn new(config: PagesDatabaseConfig, report_name: Option<String>) -> Self {
        Self {
            config,
            report_name,
        }
    }

    /// The page query for this source's table
    ///
    /// The table name is validated as a plain identifier at configuration
    /// load; the report selector is always bound as a parameter.
    fn query(table: &str, filtered: bool) -> String {
        let mut query = format!(
            "SELECT page_name, display_name, page_order, measure_id, comparative_measure_id \
             FROM {table}"
        );
        if filtered {
            query.push_str(" WHERE display_name = $1");
        }
        query.push_str(" ORDER BY page_order");
        query
    }
}

#[async_trait]
impl PageSource for DatabasePageSource {
    async fn load(&self) -> Result<Vec<ReportPage>> {
        let (client, connection) =
            tokio_postgres::connect(self.config.connection_string.expose_secret().as_ref(), NoTls)
                .await
                .map_err(|e| {
                    EaselError::Database(format!("Failed to connect to page database: {e}"))
                })?;

        // The connection task drives the socket; it ends when the client drops.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "Page database connection error");
            }
        });

        let query = Self::query(&self.config.table, self.report_name.is_some());
        let rows = match &self.report_name {
            Some(name) => client.query(query.as_str(), &[name]).await,
            None => client.query(query.as_str(), &[]).await,
        }
        .map_err(|e| EaselError::Database(format!("Page query failed: {e}")))?;

        tracing::debug!(
            table = %self.config.table,
            count = rows.len(),
            "Loaded page configuration rows"
        );

        let pages = rows
            .iter()
            .map(row_to_page)
            .collect::<Result<Vec<ReportPage>>>()?;

        // The WHERE clause already narrowed the rows; select_report then
        // only runs the shared invariants (including the empty-set check).
        select_report(pages, self.report_name.as_deref())
    }
}

/// Convert one configuration row into a validated page record
fn row_to_page(row: &Row) -> Result<ReportPage> {
    let page_name: String = get_column(row, "page_name")?;
    let display_name: String = get_column(row, "display_name")?;
    let page_order: i32 = get_column(row, "page_order")?;
    let measure_id: Option<String> = get_column(row, "measure_id")?;
    let comparative_measure_id: Option<String> = get_column(row, "comparative_measure_id")?;

    let page_order = u32::try_from(page_order).map_err(|_| {
        EaselError::Configuration(format!(
            "page '{display_name}' has negative page_order {page_order}"
        ))
    })?;

    let measure_id = measure_id
        .map(MeasureId::new)
        .transpose()
        .map_err(EaselError::Configuration)?;

    Ok(ReportPage {
        page_name,
        display_name,
        page_order,
        measure_id,
        comparative_measure_id,
    })
}

fn get_column<'a, T: tokio_postgres::types::FromSql<'a>>(row: &'a Row, name: &str) -> Result<T> {
    row.try_get(name)
        .map_err(|e| EaselError::Database(format!("Bad page configuration row: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_unfiltered() {
        assert_eq!(
            DatabasePageSource::query("scd.measure_print", false),
            "SELECT page_name, display_name, page_order, measure_id, comparative_measure_id \
             FROM scd.measure_print ORDER BY page_order"
        );
    }

    #[test]
    fn test_query_filtered() {
        assert_eq!(
            DatabasePageSource::query("measure_print", true),
            "SELECT page_name, display_name, page_order, measure_id, comparative_measure_id \
             FROM measure_print WHERE display_name = $1 ORDER BY page_order"
        );
    }
}
