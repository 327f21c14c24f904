//! Run coordinator - main orchestrator for one report run
//!
//! Drives the whole pipeline: load and validate the page list, acquire an
//! access token, create the run directory, export every page chunk by
//! chunk, merge the per-page decks into one presentation, and hand the
//! result to the delivery collaborators.

use crate::adapters::fileshare::FileShareClient;
use crate::adapters::mail::Mailer;
use crate::adapters::powerbi::{
    AccessToken, PowerBiClient, TokenProvider, GRAPH_SCOPE, POWERBI_SCOPE,
};
use crate::config::{EaselConfig, FailurePolicy};
use crate::core::export::batch::chunk_plan;
use crate::core::export::summary::{RunError, RunErrorType, RunSummary};
use crate::core::merge::merge_presentations;
use crate::core::pages::{create_page_source, PageSource};
use crate::domain::{EaselError, ReportPage, Result};
use futures::future::join_all;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use std::path::Path;
use std::time::Instant;

/// Run coordinator
pub struct RunCoordinator {
    config: EaselConfig,
    client: PowerBiClient,
    tokens: TokenProvider,
    page_source: Box<dyn PageSource>,
}

impl RunCoordinator {
    /// Create a new run coordinator from validated configuration
    pub fn new(config: EaselConfig) -> Result<Self> {
        let client = PowerBiClient::new(config.powerbi.clone())?;
        let tokens = TokenProvider::new(&config.powerbi, client.http());
        let page_source = create_page_source(&config.pages)?;

        Ok(Self {
            config,
            client,
            tokens,
            page_source,
        })
    }

    /// Execute one report run
    ///
    /// 1. Load and validate pages (fails fast, before any network call)
    /// 2. Acquire an access token (fatal on failure)
    /// 3. Create the run-scoped scratch directory
    /// 4. Export all pages, chunk by chunk
    /// 5. Merge the per-page files into the output deck
    /// 6. Upload and/or notify when delivery is enabled
    ///
    /// The run directory is left in place for the caller to inspect or
    /// clean up; the coordinator never deletes it.
    pub async fn execute_run(&self) -> Result<RunSummary> {
        let start = Instant::now();
        let run_id = generate_run_id();
        let mut summary = RunSummary::new(&run_id);

        tracing::info!(run_id = %run_id, "Starting report run");

        let pages = self.page_source.load().await?;
        summary.total_pages = pages.len();

        let token = self.tokens.fetch(POWERBI_SCOPE).await?;

        let run_dir = Path::new(&self.config.export.work_dir).join(&run_id);
        tokio::fs::create_dir_all(&run_dir).await.map_err(|e| {
            EaselError::Io(format!(
                "Failed to create run directory {}: {e}",
                run_dir.display()
            ))
        })?;
        tracing::info!(dir = %run_dir.display(), "Created run directory");

        self.export_pages(&pages, &token, &run_dir, &mut summary)
            .await?;

        if summary.exported_pages == 0 {
            return Err(EaselError::Export(
                "no pages were exported; nothing to merge".to_string(),
            ));
        }

        let output_path = run_dir.join(self.output_file_name());
        let merge_report = merge_presentations(&run_dir, &output_path)?;
        summary.merged_slides = merge_report.slides_merged;
        summary.output_path = Some(output_path.clone());

        self.deliver(&output_path).await?;

        let summary = summary.with_duration(start.elapsed());
        summary.log_summary();

        Ok(summary)
    }

    /// Export every page, chunk by chunk
    ///
    /// Exports inside one chunk run concurrently over the shared
    /// connection pool; the chunk is awaited as a whole before the next
    /// one starts, so a failure never cancels in-flight siblings. Under
    /// the `abort` policy the first failed chunk ends the run; under
    /// `skip` failures are recorded and remaining chunks proceed.
    async fn export_pages(
        &self,
        pages: &[ReportPage],
        token: &AccessToken,
        run_dir: &Path,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let plan = chunk_plan(pages.len(), self.config.export.chunk_size);
        tracing::info!(
            pages = pages.len(),
            chunks = plan.len(),
            chunk_size = self.config.export.chunk_size.min(pages.len()),
            "Export plan ready"
        );

        for (index, range) in plan.iter().enumerate() {
            let chunk = &pages[range.clone()];
            tracing::debug!(chunk = index + 1, size = chunk.len(), "Starting export chunk");

            let exports = chunk.iter().map(|page| {
                let dest = run_dir.join(page.export_file_name());
                let client = &self.client;
                async move { (page, client.export_page(token, page, &dest).await) }
            });
            let results = join_all(exports).await;

            let mut chunk_failure: Option<EaselError> = None;
            for (page, result) in results {
                match result {
                    Ok(()) => summary.exported_pages += 1,
                    Err(e) => {
                        summary.failed_pages += 1;
                        tracing::error!(
                            page = %page.page_name,
                            display_name = %page.display_name,
                            error = %e,
                            "Page export failed"
                        );
                        summary.add_error(
                            RunError::new(RunErrorType::Export, e.to_string())
                                .with_context(format!("page={}", page.page_name)),
                        );
                        if chunk_failure.is_none() {
                            chunk_failure = Some(e);
                        }
                    }
                }
            }

            if let Some(error) = chunk_failure {
                if self.config.export.on_page_failure == FailurePolicy::Abort {
                    return Err(error);
                }
                tracing::warn!(
                    chunk = index + 1,
                    "Continuing past failed page(s) per failure policy"
                );
            }
        }

        Ok(())
    }

    /// Name of the merged output file
    ///
    /// Derived from the report selector unless overridden; non-production
    /// environments get the `DEV_` prefix.
    fn output_file_name(&self) -> String {
        if let Some(name) = &self.config.export.output_name {
            return name.clone();
        }
        format!(
            "{}{}.pptx",
            self.config.environment.output_prefix(),
            self.report_label()
        )
    }

    /// Human-facing name of what this run produced
    fn report_label(&self) -> &str {
        self.config
            .pages
            .report_name
            .as_deref()
            .unwrap_or("Full Report")
    }

    /// Hand the merged deck to the enabled delivery collaborators
    async fn deliver(&self, output_path: &Path) -> Result<()> {
        let file_name = output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report.pptx".to_string());

        if self.config.delivery.fileshare.enabled {
            let fileshare = FileShareClient::new(
                self.config.delivery.fileshare.clone(),
                self.client.http(),
            );
            fileshare.upload(output_path, &file_name).await?;
        }

        if self.config.delivery.email.enabled {
            let token = self.tokens.fetch(GRAPH_SCOPE).await?;
            let mailer = Mailer::new(self.config.delivery.email.clone(), self.client.http());
            let attachment = self
                .config
                .delivery
                .email
                .attach_report
                .then_some(output_path);
            mailer
                .send_report_notification(&token, self.report_label(), attachment)
                .await?;
        }

        Ok(())
    }
}

/// Generate the random identifier naming one run's scratch directory
fn generate_run_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect()
}
