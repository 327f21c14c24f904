//! Run summary and reporting
//!
//! This module defines structures for tracking and reporting the outcome
//! of one report run.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

/// Type of run error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunErrorType {
    /// Page configuration error
    Configuration,
    /// Token acquisition error
    Authentication,
    /// Page export error
    Export,
    /// Presentation merge error
    Merge,
    /// Upload or notification error
    Delivery,
    /// Unknown error
    Unknown,
}

/// Run error with context
#[derive(Debug, Clone)]
pub struct RunError {
    /// Type of error
    pub error_type: RunErrorType,

    /// Error message
    pub message: String,

    /// Optional context (e.g. page name)
    pub context: Option<String>,
}

impl RunError {
    /// Create a new run error
    pub fn new(error_type: RunErrorType, message: impl Into<String>) -> Self {
        Self {
            error_type,
            message: message.into(),
            context: None,
        }
    }

    /// Attach context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Summary of one report run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Run directory identifier
    pub run_id: String,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Total number of configured pages
    pub total_pages: usize,

    /// Number of pages exported successfully
    pub exported_pages: usize,

    /// Number of pages that failed to export
    pub failed_pages: usize,

    /// Number of slides in the merged output
    pub merged_slides: usize,

    /// Path of the merged presentation, once produced
    pub output_path: Option<PathBuf>,

    /// Duration of the run
    pub duration: Duration,

    /// Errors encountered during the run
    pub errors: Vec<RunError>,
}

impl RunSummary {
    /// Create a new empty run summary
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Utc::now(),
            total_pages: 0,
            exported_pages: 0,
            failed_pages: 0,
            merged_slides: 0,
            output_path: None,
            duration: Duration::from_secs(0),
            errors: Vec::new(),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Add an error
    pub fn add_error(&mut self, error: RunError) {
        self.errors.push(error);
    }

    /// Check if the run was fully successful (no failed pages, no errors)
    pub fn is_successful(&self) -> bool {
        self.failed_pages == 0 && self.errors.is_empty()
    }

    /// Get the export success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_pages == 0 {
            return 100.0;
        }
        (self.exported_pages as f64 / self.total_pages as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            started_at = %self.started_at.to_rfc3339(),
            total_pages = self.total_pages,
            exported = self.exported_pages,
            failed = self.failed_pages,
            merged_slides = self.merged_slides,
            duration_secs = self.duration.as_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Run completed"
        );

        if !self.errors.is_empty() {
            tracing::warn!(error_count = self.errors.len(), "Run completed with errors");
            for error in &self.errors {
                tracing::warn!(
                    error_type = ?error.error_type,
                    message = %error.message,
                    context = ?error.context,
                    "Run error"
                );
            }
        }
    }
}
