//! Domain error types
//!
//! This module defines the error hierarchy for easel. All errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main easel error type
///
/// This is the primary error type used throughout the application.
/// It wraps service-specific error types and provides context for
/// error handling.
#[derive(Debug, Error)]
pub enum EaselError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Power BI service errors
    #[error("Power BI error: {0}")]
    PowerBi(#[from] PowerBiError),

    /// Presentation merge errors
    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Export process errors
    #[error("Export error: {0}")]
    Export(String),

    /// Page configuration database errors
    #[error("Database error: {0}")]
    Database(String),

    /// Delivery errors (file share upload, mail notification)
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Power BI-specific errors
///
/// Errors that occur when interacting with the Power BI REST API.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum PowerBiError {
    /// Failed to reach the service at all
    #[error("Failed to connect to Power BI: {0}")]
    ConnectionFailed(String),

    /// Token endpoint rejected the client credentials
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Response body could not be interpreted
    #[error("Invalid response from service: {0}")]
    InvalidResponse(String),

    /// The service reported the export job as failed
    #[error("Export of page '{page}' failed: {message}")]
    ExportFailed { page: String, message: String },

    /// The export job stayed non-terminal past the poll budget
    #[error("Export of page '{page}' did not complete after {attempts} poll attempts")]
    PollTimeout { page: String, attempts: usize },

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },
}

/// Merge-specific errors
///
/// Errors raised while combining single-page presentation files into
/// one deck. Any of these aborts the merge; no partial output is written.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A source file could not be opened or is not a zip package
    #[error("Unreadable source file {path}: {message}")]
    UnreadableSource { path: String, message: String },

    /// A package is missing a required part or relationship
    #[error("Invalid package {path}: {message}")]
    InvalidPackage { path: String, message: String },

    /// Slide XML could not be parsed
    #[error("Malformed slide XML in {path}: {message}")]
    MalformedSlide { path: String, message: String },

    /// The merged package could not be written
    #[error("Failed to write merged presentation: {0}")]
    WriteFailed(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for EaselError {
    fn from(err: std::io::Error) -> Self {
        EaselError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for EaselError {
    fn from(err: serde_json::Error) -> Self {
        EaselError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for EaselError {
    fn from(err: toml::de::Error) -> Self {
        EaselError::Configuration(format!("TOML parse error: {err}"))
    }
}
