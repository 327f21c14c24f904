//! Page configuration sources
//!
//! One capability — "produce an ordered, validated `ReportPage` list" —
//! implemented by interchangeable strategies (JSON file, PostgreSQL table)
//! selected by run configuration.

pub mod database;
pub mod file;
pub mod source;

pub use database::DatabasePageSource;
pub use file::FilePageSource;
pub use source::{create_page_source, PageSource};
