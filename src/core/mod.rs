//! Business logic
//!
//! The page-source strategies, the export orchestration, and the
//! presentation merge core.

pub mod export;
pub mod merge;
pub mod pages;
