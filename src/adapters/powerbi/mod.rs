//! Power BI adapter
//!
//! Authentication and the export client for the Power BI REST API.

pub mod auth;
pub mod client;
pub mod models;

pub use auth::{AccessToken, TokenProvider, GRAPH_SCOPE, POWERBI_SCOPE};
pub use client::PowerBiClient;
pub use models::{ExportState, PageInfo};
