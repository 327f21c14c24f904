//! External integrations
//!
//! Adapters for the services this tool talks to: the Power BI export API,
//! the Azure file share the report is delivered to, and the Graph mail
//! endpoint used for notifications.

pub mod fileshare;
pub mod mail;
pub mod powerbi;
