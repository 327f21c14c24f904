//! Mail notification adapter

pub mod client;

pub use client::Mailer;
