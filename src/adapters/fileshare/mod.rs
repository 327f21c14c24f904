//! Azure file share adapter

pub mod client;

pub use client::FileShareClient;
