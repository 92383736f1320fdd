//! HTTP client functionality for Stampede
//!
//! This crate wraps `reqwest` behind the [`HttpClient`] trait so the load
//! generator can time scenario requests and tests can substitute their own
//! client.

pub mod client;
pub mod config;
pub mod errors;
pub mod types;

// Re-export main types for convenience
pub use client::{HttpClient, HttpManager};
pub use config::ClientSettings;
pub use errors::HttpError;
pub use types::{HttpMethod, HttpResponse};
