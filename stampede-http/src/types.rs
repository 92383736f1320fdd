//! HTTP types shared with the load generator

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use stampede_config::HttpMethod;

/// What a completed (status < 400) request produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status_code: u16,
    /// Body size in bytes
    pub body_size: u64,
    /// Time from sending the request to reading the last body byte
    pub elapsed: Duration,
}

pub(crate) fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Options => reqwest::Method::OPTIONS,
    }
}
