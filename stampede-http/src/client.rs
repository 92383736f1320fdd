//! HTTP client implementation

use crate::config::ClientSettings;
use crate::errors::HttpError;
use crate::types::{reqwest_method, HttpResponse};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client,
};
use stampede_config::RequestSpec;
use std::str::FromStr;
use tokio::time::Instant;
use tracing::{debug, trace};

/// HTTP client trait used by virtual users
///
/// Implementations must treat any status >= 400 as [`HttpError::Status`], so
/// that callers can record it as a failed request with its status code.
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, url: &str, request: &RequestSpec) -> Result<HttpResponse, HttpError>;
}

/// `reqwest`-backed client with a shared connection pool
#[derive(Debug, Clone)]
pub struct HttpManager {
    client: Client,
}

impl HttpManager {
    /// Build a client from explicit settings
    pub fn new(settings: ClientSettings) -> Result<Self, HttpError> {
        debug!(
            "Creating HttpManager with {}ms request timeout",
            settings.timeout.as_millis()
        );

        if settings.timeout.is_zero() {
            return Err(HttpError::ConfigError(
                "request timeout must be positive".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(settings.connect_timeout)
            .user_agent(&settings.user_agent)
            .danger_accept_invalid_certs(!settings.verify_ssl)
            .redirect(reqwest::redirect::Policy::limited(
                settings.max_redirects as usize,
            ))
            .pool_max_idle_per_host(settings.max_idle_per_host)
            .pool_idle_timeout(settings.pool_idle_timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Build a client with default settings
    pub fn with_defaults() -> Result<Self, HttpError> {
        Self::new(ClientSettings::default())
    }

    fn header_map(request: &RequestSpec) -> Result<HeaderMap, HttpError> {
        let mut header_map = HeaderMap::new();
        for (key, value) in &request.headers {
            let header_name = HeaderName::from_str(key)
                .map_err(|_| HttpError::InvalidHeaderName(key.to_string()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| HttpError::InvalidHeaderValue(key.to_string()))?;
            header_map.insert(header_name, header_value);
        }
        Ok(header_map)
    }
}

#[async_trait::async_trait]
impl HttpClient for HttpManager {
    async fn execute(&self, url: &str, request: &RequestSpec) -> Result<HttpResponse, HttpError> {
        let start = Instant::now();

        let mut builder = self
            .client
            .request(reqwest_method(request.method), url);

        if !request.headers.is_empty() {
            builder = builder.headers(Self::header_map(request)?);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        trace!("Sending {} {}", request.method, url);
        let response = builder.send().await?;
        let status = response.status();

        // The body is drained so that response time covers the full transfer
        let body = response.bytes().await?;
        let elapsed = start.elapsed();

        trace!(
            "{} {} -> {} ({} bytes, {}ms)",
            request.method,
            url,
            status.as_u16(),
            body.len(),
            elapsed.as_millis()
        );

        if status.as_u16() >= 400 {
            return Err(HttpError::Status {
                status_code: status.as_u16(),
            });
        }

        Ok(HttpResponse {
            status_code: status.as_u16(),
            body_size: body.len() as u64,
            elapsed,
        })
    }
}
