//! HTTP client settings

use serde::{Deserialize, Serialize};
use stampede_config::{HttpConfig, TestConfiguration};
use std::time::Duration;

/// Settings one worker's client is built with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Per-request timeout
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_redirects: u32,
    pub user_agent: String,
    pub verify_ssl: bool,
    pub max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::from_parts(&HttpConfig::default(), Duration::from_secs(30))
    }
}

impl ClientSettings {
    /// Combine the HTTP domain config with a test's per-request timeout
    pub fn from_parts(http: &HttpConfig, timeout: Duration) -> Self {
        Self {
            timeout,
            connect_timeout: http.connection_pool.connection_timeout.min(timeout),
            max_redirects: http.max_redirects,
            user_agent: http.user_agent.clone(),
            verify_ssl: http.verify_ssl,
            max_idle_per_host: http.connection_pool.max_idle_per_host,
            pool_idle_timeout: http.connection_pool.idle_timeout,
        }
    }

    pub fn for_test(http: &HttpConfig, test: &TestConfiguration) -> Self {
        Self::from_parts(http, test.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_timeout_never_exceeds_request_timeout() {
        let settings = ClientSettings::from_parts(&HttpConfig::default(), Duration::from_secs(2));
        assert_eq!(settings.timeout, Duration::from_secs(2));
        assert_eq!(settings.connect_timeout, Duration::from_secs(2));

        let settings = ClientSettings::from_parts(&HttpConfig::default(), Duration::from_secs(60));
        assert_eq!(settings.connect_timeout, Duration::from_secs(10));
    }
}
