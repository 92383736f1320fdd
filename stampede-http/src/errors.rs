//! HTTP error types

/// Error type for HTTP operations
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Request failed with status code {status_code}")]
    Status { status_code: u16 },

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(String),

    #[error("Invalid header value for {0}")]
    InvalidHeaderValue(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl HttpError {
    /// HTTP status carried by the error, or 0 when no response was received
    pub fn status_code(&self) -> u16 {
        match self {
            HttpError::Status { status_code } => *status_code,
            HttpError::NetworkError(e) => e.status().map(|s| s.as_u16()).unwrap_or(0),
            _ => 0,
        }
    }

    /// Whether the request never got a response because of the timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, HttpError::NetworkError(e) if e.is_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message_and_code() {
        let err = HttpError::Status { status_code: 503 };
        assert_eq!(err.to_string(), "Request failed with status code 503");
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn test_non_response_errors_have_zero_status() {
        assert_eq!(HttpError::ConfigError("x".to_string()).status_code(), 0);
        assert_eq!(HttpError::InvalidHeaderName("bad name".to_string()).status_code(), 0);
        assert!(!HttpError::ConfigError("x".to_string()).is_timeout());
    }
}
