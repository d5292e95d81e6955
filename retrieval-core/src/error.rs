//! Error types for the retrieval-core crate.
//!
//! Each variant carries a stable error code (SCREAMING_SNAKE_CASE) that is
//! included in the Display output and accessible via [`ServiceError::code()`].
//! Remote failures keep the provider name, status code and provider message
//! intact so callers see the original diagnostic, not a summary of it.

/// Stable error codes for programmatic error handling.
pub mod error_codes {
    /// Invalid or missing configuration (credentials, identifiers, ranges).
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";

    /// The provider throttled the request (HTTP 429 or equivalent).
    pub const RATE_LIMITED: &str = "RATE_LIMITED";

    /// The provider answered with a non-success status other than 429.
    pub const HTTP_STATUS: &str = "HTTP_STATUS";

    /// The request never produced a response (connect, TLS, timeout).
    pub const REQUEST_FAILED: &str = "REQUEST_FAILED";

    /// The response payload did not have the expected shape.
    pub const RESPONSE_INVALID: &str = "RESPONSE_INVALID";

    /// A caller-supplied table is missing required columns.
    pub const INPUT_INVALID: &str = "INPUT_INVALID";
}

/// Errors that can occur while retrieving from a remote service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Invalid or missing configuration. Raised at construction, never retried.
    #[error("[{}] {}", error_codes::CONFIG_INVALID, .0)]
    Config(String),

    /// The provider rejected the request because of rate limiting.
    #[error("[{}] {provider} HTTP 429: {message}", error_codes::RATE_LIMITED)]
    RateLimited {
        /// Provider that throttled the call.
        provider: String,
        /// Message extracted from the response body.
        message: String,
    },

    /// The provider returned a non-success status.
    #[error("[{}] {provider} HTTP {status}: {message}", error_codes::HTTP_STATUS)]
    Status {
        /// Provider that returned the status.
        provider: String,
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The HTTP request failed before a response arrived.
    #[error("[{}] {}", error_codes::REQUEST_FAILED, .0)]
    Request(String),

    /// The response body could not be mapped into result rows.
    #[error("[{}] {}", error_codes::RESPONSE_INVALID, .0)]
    Response(String),

    /// The input table does not have the columns an operation needs.
    #[error("[{}] {}", error_codes::INPUT_INVALID, .0)]
    Input(String),
}

impl ServiceError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => error_codes::CONFIG_INVALID,
            Self::RateLimited { .. } => error_codes::RATE_LIMITED,
            Self::Status { .. } => error_codes::HTTP_STATUS,
            Self::Request(_) => error_codes::REQUEST_FAILED,
            Self::Response(_) => error_codes::RESPONSE_INVALID,
            Self::Input(_) => error_codes::INPUT_INVALID,
        }
    }

    /// Returns true if the provider throttled this call.
    ///
    /// This is the only classification [`crate::retry::RetryPolicy`] retries on.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// HTTP status code, when the failure came from a provider response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convenience type alias for retrieval results.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_config() {
        let err = ServiceError::Config("GOOGLE_API_KEY is not set".into());
        assert_eq!(err.to_string(), "[CONFIG_INVALID] GOOGLE_API_KEY is not set");
    }

    #[test]
    fn display_rate_limited_keeps_provider_message() {
        let err = ServiceError::RateLimited {
            provider: "dblp".into(),
            message: "slow down".into(),
        };
        assert_eq!(err.to_string(), "[RATE_LIMITED] dblp HTTP 429: slow down");
    }

    #[test]
    fn display_status() {
        let err = ServiceError::Status {
            provider: "google".into(),
            status: 403,
            message: "API key not valid".into(),
        };
        assert_eq!(err.to_string(), "[HTTP_STATUS] google HTTP 403: API key not valid");
    }

    #[test]
    fn only_rate_limited_is_rate_limited() {
        let throttled = ServiceError::RateLimited {
            provider: "s2".into(),
            message: String::new(),
        };
        assert!(throttled.is_rate_limited());
        assert!(!ServiceError::Request("connection refused".into()).is_rate_limited());
        assert!(!ServiceError::Status {
            provider: "s2".into(),
            status: 503,
            message: String::new(),
        }
        .is_rate_limited());
    }

    #[test]
    fn status_codes() {
        let throttled = ServiceError::RateLimited {
            provider: "s2".into(),
            message: String::new(),
        };
        assert_eq!(throttled.status(), Some(429));
        assert_eq!(ServiceError::Response("missing hits".into()).status(), None);
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(ServiceError::Config(String::new()).code(), "CONFIG_INVALID");
        assert_eq!(ServiceError::Request(String::new()).code(), "REQUEST_FAILED");
        assert_eq!(ServiceError::Response(String::new()).code(), "RESPONSE_INVALID");
        assert_eq!(ServiceError::Input(String::new()).code(), "INPUT_INVALID");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ServiceError>();
    }
}
