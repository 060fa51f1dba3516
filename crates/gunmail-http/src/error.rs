//! Error types for Mailgun HTTP operations.

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Transport error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The provider rejected the request.
    #[error("Mailgun API error {status}: {message}")]
    Api {
        /// HTTP status code (e.g., 400).
        status: u16,
        /// Message returned by the provider.
        message: String,
    },

    /// Invalid connection configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Creates an API error from a status code and message.
    #[must_use]
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Returns the HTTP status of a provider rejection, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the provider refused the credentials (401/403).
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status == 401 || *status == 403)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = Error::api_error(400, "'to' parameter is missing");
        assert_eq!(
            err.to_string(),
            "Mailgun API error 400: 'to' parameter is missing"
        );
        assert_eq!(err.status(), Some(400));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_unauthorized() {
        assert!(Error::api_error(401, "Forbidden").is_unauthorized());
        assert!(Error::api_error(403, "Forbidden").is_unauthorized());
        assert!(!Error::InvalidConfig("x".into()).is_unauthorized());
    }
}
