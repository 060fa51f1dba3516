//! Connection options for the Mailgun API.

use std::time::Duration;

use crate::error::{Error, Result};
use url::Url;

/// Base URL used when no override is configured.
pub const DEFAULT_API_URL: &str = "https://api.mailgun.net/v3";

/// Username Mailgun expects for HTTP basic authentication.
pub const API_USERNAME: &str = "api";

/// Connection options for [`HttpClient`](crate::HttpClient).
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Basic-auth username (always `api` for Mailgun).
    pub username: String,
    /// Private API key.
    pub key: String,
    /// Public validation key (optional).
    pub public_key: Option<String>,
    /// Base URL override, including the version path (e.g. `/v3`).
    pub url: Option<String>,
    /// Request timeout.
    pub timeout: Option<Duration>,
}

impl ConnectionOptions {
    /// Creates options for the given API key with provider defaults.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            username: API_USERNAME.to_string(),
            key: key.into(),
            public_key: None,
            url: None,
            timeout: None,
        }
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the public validation key.
    #[must_use]
    pub fn with_public_key(mut self, key: impl Into<String>) -> Self {
        self.public_key = Some(key.into());
        self
    }

    /// Returns the effective base URL, falling back to [`DEFAULT_API_URL`].
    ///
    /// The returned URL always ends with `/` so relative paths join below it.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(&self) -> Result<Url> {
        let raw = self.url.as_deref().unwrap_or(DEFAULT_API_URL);
        let mut url = Url::parse(raw)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Validates that credentials are present.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() {
            return Err(Error::InvalidConfig("username is empty".into()));
        }
        if self.key.is_empty() {
            return Err(Error::InvalidConfig("API key is empty".into()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("username", &self.username)
            .field("key", &"<redacted>")
            .field("public_key", &self.public_key.as_ref().map(|_| "<redacted>"))
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
