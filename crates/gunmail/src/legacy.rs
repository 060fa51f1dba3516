//! Compatibility with the older flat options shape.
//!
//! Older integrations configured the mailer with a single record of
//! `host`/`port`/`protocol`/`proxy`/`endpoint`/`timeout`/`test_mode`
//! fields. [`translate`] maps that record onto the transport's
//! [`ConnectionOptions`], copying credentials and test-mode settings onto
//! the live [`MailerConfig`] on the way.

use std::time::Duration;

use gunmail_http::{API_USERNAME, ConnectionOptions};
use serde::{Deserialize, Deserializer};

use crate::config::{MailerConfig, TestModeObserver};

/// Host used when only a protocol, port or endpoint is overridden.
pub const DEFAULT_HOST: &str = "api.mailgun.net";

/// Endpoint used when neither the host nor the options name one.
pub const DEFAULT_ENDPOINT: &str = "/v3";

const DEFAULT_PROTOCOL: &str = "https://";

/// Options in the older flat shape.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyOptions {
    /// Private API key.
    pub api_key: Option<String>,
    /// Public validation key.
    pub public_api_key: Option<String>,
    /// Sending domain.
    pub domain: Option<String>,
    /// Full base URL; wins over every other URL field.
    pub proxy: Option<String>,
    /// Request timeout, in milliseconds when deserialized.
    #[serde(deserialize_with = "millis")]
    pub timeout: Option<Duration>,
    /// API host, optionally with a scheme and a path.
    pub host: Option<String>,
    /// URL scheme (`http`, `https:`, `https://`).
    pub protocol: Option<String>,
    /// API port.
    pub port: Option<u16>,
    /// Version path, e.g. `/v3`.
    pub endpoint: Option<String>,
    /// Enables test mode.
    pub test_mode: Option<bool>,
    /// Test-mode observer.
    #[serde(skip)]
    pub test_mode_observer: Option<TestModeObserver>,
}

impl LegacyOptions {
    /// True if any field overriding the URL pieces is set.
    fn has_url_parts(&self) -> bool {
        given(self.host.as_ref()).is_some()
            || given(self.protocol.as_ref()).is_some()
            || self.port.is_some()
            || given(self.endpoint.as_ref()).is_some()
    }

    /// Builds the base URL, or `None` to use the transport default.
    ///
    /// Empty strings count as unset.
    #[must_use]
    pub fn base_url(&self) -> Option<String> {
        if let Some(proxy) = given(self.proxy.as_ref()) {
            return Some(proxy.to_string());
        }
        if !self.has_url_parts() {
            return None;
        }

        let host = given(self.host.as_ref())
            .map(strip_scheme)
            .filter(|h| !h.is_empty())
            .unwrap_or(DEFAULT_HOST);

        let protocol = given(self.protocol.as_ref())
            .map_or_else(|| DEFAULT_PROTOCOL.to_string(), normalize_protocol);

        let port = self.port.map(|p| format!(":{p}")).unwrap_or_default();

        let (host, endpoint) = match host.find('/') {
            Some(split) => (&host[..split], &host[split..]),
            None => (
                host,
                given(self.endpoint.as_ref()).unwrap_or(DEFAULT_ENDPOINT),
            ),
        };

        Some(format!("{protocol}{host}{port}{endpoint}"))
    }
}

impl std::fmt::Debug for LegacyOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyOptions")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("public_api_key", &self.public_api_key.as_ref().map(|_| "<redacted>"))
            .field("domain", &self.domain)
            .field("proxy", &self.proxy)
            .field("timeout", &self.timeout)
            .field("host", &self.host)
            .field("protocol", &self.protocol)
            .field("port", &self.port)
            .field("endpoint", &self.endpoint)
            .field("test_mode", &self.test_mode)
            .field("test_mode_observer", &self.test_mode_observer.is_some())
            .finish()
    }
}

/// Maps legacy options onto connection options.
///
/// Copies a non-empty `domain` or `api_key`, an enabled `test_mode` and the
/// observer onto `target`. The returned key is the target's key after that
/// copy, so a key set only on the config is still used.
pub fn translate(legacy: &LegacyOptions, target: &mut MailerConfig) -> ConnectionOptions {
    if let Some(domain) = given(legacy.domain.as_ref()) {
        domain.clone_into(&mut target.domain);
    }
    if let Some(api_key) = given(legacy.api_key.as_ref()) {
        api_key.clone_into(&mut target.api_key);
    }
    if legacy.test_mode == Some(true) {
        target.test_mode = true;
    }
    if let Some(observer) = &legacy.test_mode_observer {
        target.test_mode_observer = Some(observer.clone());
    }

    ConnectionOptions {
        username: API_USERNAME.to_string(),
        key: target.api_key.clone(),
        public_key: given(legacy.public_api_key.as_ref()).map(str::to_string),
        url: legacy.base_url(),
        timeout: legacy.timeout,
    }
}

/// A string option, with empty strings treated as unset.
fn given(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

/// Drops a leading `scheme://` from a host.
fn strip_scheme(host: &str) -> &str {
    match host.split_once("://") {
        Some((scheme, rest))
            if !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphabetic()) =>
        {
            rest
        }
        _ => host,
    }
}

/// Makes a protocol end in exactly `://`.
fn normalize_protocol(protocol: &str) -> String {
    let scheme = protocol.trim_end_matches('/').trim_end_matches(':');
    format!("{scheme}://")
}

fn millis<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}
