//! Mailer configuration.

use std::env;
use std::sync::Arc;

use gunmail_http::OutboundMessage;

use crate::error::{ConfigError, RequiredField};

/// Markup appended to bodies under [`UnsubscribePolicy::Default`].
pub const DEFAULT_UNSUBSCRIBE_HTML: &str = "<a href=\"%unsubscribe_url%\">Unsubscribe</a>";

/// Separator placed between the body and the unsubscribe link.
const UNSUBSCRIBE_SEPARATOR: &str = "<br><br>";

/// Callback receiving `(domain, message)` in place of a real send.
pub type TestModeObserver = Arc<dyn Fn(&str, &OutboundMessage) + Send + Sync>;

/// What to append to message bodies for unsubscribing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UnsubscribePolicy {
    /// Append nothing.
    Disabled,
    /// Append the provider's `%unsubscribe_url%` link.
    #[default]
    Default,
    /// Append custom HTML.
    Custom(String),
}

impl UnsubscribePolicy {
    /// Markup appended after header, body and footer.
    #[must_use]
    pub fn suffix(&self) -> String {
        match self {
            Self::Disabled => String::new(),
            Self::Default => format!("{UNSUBSCRIBE_SEPARATOR}{DEFAULT_UNSUBSCRIBE_HTML}"),
            Self::Custom(html) => format!("{UNSUBSCRIBE_SEPARATOR}{html}"),
        }
    }
}

/// Everything the mailer reads on each send.
#[derive(Clone, Default)]
pub struct MailerConfig {
    /// Mailgun private API key.
    pub api_key: String,
    /// Registered sending domain.
    pub domain: String,
    /// Sender address (does not need to exist).
    pub from_email: String,
    /// Sender display name.
    pub from_title: String,
    /// Prepended to every subject.
    pub subject_prefix: String,
    /// Appended to every subject.
    pub subject_suffix: String,
    /// Prepended to every body.
    pub header: String,
    /// Appended to every body, before the unsubscribe link.
    pub footer: String,
    /// Unsubscribe link policy.
    pub unsubscribe: UnsubscribePolicy,
    /// Build messages but hand them to the observer instead of sending.
    pub test_mode: bool,
    /// Receives messages in test mode. When unset they are logged.
    pub test_mode_observer: Option<TestModeObserver>,
}

impl MailerConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration with credentials.
    #[must_use]
    pub fn with_credentials(api_key: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            domain: domain.into(),
            ..Self::default()
        }
    }

    /// Sets the sender identity.
    #[must_use]
    pub fn with_sender(mut self, email: impl Into<String>, title: impl Into<String>) -> Self {
        self.from_email = email.into();
        self.from_title = title.into();
        self
    }

    /// Enables test mode with an observer.
    #[must_use]
    pub fn with_test_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&str, &OutboundMessage) + Send + Sync + 'static,
    {
        self.test_mode = true;
        self.test_mode_observer = Some(Arc::new(observer));
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// Reads `MAILGUN_API_KEY`, `MAILGUN_DOMAIN`, `MAILGUN_FROM_EMAIL`,
    /// `MAILGUN_FROM_TITLE` (falling back to `APP_TITLE`) and
    /// `MAILGUN_TEST_MODE`. Missing variables are left empty; `init()`
    /// reports them.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).unwrap_or_default();

        Self {
            api_key: var("MAILGUN_API_KEY"),
            domain: var("MAILGUN_DOMAIN"),
            from_email: var("MAILGUN_FROM_EMAIL"),
            from_title: lookup("MAILGUN_FROM_TITLE")
                .or_else(|| lookup("APP_TITLE"))
                .unwrap_or_default(),
            test_mode: lookup("MAILGUN_TEST_MODE").is_some_and(|v| is_truthy(&v)),
            ..Self::default()
        }
    }

    /// Checks that every field `init()` needs is present.
    ///
    /// # Errors
    ///
    /// Returns the first missing field, checked in the order API key,
    /// domain, sender email, sender title.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            (RequiredField::ApiKey, &self.api_key),
            (RequiredField::Domain, &self.domain),
            (RequiredField::FromEmail, &self.from_email),
            (RequiredField::FromTitle, &self.from_title),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(field));
            }
        }
        Ok(())
    }

    /// The `From` header value, e.g. `My App <noreply@example.com>`.
    #[must_use]
    pub fn sender(&self) -> String {
        format!("{} <{}>", self.from_title, self.from_email)
    }

    /// Applies subject prefix and suffix.
    #[must_use]
    pub fn decorate_subject(&self, subject: &str) -> String {
        format!("{}{subject}{}", self.subject_prefix, self.subject_suffix)
    }

    /// Applies header, footer and the unsubscribe link.
    #[must_use]
    pub fn decorate_body(&self, body: &str) -> String {
        format!(
            "{}{body}{}{}",
            self.header,
            self.footer,
            self.unsubscribe.suffix()
        )
    }
}

impl std::fmt::Debug for MailerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailerConfig")
            .field("api_key", &"<redacted>")
            .field("domain", &self.domain)
            .field("from_email", &self.from_email)
            .field("from_title", &self.from_title)
            .field("subject_prefix", &self.subject_prefix)
            .field("subject_suffix", &self.subject_suffix)
            .field("header", &self.header)
            .field("footer", &self.footer)
            .field("unsubscribe", &self.unsubscribe)
            .field("test_mode", &self.test_mode)
            .field("test_mode_observer", &self.test_mode_observer.is_some())
            .finish()
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
