//! Error types for the mailer.

use thiserror::Error;

/// Errors that can occur in mailer operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing configuration or an operation invoked out of order.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reading an attachment failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The provider call failed or was rejected.
    #[error("Transport error: {0}")]
    Transport(#[from] gunmail_http::Error),

    /// One or more bulk member records are malformed.
    #[error("Invalid list members: {}", describe_members(.0))]
    Validation(Vec<MemberError>),

    /// Template rendering failed.
    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration and lifecycle errors, detected before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required configuration field is empty.
    #[error("{} is required", .0.label())]
    MissingField(RequiredField),

    /// `init()` has not been called.
    #[error("call init() before using the mailer")]
    NotInitialized,

    /// `init_mailing_list()` has not been called.
    #[error("call init_mailing_list() before list operations")]
    NoMailingList,

    /// An empty list address was passed to `init_mailing_list()`.
    #[error("a mailing list address is required")]
    EmptyMailingList,

    /// No template is registered under this name.
    #[error("unknown template: {0}")]
    UnknownTemplate(String),
}

impl ConfigError {
    /// Get the configuration field this error relates to, if any.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField(field) => Some(field.name()),
            Self::EmptyMailingList | Self::NoMailingList => Some("list"),
            Self::NotInitialized | Self::UnknownTemplate(_) => None,
        }
    }

    /// Get human-readable error message.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Fields `init()` requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    /// Mailgun private API key.
    ApiKey,
    /// Sending domain.
    Domain,
    /// Sender address.
    FromEmail,
    /// Sender display name.
    FromTitle,
}

impl RequiredField {
    /// Field name as it appears on [`MailerConfig`](crate::MailerConfig).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ApiKey => "api_key",
            Self::Domain => "domain",
            Self::FromEmail => "from_email",
            Self::FromTitle => "from_title",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::ApiKey => "API key",
            Self::Domain => "Domain",
            Self::FromEmail => "Sender email",
            Self::FromTitle => "Sender title",
        }
    }
}

/// A malformed element in a bulk member list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberError {
    /// Position of the element in the input.
    pub index: usize,
    /// What is wrong with it.
    pub kind: MemberErrorKind,
}

/// Why a bulk member element was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberErrorKind {
    /// The element is not a JSON object.
    NotAnObject,
    /// The element has no string `address` key.
    MissingAddress,
}

impl MemberErrorKind {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotAnObject => "member must be an object",
            Self::MissingAddress => "member has no address",
        }
    }
}

impl std::fmt::Display for MemberError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}: {}", self.index, self.kind.message())
    }
}

fn describe_members(errors: &[MemberError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message() {
        let err = Error::from(ConfigError::MissingField(RequiredField::Domain));
        assert_eq!(err.to_string(), "Configuration error: Domain is required");
    }

    #[test]
    fn test_config_error_field() {
        assert_eq!(
            ConfigError::MissingField(RequiredField::FromTitle).field(),
            Some("from_title")
        );
        assert_eq!(ConfigError::NoMailingList.field(), Some("list"));
        assert_eq!(ConfigError::NotInitialized.field(), None);
    }

    #[test]
    fn test_validation_message_lists_every_element() {
        let err = Error::Validation(vec![
            MemberError {
                index: 1,
                kind: MemberErrorKind::MissingAddress,
            },
            MemberError {
                index: 3,
                kind: MemberErrorKind::NotAnObject,
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid list members: #1: member has no address, #3: member must be an object"
        );
    }
}
