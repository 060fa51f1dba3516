//! Send-call inputs and outcomes.

use std::collections::BTreeMap;

use gunmail_http::{OutboundMessage, SendResponse};

use crate::attachment::AttachmentInput;

/// One or more recipient addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipients(Vec<String>);

impl Recipients {
    /// Returns the addresses.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Consumes the list into its addresses.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for Recipients {
    fn from(address: &str) -> Self {
        Self(vec![address.to_string()])
    }
}

impl From<String> for Recipients {
    fn from(address: String) -> Self {
        Self(vec![address])
    }
}

impl From<&String> for Recipients {
    fn from(address: &String) -> Self {
        Self(vec![address.clone()])
    }
}

impl From<Vec<String>> for Recipients {
    fn from(addresses: Vec<String>) -> Self {
        Self(addresses)
    }
}

impl From<Vec<&str>> for Recipients {
    fn from(addresses: Vec<&str>) -> Self {
        Self(addresses.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Recipients {
    fn from(addresses: &[&str]) -> Self {
        Self(addresses.iter().map(|a| (*a).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Recipients {
    fn from(addresses: [&str; N]) -> Self {
        Self(addresses.iter().map(|a| (*a).to_string()).collect())
    }
}

/// Per-send overrides. Every field set here replaces the value the mailer
/// would otherwise compute.
#[derive(Debug, Default)]
pub struct SendOptions {
    /// Replaces the configured sender.
    pub from: Option<String>,
    /// Replaces the recipients.
    pub to: Option<Recipients>,
    /// Replaces the decorated subject.
    pub subject: Option<String>,
    /// Replaces the decorated body.
    pub html: Option<String>,
    /// Replaces the serialized recipient variables.
    pub recipient_variables: Option<String>,
    /// Stored provider template; the HTML body is dropped when set.
    pub template: Option<String>,
    /// Extra provider fields (`cc`, `bcc`, `text`, `o:tag`, `h:Reply-To`, ...).
    pub fields: BTreeMap<String, String>,
    /// Files to attach.
    pub attachment: Option<AttachmentInput>,
}

impl SendOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders a stored provider template instead of the HTML body.
    #[must_use]
    pub fn template(mut self, name: impl Into<String>) -> Self {
        self.template = Some(name.into());
        self
    }

    /// Attaches files.
    #[must_use]
    pub fn attachment(mut self, input: impl Into<AttachmentInput>) -> Self {
        self.attachment = Some(input.into());
        self
    }

    /// Sets an extra provider field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Overrides the sender.
    #[must_use]
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Overrides the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Merges these options over `message`, returning the attachment input.
    pub(crate) fn apply(self, message: &mut OutboundMessage) -> Option<AttachmentInput> {
        if let Some(from) = self.from {
            message.from = from;
        }
        if let Some(to) = self.to {
            message.to = to.into_vec();
        }
        if let Some(subject) = self.subject {
            message.subject = subject;
        }
        if let Some(html) = self.html {
            message.html = Some(html);
        }
        if let Some(vars) = self.recipient_variables {
            message.recipient_variables = Some(vars);
        }
        if let Some(template) = self.template {
            message.template = Some(template);
        }
        message.fields.extend(self.fields);
        self.attachment
    }
}

/// What happened to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The provider accepted the message.
    Sent(SendResponse),
    /// Test mode: the message went to the observer instead.
    Captured(Box<OutboundMessage>),
}

impl SendOutcome {
    /// Returns true if the message was only captured.
    #[must_use]
    pub const fn is_captured(&self) -> bool {
        matches!(self, Self::Captured(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipients_from_variants() {
        assert_eq!(Recipients::from("a@example.com").as_slice(), ["a@example.com"]);
        assert_eq!(
            Recipients::from(["a@example.com", "b@example.com"]).into_vec(),
            vec!["a@example.com", "b@example.com"]
        );
        assert_eq!(
            Recipients::from(vec!["x@example.com".to_string()]).as_slice().len(),
            1
        );
    }

    #[test]
    fn test_apply_overrides_fields() {
        let mut message = OutboundMessage::new("App <a@example.com>", "Subject").to("x@example.com");
        message.html = Some("<p>body</p>".into());

        let options = SendOptions::new()
            .from("Other <o@example.com>")
            .subject("Replaced")
            .field("o:tag", "newsletter")
            .template("weekly");
        let attachment = options.apply(&mut message);

        assert!(attachment.is_none());
        assert_eq!(message.from, "Other <o@example.com>");
        assert_eq!(message.subject, "Replaced");
        assert_eq!(message.template.as_deref(), Some("weekly"));
        assert_eq!(message.fields["o:tag"], "newsletter");
        assert_eq!(message.to, vec!["x@example.com"]);
    }

    #[test]
    fn test_apply_returns_attachment() {
        let mut message = OutboundMessage::default();
        let attachment = SendOptions::new()
            .attachment(b"data".to_vec())
            .apply(&mut message);
        assert!(matches!(attachment, Some(AttachmentInput::Buffer(_))));
    }
}
