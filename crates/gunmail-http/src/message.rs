//! Outbound message payloads.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A file attached to an outbound message, fully loaded in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    /// Filename presented to the recipient.
    pub filename: String,
    /// File contents.
    pub data: Bytes,
}

impl FileAttachment {
    /// Creates a new attachment.
    #[must_use]
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// A message ready to hand to the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Sender, e.g. `App <noreply@example.com>`.
    pub from: String,
    /// Recipient addresses.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// HTML body. Omitted when the provider renders a stored template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// Per-recipient substitution variables, serialized as JSON.
    #[serde(
        rename = "recipient-variables",
        skip_serializing_if = "Option::is_none"
    )]
    pub recipient_variables: Option<String>,
    /// Name of a template stored at the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Additional provider fields (`cc`, `text`, `o:tag`, `h:Reply-To`, ...).
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
    /// Attached files.
    #[serde(
        rename = "attachment",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub attachments: Vec<FileAttachment>,
}

impl OutboundMessage {
    /// Creates a new message.
    #[must_use]
    pub fn new(from: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            subject: subject.into(),
            ..Self::default()
        }
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to.push(recipient.into());
        self
    }

    /// Sets the HTML body.
    #[must_use]
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Sets an extra provider field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Attaches a file.
    #[must_use]
    pub fn attach(mut self, attachment: FileAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Returns the form fields sent for this message, in wire order.
    ///
    /// Attachments are not included; they travel as file parts.
    #[must_use]
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = Vec::with_capacity(4 + self.to.len() + self.fields.len());
        fields.push(("from".to_string(), self.from.clone()));
        for recipient in &self.to {
            fields.push(("to".to_string(), recipient.clone()));
        }
        fields.push(("subject".to_string(), self.subject.clone()));
        if let Some(html) = &self.html {
            fields.push(("html".to_string(), html.clone()));
        }
        if let Some(template) = &self.template {
            fields.push(("template".to_string(), template.clone()));
        }
        if let Some(vars) = &self.recipient_variables {
            fields.push(("recipient-variables".to_string(), vars.clone()));
        }
        for (name, value) in &self.fields {
            fields.push((name.clone(), value.clone()));
        }
        fields
    }
}

/// Provider response to a send request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResponse {
    /// Provider-assigned message ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Status message (e.g. `Queued. Thank you.`).
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_form_fields_order() {
        let message = OutboundMessage::new("App <noreply@example.com>", "Hi")
            .to("a@example.com")
            .to("b@example.com")
            .html("<p>hello</p>")
            .field("o:tag", "welcome");

        let fields = message.form_fields();
        let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["from", "to", "to", "subject", "html", "o:tag"]);
        assert_eq!(fields[2].1, "b@example.com");
    }

    #[test]
    fn test_form_fields_skip_absent_html() {
        let mut message = OutboundMessage::new("from", "subject").to("x@example.com");
        message.template = Some("welcome".into());
        let fields = message.form_fields();
        assert!(fields.iter().all(|(n, _)| n != "html"));
        assert!(fields.contains(&("template".to_string(), "welcome".to_string())));
    }

    #[test]
    fn test_serialize_uses_provider_names() {
        let mut message = OutboundMessage::new("from", "subject").to("x@example.com");
        message.recipient_variables = Some("{}".into());
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["recipient-variables"], "{}");
        assert!(json.get("html").is_none());
        assert!(json.get("attachment").is_none());
    }

    #[test]
    fn test_send_response_deserialization() {
        let json = r#"{"id": "<20240101.1@example.com>", "message": "Queued. Thank you."}"#;
        let response: SendResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.id.as_deref(), Some("<20240101.1@example.com>"));
        assert_eq!(response.message, "Queued. Thank you.");
    }
}
