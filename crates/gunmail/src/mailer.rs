//! The mailer facade.
//!
//! [`Mailer`] holds the configuration, decorates and sends messages, and
//! manages one mailing list through a [`Transport`].
//!
//! ```ignore
//! # async fn run() -> gunmail::Result<()> {
//! use gunmail::{Mailer, MailerConfig, SendOptions, TemplateVars};
//!
//! let config = MailerConfig::with_credentials("key-123", "mg.example.com")
//!     .with_sender("noreply@example.com", "My App");
//! let mut mailer = Mailer::new(config);
//! mailer.init()?;
//!
//! mailer
//!     .send(
//!         "user@example.com",
//!         "Welcome",
//!         Some("<p>Hello!</p>"),
//!         &TemplateVars::new(),
//!         SendOptions::new(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use gunmail_http::{
    ConnectionOptions, HttpClient, Member, MemberResponse, MemberUpdate, NewMember,
    OutboundMessage, Transport,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::attachment;
use crate::config::MailerConfig;
use crate::error::{ConfigError, Error, MemberError, MemberErrorKind, Result};
use crate::legacy::{self, LegacyOptions};
use crate::message::{Recipients, SendOptions, SendOutcome};
use crate::template::{self, MessageTemplate, TemplateVars};

/// Mailgun mailer.
///
/// Starts unconfigured. [`init`](Self::init) checks the configuration and
/// builds the transport; [`init_mailing_list`](Self::init_mailing_list)
/// selects the list used by the `list_*` operations.
pub struct Mailer {
    /// Configuration read on every send.
    pub config: MailerConfig,
    /// Connection options in the older flat shape, applied by `init()`.
    pub options: LegacyOptions,
    /// Templates available to [`send_named_template`](Self::send_named_template).
    pub templates: HashMap<String, MessageTemplate>,
    transport: Option<Arc<dyn Transport>>,
    list: Option<String>,
}

impl Mailer {
    /// Creates an unconfigured mailer.
    #[must_use]
    pub fn new(config: MailerConfig) -> Self {
        Self {
            config,
            options: LegacyOptions::default(),
            templates: HashMap::new(),
            transport: None,
            list: None,
        }
    }

    /// Sets legacy connection options.
    #[must_use]
    pub fn with_options(mut self, options: LegacyOptions) -> Self {
        self.options = options;
        self
    }

    /// Validates the configuration and builds the HTTP transport.
    ///
    /// Calling it again rebuilds the transport from the current settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] if a required field is empty,
    /// or a transport error if the client cannot be built.
    pub fn init(&mut self) -> Result<()> {
        self.init_with(|options| {
            let client: Arc<dyn Transport> = Arc::new(HttpClient::new(options)?);
            Ok(client)
        })
    }

    /// Like [`init`](Self::init), with a custom transport constructor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] if a required field is empty,
    /// or whatever `connect` returns.
    pub fn init_with<F>(&mut self, connect: F) -> Result<()>
    where
        F: FnOnce(ConnectionOptions) -> gunmail_http::Result<Arc<dyn Transport>>,
    {
        self.config.validate()?;

        let options = legacy::translate(&self.options, &mut self.config);
        debug!(
            domain = %self.config.domain,
            url = ?options.url,
            "Building mail transport"
        );
        self.transport = Some(connect(options)?);

        info!(
            domain = %self.config.domain,
            test_mode = self.config.test_mode,
            "Mailer initialized"
        );
        Ok(())
    }

    /// Returns true once `init()` has succeeded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.transport.is_some()
    }

    /// Selects the mailing list used by the `list_*` operations.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyMailingList`] for an empty address and
    /// [`ConfigError::NotInitialized`] before `init()`.
    pub fn init_mailing_list(&mut self, list: impl Into<String>) -> Result<()> {
        let list = list.into();
        if list.trim().is_empty() {
            return Err(ConfigError::EmptyMailingList.into());
        }
        if self.transport.is_none() {
            return Err(ConfigError::NotInitialized.into());
        }

        debug!(list = %list, "Mailing list selected");
        self.list = Some(list);
        Ok(())
    }

    /// The selected mailing list, if any.
    #[must_use]
    pub fn mailing_list(&self) -> Option<&str> {
        self.list.as_deref()
    }

    /// Registers a template for [`send_named_template`](Self::send_named_template).
    pub fn register_template(&mut self, name: impl Into<String>, template: MessageTemplate) {
        self.templates.insert(name.into(), template);
    }

    /// Looks up a registered template.
    #[must_use]
    pub fn template(&self, name: &str) -> Option<&MessageTemplate> {
        self.templates.get(name)
    }

    /// Renders a file against the environment and uses it as the header.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or rendered.
    pub fn load_header_template(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.config.header = template::render_file(path)?;
        Ok(())
    }

    /// Renders a file against the environment and uses it as the footer.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or rendered.
    pub fn load_footer_template(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.config.footer = template::render_file(path)?;
        Ok(())
    }

    fn transport(&self) -> Result<&Arc<dyn Transport>> {
        self.transport
            .as_ref()
            .ok_or_else(|| ConfigError::NotInitialized.into())
    }

    fn list(&self) -> Result<(&Arc<dyn Transport>, &str)> {
        let transport = self.transport()?;
        let list = self
            .list
            .as_deref()
            .ok_or(Error::Config(ConfigError::NoMailingList))?;
        Ok((transport, list))
    }

    /// Sends a message.
    ///
    /// The subject and body are decorated from the configuration. Non-empty
    /// `vars` are sent as the provider's recipient variables. `options`
    /// override anything computed here.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotInitialized`] before `init()`, an I/O
    /// error if an attachment cannot be read, or the transport's error.
    pub async fn send(
        &self,
        to: impl Into<Recipients> + Send,
        subject: &str,
        body: Option<&str>,
        vars: &TemplateVars,
        options: SendOptions,
    ) -> Result<SendOutcome> {
        let transport = self.transport()?;

        let mut message = OutboundMessage::new(
            self.config.sender(),
            self.config.decorate_subject(subject),
        );
        message.to = to.into().into_vec();
        message.html = Some(self.config.decorate_body(body.unwrap_or_default()));
        if !vars.is_empty() {
            message.recipient_variables = Some(serde_json::to_string(vars)?);
        }

        let attachment = options.apply(&mut message);
        if message.template.is_some() || message.html.as_deref().is_some_and(str::is_empty) {
            message.html = None;
        }
        if let Some(input) = attachment {
            message.attachments = attachment::normalize(input).resolve().await?;
        }

        debug!(
            to = ?message.to,
            subject = %message.subject,
            attachments = message.attachments.len(),
            "Prepared message"
        );

        if self.config.test_mode {
            return Ok(self.capture(message));
        }

        let response = transport.send_message(&self.config.domain, &message).await?;
        info!(id = ?response.id, "Message accepted");
        Ok(SendOutcome::Sent(response))
    }

    fn capture(&self, message: OutboundMessage) -> SendOutcome {
        match &self.config.test_mode_observer {
            Some(observer) => observer(&self.config.domain, &message),
            None => info!(
                domain = %self.config.domain,
                to = ?message.to,
                subject = %message.subject,
                "Test mode: message not sent"
            ),
        }
        SendOutcome::Captured(Box::new(message))
    }

    /// Renders `template` and sends the result.
    ///
    /// Templates see the process environment plus `vars`; `vars` win on
    /// name clashes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotInitialized`] before `init()`, a template
    /// error, or any error from [`send`](Self::send).
    pub async fn send_from_template(
        &self,
        to: impl Into<Recipients> + Send,
        template: &MessageTemplate,
        vars: &TemplateVars,
        options: SendOptions,
    ) -> Result<SendOutcome> {
        self.transport()?;

        let scope = template::merge_scope(template::environment_vars(), vars);
        let (subject, body) = template.render(&scope)?;
        self.send(to, &subject, Some(&body), vars, options).await
    }

    /// Sends a registered template.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownTemplate`] if nothing is registered
    /// under `name`, or any error from
    /// [`send_from_template`](Self::send_from_template).
    pub async fn send_named_template(
        &self,
        to: impl Into<Recipients> + Send,
        name: &str,
        vars: &TemplateVars,
        options: SendOptions,
    ) -> Result<SendOutcome> {
        let template = self
            .template(name)
            .ok_or_else(|| ConfigError::UnknownTemplate(name.to_string()))?;
        self.send_from_template(to, template, vars, options).await
    }

    /// Sends to a list address so the provider fans out to every member.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn list_send(&self, newsletter: &str, subject: &str, body: &str) -> Result<SendOutcome> {
        self.send(newsletter, subject, Some(body), &TemplateVars::new(), SendOptions::new())
            .await
    }

    /// Fetches every member of the selected list.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no list is selected, or the
    /// transport's error.
    pub async fn list_members(&self) -> Result<Vec<Member>> {
        let (transport, list) = self.list()?;
        Ok(transport.list_members(list).await?)
    }

    /// Fetches the addresses of the selected list's members, in order.
    ///
    /// # Errors
    ///
    /// Same as [`list_members`](Self::list_members).
    pub async fn list_addresses(&self) -> Result<Vec<String>> {
        let members = self.list_members().await?;
        let total = members.len();
        let addresses: Vec<String> = members.into_iter().filter_map(|m| m.address).collect();
        if addresses.len() < total {
            warn!(
                skipped = total - addresses.len(),
                "Skipped list members without an address"
            );
        }
        Ok(addresses)
    }

    /// Adds a subscribed member.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no list is selected, or the
    /// transport's error.
    pub async fn list_add(&self, address: &str, name: &str, vars: Value) -> Result<MemberResponse> {
        let (transport, list) = self.list()?;
        let member = NewMember::new(address).with_name(name).with_vars(vars);
        debug!(list = %list, address = %address, "Adding list member");
        Ok(transport.create_member(list, &member).await?)
    }

    /// Adds many members in one request.
    ///
    /// Every element must be an object with a string `address`; optional
    /// keys are `name`, `vars` and `subscribed`. The whole batch is checked
    /// before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming every malformed element, a
    /// configuration error if no list is selected, or the transport's error.
    pub async fn list_add_many(&self, members: &[Value], upsert: bool) -> Result<MemberResponse> {
        let (transport, list) = self.list()?;
        let members = parse_members(members)?;
        debug!(list = %list, count = members.len(), upsert, "Adding list members");
        Ok(transport.create_members(list, &members, upsert).await?)
    }

    /// Updates a member.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no list is selected, or the
    /// transport's error.
    pub async fn list_update(&self, address: &str, update: &MemberUpdate) -> Result<MemberResponse> {
        let (transport, list) = self.list()?;
        debug!(list = %list, address = %address, "Updating list member");
        Ok(transport.update_member(list, address, update).await?)
    }

    /// Deletes a member from the list.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no list is selected, or the
    /// transport's error.
    pub async fn list_remove(&self, address: &str) -> Result<MemberResponse> {
        let (transport, list) = self.list()?;
        debug!(list = %list, address = %address, "Removing list member");
        Ok(transport.delete_member(list, address).await?)
    }

    /// Marks a member unsubscribed, keeping the record.
    ///
    /// # Errors
    ///
    /// Same as [`list_update`](Self::list_update).
    pub async fn list_unsubscribe(&self, address: &str) -> Result<MemberResponse> {
        self.list_update(address, &MemberUpdate::unsubscribe()).await
    }
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("config", &self.config)
            .field("options", &self.options)
            .field("templates", &self.templates.keys().collect::<Vec<_>>())
            .field("initialized", &self.transport.is_some())
            .field("list", &self.list)
            .finish()
    }
}

fn parse_members(values: &[Value]) -> Result<Vec<NewMember>> {
    let mut members = Vec::with_capacity(values.len());
    let mut errors = Vec::new();

    for (index, value) in values.iter().enumerate() {
        match parse_member(value) {
            Ok(member) => members.push(member),
            Err(kind) => errors.push(MemberError { index, kind }),
        }
    }

    if errors.is_empty() {
        Ok(members)
    } else {
        Err(Error::Validation(errors))
    }
}

fn parse_member(value: &Value) -> std::result::Result<NewMember, MemberErrorKind> {
    let object = value.as_object().ok_or(MemberErrorKind::NotAnObject)?;
    let address = object
        .get("address")
        .and_then(Value::as_str)
        .ok_or(MemberErrorKind::MissingAddress)?;

    let mut member = NewMember::new(address);
    if let Some(name) = object.get("name").and_then(Value::as_str) {
        member = member.with_name(name);
    }
    if let Some(vars) = object.get("vars") {
        member = member.with_vars(vars.clone());
    }
    if let Some(subscribed) = object.get("subscribed").and_then(Value::as_bool) {
        member.subscribed = subscribed;
    }
    Ok(member)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_members_reports_every_offender() {
        let values = vec![
            json!({"address": "a@example.com"}),
            json!({"name": "No Address"}),
            json!("b@example.com"),
            json!({"address": 42}),
        ];
        let Err(Error::Validation(errors)) = parse_members(&values) else {
            panic!("Expected a validation error");
        };
        let indexed: Vec<_> = errors.iter().map(|e| (e.index, e.kind)).collect();
        assert_eq!(
            indexed,
            vec![
                (1, MemberErrorKind::MissingAddress),
                (2, MemberErrorKind::NotAnObject),
                (3, MemberErrorKind::MissingAddress),
            ]
        );
    }

    #[test]
    fn test_parse_member_optional_keys() {
        let member = parse_member(&json!({
            "address": "a@example.com",
            "name": "Ann",
            "vars": {"plan": "pro"},
            "subscribed": false
        }))
        .unwrap();
        assert_eq!(member.address, "a@example.com");
        assert_eq!(member.name.as_deref(), Some("Ann"));
        assert_eq!(member.vars, Some(json!({"plan": "pro"})));
        assert!(!member.subscribed);
    }

    #[test]
    fn test_init_mailing_list_checks_empty_first() {
        let mut mailer = Mailer::new(MailerConfig::new());
        let err = mailer.init_mailing_list("").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::EmptyMailingList)));

        let err = mailer.init_mailing_list("news@mg.example.com").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::NotInitialized)));
        assert!(mailer.mailing_list().is_none());
    }

    #[test]
    fn test_debug_hides_key() {
        let mailer = Mailer::new(MailerConfig::with_credentials("key-secret", "mg.example.com"));
        assert!(!format!("{mailer:?}").contains("key-secret"));
    }
}
