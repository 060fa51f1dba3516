//! # gunmail
//!
//! A small Mailgun mailer: decorated sends, templates and mailing-list
//! management on top of [`gunmail_http`].
//!
//! This crate provides:
//! - **Mailer facade**: one object holding the configuration and exposing
//!   send and list operations
//! - **Attachments**: paths, buffers and byte streams, alone or nested in
//!   lists, normalized into named files
//! - **Templates**: Handlebars rendering of subjects, bodies, headers and
//!   footers
//! - **Legacy options**: the older `host`/`port`/`protocol`/`proxy` option
//!   shape, translated into connection options
//! - **Test mode**: messages handed to an observer instead of sent

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod attachment;
pub mod config;
mod error;
pub mod legacy;
mod mailer;
pub mod message;
pub mod template;

pub use attachment::{Attachment, AttachmentData, AttachmentInput, normalize};
pub use config::{MailerConfig, TestModeObserver, UnsubscribePolicy};
pub use error::{ConfigError, Error, MemberError, MemberErrorKind, RequiredField, Result};
pub use legacy::LegacyOptions;
pub use mailer::Mailer;
pub use message::{Recipients, SendOptions, SendOutcome};
pub use template::{MessageTemplate, TemplateVars};

pub use gunmail_http::{FileAttachment, Member, MemberResponse, MemberUpdate, OutboundMessage};
