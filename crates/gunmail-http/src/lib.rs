//! # gunmail-http
//!
//! Async HTTP transport for the Mailgun API.
//!
//! ## Features
//!
//! - **Messages**: multipart `POST /{domain}/messages` with file attachments
//! - **Mailing lists**: paged member listing, create (single and bulk),
//!   update and delete
//! - **Connection options**: basic-auth credentials, base URL override,
//!   request timeout
//! - **Pluggable**: the [`Transport`] trait lets callers swap the HTTP client
//!   for another backend or a test double
//!
//! ## Quick Start
//!
//! ```ignore
//! use gunmail_http::{ConnectionOptions, HttpClient, OutboundMessage, Transport};
//!
//! #[tokio::main]
//! async fn main() -> gunmail_http::Result<()> {
//!     let client = HttpClient::new(ConnectionOptions::new("key-xxxxxxxx"))?;
//!
//!     let message = OutboundMessage::new("My App <noreply@mg.example.com>", "Hello")
//!         .to("john@example.com")
//!         .html("<h1>Hi John</h1>");
//!
//!     let response = client.send_message("mg.example.com", &message).await?;
//!     println!("Queued: {:?}", response.id);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod error;
pub mod member;
pub mod message;
pub mod options;
mod transport;

pub use client::HttpClient;
pub use error::{Error, Result};
pub use member::{Member, MemberResponse, MemberUpdate, NewMember};
pub use message::{FileAttachment, OutboundMessage, SendResponse};
pub use options::{API_USERNAME, ConnectionOptions, DEFAULT_API_URL};
pub use transport::Transport;
