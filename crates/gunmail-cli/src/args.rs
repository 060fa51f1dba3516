//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gunmail")]
#[command(about = "Send mail and manage mailing lists through Mailgun")]
#[command(
    long_about = r"Send mail and manage mailing lists through Mailgun.

Credentials come from the environment (or a .env file):
  MAILGUN_API_KEY, MAILGUN_DOMAIN, MAILGUN_FROM_EMAIL,
  MAILGUN_FROM_TITLE (or APP_TITLE), MAILGUN_TEST_MODE"
)]
#[command(version)]
pub struct Cli {
    /// Mailing list address used by list commands
    #[arg(long, global = true, env = "MAILGUN_NEWSLETTER")]
    pub list: Option<String>,

    /// Template file rendered and prepended to every body
    #[arg(long, global = true)]
    pub header: Option<PathBuf>,

    /// Template file rendered and appended to every body
    #[arg(long, global = true)]
    pub footer: Option<PathBuf>,

    /// Build messages but do not send them
    #[arg(long, global = true)]
    pub test_mode: bool,

    /// Do not append an unsubscribe link
    #[arg(long, global = true)]
    pub no_unsubscribe: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a message
    Send {
        /// Recipient address (repeatable)
        #[arg(long, required = true)]
        to: Vec<String>,

        #[command(flatten)]
        content: Content,

        /// File to attach (repeatable)
        #[arg(long = "attach")]
        attachments: Vec<PathBuf>,

        /// Stored Mailgun template to render instead of the body
        #[arg(long)]
        template: Option<String>,
    },

    /// Print the addresses of the list members
    Members,

    /// Add a subscribed member to the list
    Subscribe {
        /// Member address
        address: String,

        /// Display name
        #[arg(long, default_value = "")]
        name: String,

        /// Member data as a JSON object
        #[arg(long, default_value = "{}")]
        vars: String,
    },

    /// Mark a member unsubscribed
    Unsubscribe {
        /// Member address
        address: String,
    },

    /// Delete a member from the list
    Remove {
        /// Member address
        address: String,
    },

    /// Send a message to every member of the list
    Newsletter {
        #[command(flatten)]
        content: Content,
    },
}

/// Subject and body of a message.
#[derive(clap::Args)]
pub struct Content {
    /// Subject line
    #[arg(long)]
    pub subject: String,

    /// HTML body
    #[arg(long, conflicts_with = "body_file")]
    pub body: Option<String>,

    /// Read the HTML body from a file
    #[arg(long)]
    pub body_file: Option<PathBuf>,
}
