//! `gunmail` - Mailgun sender and mailing-list manager
//!
//! Thin command-line front end over the `gunmail` mailer.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod args;

use anyhow::{Context, Result, bail};
use clap::Parser;
use gunmail::{
    AttachmentInput, Mailer, MailerConfig, SendOptions, SendOutcome, TemplateVars,
    UnsubscribePolicy,
};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use args::{Cli, Commands, Content};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gunmail=debug,gunmail_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Ok(path) = dotenv::dotenv() {
        debug!(path = %path.display(), "Loaded environment file");
    }

    run(Cli::parse()).await.map_err(with_hint)
}

async fn run(cli: Cli) -> Result<()> {
    let mailer = build_mailer(&cli)?;

    match cli.command {
        Commands::Send {
            to,
            content,
            attachments,
            template,
        } => {
            let body = content.body()?;
            let mut options = SendOptions::new();
            if let Some(template) = template {
                options = options.template(template);
            }
            if !attachments.is_empty() {
                options = options.attachment(
                    attachments
                        .into_iter()
                        .map(AttachmentInput::from)
                        .collect::<AttachmentInput>(),
                );
            }

            let outcome = mailer
                .send(to, &content.subject, body.as_deref(), &TemplateVars::new(), options)
                .await?;
            report(&outcome);
        }
        Commands::Members => {
            for address in mailer.list_addresses().await? {
                println!("{address}");
            }
        }
        Commands::Subscribe {
            address,
            name,
            vars,
        } => {
            let vars: serde_json::Value =
                serde_json::from_str(&vars).context("--vars must be valid JSON")?;
            if !vars.is_object() {
                bail!("--vars must be a JSON object");
            }
            let response = mailer.list_add(&address, &name, vars).await?;
            println!("{}", response.message);
        }
        Commands::Unsubscribe { address } => {
            let response = mailer.list_unsubscribe(&address).await?;
            println!("{}", response.message);
        }
        Commands::Remove { address } => {
            let response = mailer.list_remove(&address).await?;
            println!("{}", response.message);
        }
        Commands::Newsletter { content } => {
            let list = mailer
                .mailing_list()
                .context("--list or MAILGUN_NEWSLETTER is required")?
                .to_string();
            let body = content.body()?.unwrap_or_default();
            let outcome = mailer.list_send(&list, &content.subject, &body).await?;
            report(&outcome);
        }
    }

    Ok(())
}

fn build_mailer(cli: &Cli) -> Result<Mailer> {
    let mut config = MailerConfig::from_env();
    config.test_mode |= cli.test_mode;
    if cli.no_unsubscribe {
        config.unsubscribe = UnsubscribePolicy::Disabled;
    }

    let mut mailer = Mailer::new(config);
    if let Some(path) = &cli.header {
        mailer
            .load_header_template(path)
            .with_context(|| format!("Failed to load header {}", path.display()))?;
    }
    if let Some(path) = &cli.footer {
        mailer
            .load_footer_template(path)
            .with_context(|| format!("Failed to load footer {}", path.display()))?;
    }

    mailer.init()?;
    if let Some(list) = &cli.list {
        mailer.init_mailing_list(list.as_str())?;
    }
    Ok(mailer)
}

/// Adds a credentials hint when Mailgun refused the API key.
fn with_hint(err: anyhow::Error) -> anyhow::Error {
    let unauthorized = matches!(
        err.downcast_ref::<gunmail::Error>(),
        Some(gunmail::Error::Transport(inner)) if inner.is_unauthorized()
    );
    if unauthorized {
        err.context("Mailgun rejected the API key; check MAILGUN_API_KEY and MAILGUN_DOMAIN")
    } else {
        err
    }
}

fn report(outcome: &SendOutcome) {
    match outcome {
        SendOutcome::Sent(response) => {
            info!(id = ?response.id, "Sent");
            println!("{}", response.message);
        }
        SendOutcome::Captured(message) => {
            println!(
                "Test mode: not sent to {} ({} attachment(s))",
                message.to.join(", "),
                message.attachments.len()
            );
        }
    }
}

impl Content {
    fn body(&self) -> Result<Option<String>> {
        match (&self.body, &self.body_file) {
            (Some(body), _) => Ok(Some(body.clone())),
            (None, Some(path)) => std::fs::read_to_string(path)
                .map(Some)
                .with_context(|| format!("Failed to read {}", path.display())),
            (None, None) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_gets_hint() {
        let err = anyhow::Error::from(gunmail::Error::Transport(
            gunmail_http::Error::api_error(401, "Forbidden"),
        ));

        let message = format!("{:#}", with_hint(err));
        assert!(message.starts_with("Mailgun rejected the API key"));
        assert!(message.contains("Forbidden"));
    }

    #[test]
    fn test_other_errors_unchanged() {
        let err = anyhow::Error::from(gunmail::Error::Transport(
            gunmail_http::Error::api_error(400, "'to' parameter is missing"),
        ));

        let message = format!("{:#}", with_hint(err));
        assert!(!message.contains("MAILGUN_API_KEY"));
    }
}
