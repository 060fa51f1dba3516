//! reqwest-based [`Transport`] implementation.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::member::{Member, MemberResponse, MemberUpdate, NewMember};
use crate::message::{OutboundMessage, SendResponse};
use crate::options::ConnectionOptions;
use crate::transport::Transport;

/// Page size requested when listing members.
const MEMBER_PAGE_LIMIT: u32 = 100;

/// Mailgun HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClient {
    options: ConnectionOptions,
    base_url: Url,
    http_client: Client,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
struct MemberPage {
    #[serde(default)]
    items: Vec<Member>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    next: Option<String>,
}

impl HttpClient {
    /// Creates a client from connection options.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid or the HTTP client
    /// cannot be built.
    pub fn new(options: ConnectionOptions) -> Result<Self> {
        options.validate()?;
        let base_url = options.base_url()?;

        let mut builder = Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        debug!(base_url = %base_url, "Created Mailgun client");

        Ok(Self {
            options,
            base_url,
            http_client,
        })
    }

    /// Returns the connection options.
    #[must_use]
    pub const fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// Returns the base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds an endpoint URL from path segments, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidConfig(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.options.username, Some(&self.options.key))
    }

    /// Converts a non-success response into [`Error::Api`].
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await?;
        let message = serde_json::from_str::<ApiMessage>(&body)
            .map_or_else(|_| body.trim().to_string(), |m| m.message);

        warn!(status = status.as_u16(), %message, "Mailgun rejected request");
        Err(Error::api_error(status.as_u16(), message))
    }

    fn message_form(message: &OutboundMessage) -> Form {
        let mut form = Form::new();
        for (name, value) in message.form_fields() {
            form = form.text(name, value);
        }
        for attachment in &message.attachments {
            let part = Part::bytes(attachment.data.to_vec()).file_name(attachment.filename.clone());
            form = form.part("attachment", part);
        }
        form
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn send_message(&self, domain: &str, message: &OutboundMessage) -> Result<SendResponse> {
        let url = self.endpoint(&[domain, "messages"])?;
        debug!(
            domain,
            recipients = message.to.len(),
            attachments = message.attachments.len(),
            "Sending message"
        );

        let response = self
            .authorized(self.http_client.post(url))
            .multipart(Self::message_form(message))
            .send()
            .await?;

        Self::check(response).await?.json().await.map_err(Into::into)
    }

    async fn list_members(&self, list: &str) -> Result<Vec<Member>> {
        let mut url = self.endpoint(&["lists", list, "members", "pages"])?;
        url.query_pairs_mut()
            .append_pair("limit", &MEMBER_PAGE_LIMIT.to_string());

        let mut members = Vec::new();
        loop {
            debug!(list, url = %url, "Fetching member page");
            let response = self
                .authorized(self.http_client.get(url.clone()))
                .send()
                .await?;
            let page: MemberPage = Self::check(response).await?.json().await?;

            if page.items.is_empty() {
                break;
            }
            members.extend(page.items);

            let Some(next) = page.paging.and_then(|p| p.next) else {
                break;
            };
            let next = Url::parse(&next)?;
            if next == url {
                break;
            }
            url = next;
        }

        Ok(members)
    }

    async fn create_member(&self, list: &str, member: &NewMember) -> Result<MemberResponse> {
        let url = self.endpoint(&["lists", list, "members"])?;
        debug!(list, "Creating list member");

        let response = self
            .authorized(self.http_client.post(url))
            .form(&member.form_fields())
            .send()
            .await?;

        Self::check(response).await?.json().await.map_err(Into::into)
    }

    async fn create_members(
        &self,
        list: &str,
        members: &[NewMember],
        upsert: bool,
    ) -> Result<MemberResponse> {
        let url = self.endpoint(&["lists", list, "members.json"])?;
        debug!(list, count = members.len(), upsert, "Creating list members");

        let params = [
            ("members", serde_json::to_string(members)?),
            ("upsert", if upsert { "yes" } else { "no" }.to_string()),
        ];

        let response = self
            .authorized(self.http_client.post(url))
            .form(&params)
            .send()
            .await?;

        Self::check(response).await?.json().await.map_err(Into::into)
    }

    async fn update_member(
        &self,
        list: &str,
        address: &str,
        update: &MemberUpdate,
    ) -> Result<MemberResponse> {
        let url = self.endpoint(&["lists", list, "members", address])?;
        debug!(list, "Updating list member");

        let response = self
            .authorized(self.http_client.put(url))
            .form(&update.form_fields())
            .send()
            .await?;

        Self::check(response).await?.json().await.map_err(Into::into)
    }

    async fn delete_member(&self, list: &str, address: &str) -> Result<MemberResponse> {
        let url = self.endpoint(&["lists", list, "members", address])?;
        debug!(list, "Deleting list member");

        let response = self
            .authorized(self.http_client.delete(url))
            .send()
            .await?;

        Self::check(response).await?.json().await.map_err(Into::into)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(url: &str) -> HttpClient {
        HttpClient::new(ConnectionOptions::new("key-test").with_url(url)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let client = client("https://api.mailgun.net/v3");
        let url = client.endpoint(&["mg.example.com", "messages"]).unwrap();
        assert_eq!(url.as_str(), "https://api.mailgun.net/v3/mg.example.com/messages");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = client("http://localhost:9000/v3/");
        let url = client
            .endpoint(&["lists", "news@example.com", "members", "a b@example.com"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9000/v3/lists/news@example.com/members/a%20b@example.com"
        );
    }

    #[test]
    fn test_new_rejects_empty_key() {
        let result = HttpClient::new(ConnectionOptions::new(""));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_timeout_is_kept() {
        let options = ConnectionOptions::new("key").with_timeout(std::time::Duration::from_secs(5));
        let client = HttpClient::new(options).unwrap();
        assert_eq!(
            client.options().timeout,
            Some(std::time::Duration::from_secs(5))
        );
    }
}
