//! The transport seam between the mailer and the provider.

use async_trait::async_trait;

use crate::error::Result;
use crate::member::{Member, MemberResponse, MemberUpdate, NewMember};
use crate::message::{OutboundMessage, SendResponse};

/// Async transport for message and mailing-list operations.
///
/// [`HttpClient`](crate::HttpClient) talks to the real API; implement this
/// trait to plug in a different backend or a test double.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends a message from the given domain.
    async fn send_message(&self, domain: &str, message: &OutboundMessage) -> Result<SendResponse>;

    /// Fetches every member of a list.
    async fn list_members(&self, list: &str) -> Result<Vec<Member>>;

    /// Adds a member to a list.
    async fn create_member(&self, list: &str, member: &NewMember) -> Result<MemberResponse>;

    /// Adds several members to a list in one request.
    async fn create_members(
        &self,
        list: &str,
        members: &[NewMember],
        upsert: bool,
    ) -> Result<MemberResponse>;

    /// Updates a member of a list.
    async fn update_member(
        &self,
        list: &str,
        address: &str,
        update: &MemberUpdate,
    ) -> Result<MemberResponse>;

    /// Deletes a member from a list.
    async fn delete_member(&self, list: &str, address: &str) -> Result<MemberResponse>;
}
