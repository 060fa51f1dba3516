//! Mailing-list member records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A member of a mailing list, as returned by the provider.
///
/// Every field is optional: the provider occasionally returns partial
/// records and callers are expected to tolerate them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Member email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Subscription state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribed: Option<bool>,
    /// Arbitrary member data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vars: Option<Value>,
}

/// Payload for adding a member to a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMember {
    /// Subscription state (new members are subscribed).
    pub subscribed: bool,
    /// Member email address.
    pub address: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Arbitrary member data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vars: Option<Value>,
}

impl NewMember {
    /// Creates a subscribed member.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            subscribed: true,
            address: address.into(),
            name: None,
            vars: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets member data.
    #[must_use]
    pub fn with_vars(mut self, vars: Value) -> Self {
        self.vars = Some(vars);
        self
    }

    pub(crate) fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("address", self.address.clone()),
            ("subscribed", yes_no(self.subscribed).to_string()),
        ];
        if let Some(name) = &self.name {
            fields.push(("name", name.clone()));
        }
        if let Some(vars) = &self.vars {
            fields.push(("vars", vars.to_string()));
        }
        fields
    }
}

/// Payload for updating an existing member. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberUpdate {
    /// New email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New subscription state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribed: Option<bool>,
    /// New member data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vars: Option<Value>,
}

impl MemberUpdate {
    /// An update that only flips the member to unsubscribed.
    #[must_use]
    pub fn unsubscribe() -> Self {
        Self {
            subscribed: Some(false),
            ..Self::default()
        }
    }

    pub(crate) fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some(address) = &self.address {
            fields.push(("address", address.clone()));
        }
        if let Some(name) = &self.name {
            fields.push(("name", name.clone()));
        }
        if let Some(subscribed) = self.subscribed {
            fields.push(("subscribed", yes_no(subscribed).to_string()));
        }
        if let Some(vars) = &self.vars {
            fields.push(("vars", vars.to_string()));
        }
        fields
    }
}

/// Provider response to a member operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberResponse {
    /// The affected member, when the provider echoes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<Member>,
    /// Status message.
    #[serde(default)]
    pub message: String,
}

const fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
