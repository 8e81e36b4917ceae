//! Gateways to the Jira REST API.
//!
//! One capability trait per resource kind. A confirmed "not found" is an
//! outcome (`None`, [`Removal::AlreadyAbsent`]), never a [`GatewayError`].
//! - [`UserGateway`]: users, including their group list
//! - [`GroupGateway`]: groups
//! - [`MembershipGateway`]: adding and removing group members

pub mod jira;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::CallContext;

pub use jira::JiraClient;

/// User as returned by Jira.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub account_id: String,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub active: bool,
    /// Only populated when fetched with groups expanded.
    #[serde(default)]
    pub groups: GroupList,
}

impl UserRecord {
    pub fn is_member_of(&self, group_name: &str) -> bool {
        self.groups.items.iter().any(|g| g.name == group_name)
    }
}

/// Expanded group list of a user.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GroupList {
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub items: Vec<GroupRecord>,
}

/// Group as returned by Jira.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub name: String,
    #[serde(default)]
    pub group_id: Option<String>,
}

/// Outcome of a delete call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    /// The resource did not exist.
    AlreadyAbsent,
}

/// Failure to complete a gateway call. Presence of the resource is unknown.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request did not complete.
    #[error("{operation} failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Jira answered with an unexpected status.
    #[error("{operation} returned status {status}: {message}")]
    Status {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// The response body could not be understood.
    #[error("{operation} returned an unreadable body: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    /// The call was cancelled before it completed.
    #[error("{operation} cancelled")]
    Cancelled { operation: &'static str },
}

impl GatewayError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GatewayError::Cancelled { .. })
    }
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

#[async_trait]
pub trait UserGateway: Send + Sync {
    /// Create a user from its email address.
    async fn create_user(&self, ctx: &CallContext, email: &str) -> GatewayResult<UserRecord>;

    /// Fetch a user by account id, optionally with its group list.
    async fn fetch_user(
        &self,
        ctx: &CallContext,
        account_id: &str,
        with_groups: bool,
    ) -> GatewayResult<Option<UserRecord>>;

    async fn delete_user(&self, ctx: &CallContext, account_id: &str) -> GatewayResult<Removal>;
}

#[async_trait]
pub trait GroupGateway: Send + Sync {
    async fn create_group(&self, ctx: &CallContext, name: &str) -> GatewayResult<GroupRecord>;

    async fn fetch_group(&self, ctx: &CallContext, name: &str)
        -> GatewayResult<Option<GroupRecord>>;

    async fn delete_group(&self, ctx: &CallContext, name: &str) -> GatewayResult<Removal>;
}

#[async_trait]
pub trait MembershipGateway: Send + Sync {
    /// Add a user to a group. Returns the group.
    async fn add_member(
        &self,
        ctx: &CallContext,
        group_name: &str,
        account_id: &str,
    ) -> GatewayResult<GroupRecord>;

    async fn remove_member(
        &self,
        ctx: &CallContext,
        group_name: &str,
        account_id: &str,
    ) -> GatewayResult<Removal>;
}
