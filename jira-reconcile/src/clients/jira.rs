//! Jira Cloud REST v3 client.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use super::{
    GatewayError, GatewayResult, GroupGateway, GroupRecord, MembershipGateway, Removal,
    UserGateway, UserRecord,
};
use crate::config::{ConfigError, ProviderConfig};
use crate::context::CallContext;

const API_PREFIX: &str = "rest/api/3";

/// Longest error body kept in a [`GatewayError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// HTTP gateway for users, groups and memberships of one Jira site.
pub struct JiraClient {
    http: Client,
    base: Url,
    email: String,
    token: String,
}

impl std::fmt::Debug for JiraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraClient")
            .field("base", &self.base.as_str())
            .field("email", &self.email)
            .finish()
    }
}

/// Page of `GET /group/bulk`.
#[derive(Debug, Deserialize)]
struct GroupPage {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    values: Vec<GroupRecord>,
}

impl JiraClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut base = config.base_url()?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::InvalidDomain {
                domain: config.domain.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base,
            email: config.email.clone(),
            token: config.token.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let full = format!("{}{}/{}", self.base.path(), API_PREFIX, path);
        url.set_path(&full);
        url
    }

    /// Send `req` with credentials, racing it against cancellation.
    async fn send(
        &self,
        ctx: &CallContext,
        operation: &'static str,
        req: RequestBuilder,
    ) -> GatewayResult<Response> {
        let req = req.basic_auth(&self.email, Some(&self.token));
        match ctx.run(req.send()).await {
            None => Err(GatewayError::Cancelled { operation }),
            Some(Err(e)) => Err(GatewayError::Transport {
                operation,
                source: Box::new(e),
            }),
            Some(Ok(resp)) => {
                debug!("{} -> {}", operation, resp.status());
                Ok(resp)
            }
        }
    }

    /// Turn a non-success response into a status error.
    async fn status_error(
        ctx: &CallContext,
        operation: &'static str,
        resp: Response,
    ) -> GatewayError {
        let status = resp.status().as_u16();
        let mut message = ctx
            .run(resp.text())
            .await
            .and_then(Result::ok)
            .unwrap_or_default();
        if message.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message.truncate(cut);
        }
        GatewayError::Status {
            operation,
            status,
            message,
        }
    }

    async fn json<T: DeserializeOwned>(
        ctx: &CallContext,
        operation: &'static str,
        resp: Response,
    ) -> GatewayResult<T> {
        if !resp.status().is_success() {
            return Err(Self::status_error(ctx, operation, resp).await);
        }
        match ctx.run(resp.json::<T>()).await {
            None => Err(GatewayError::Cancelled { operation }),
            Some(Ok(body)) => Ok(body),
            Some(Err(e)) => Err(GatewayError::Decode {
                operation,
                message: e.to_string(),
            }),
        }
    }

    async fn removal(
        ctx: &CallContext,
        operation: &'static str,
        resp: Response,
    ) -> GatewayResult<Removal> {
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(Removal::AlreadyAbsent),
            s if s.is_success() => Ok(Removal::Removed),
            _ => Err(Self::status_error(ctx, operation, resp).await),
        }
    }
}

#[async_trait]
impl UserGateway for JiraClient {
    #[instrument(skip(self, ctx))]
    async fn create_user(&self, ctx: &CallContext, email: &str) -> GatewayResult<UserRecord> {
        let op = "create user";
        let req = self
            .http
            .post(self.endpoint("user"))
            .json(&json!({ "emailAddress": email }));
        let resp = self.send(ctx, op, req).await?;
        Self::json(ctx, op, resp).await
    }

    #[instrument(skip(self, ctx))]
    async fn fetch_user(
        &self,
        ctx: &CallContext,
        account_id: &str,
        with_groups: bool,
    ) -> GatewayResult<Option<UserRecord>> {
        let op = "get user";
        let mut req = self
            .http
            .get(self.endpoint("user"))
            .query(&[("accountId", account_id)]);
        if with_groups {
            req = req.query(&[("expand", "groups")]);
        }
        let resp = self.send(ctx, op, req).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::json(ctx, op, resp).await.map(Some)
    }

    #[instrument(skip(self, ctx))]
    async fn delete_user(&self, ctx: &CallContext, account_id: &str) -> GatewayResult<Removal> {
        let op = "delete user";
        let req = self
            .http
            .delete(self.endpoint("user"))
            .query(&[("accountId", account_id)]);
        let resp = self.send(ctx, op, req).await?;
        Self::removal(ctx, op, resp).await
    }
}

#[async_trait]
impl GroupGateway for JiraClient {
    #[instrument(skip(self, ctx))]
    async fn create_group(&self, ctx: &CallContext, name: &str) -> GatewayResult<GroupRecord> {
        let op = "create group";
        let req = self
            .http
            .post(self.endpoint("group"))
            .json(&json!({ "name": name }));
        let resp = self.send(ctx, op, req).await?;
        Self::json(ctx, op, resp).await
    }

    #[instrument(skip(self, ctx))]
    async fn fetch_group(
        &self,
        ctx: &CallContext,
        name: &str,
    ) -> GatewayResult<Option<GroupRecord>> {
        let op = "get group";
        let req = self.http.get(self.endpoint("group/bulk")).query(&[
            ("groupName", name),
            ("startAt", "0"),
            ("maxResults", "1"),
        ]);
        let resp = self.send(ctx, op, req).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let page: GroupPage = Self::json(ctx, op, resp).await?;
        if page.total == 0 {
            return Ok(None);
        }
        // The lookup may match loosely; only an exact name is this group
        Ok(page.values.into_iter().next().filter(|g| g.name == name))
    }

    #[instrument(skip(self, ctx))]
    async fn delete_group(&self, ctx: &CallContext, name: &str) -> GatewayResult<Removal> {
        let op = "delete group";
        let req = self
            .http
            .delete(self.endpoint("group"))
            .query(&[("groupname", name)]);
        let resp = self.send(ctx, op, req).await?;
        Self::removal(ctx, op, resp).await
    }
}

#[async_trait]
impl MembershipGateway for JiraClient {
    #[instrument(skip(self, ctx))]
    async fn add_member(
        &self,
        ctx: &CallContext,
        group_name: &str,
        account_id: &str,
    ) -> GatewayResult<GroupRecord> {
        let op = "add group member";
        let req = self
            .http
            .post(self.endpoint("group/user"))
            .query(&[("groupname", group_name)])
            .json(&json!({ "accountId": account_id }));
        let resp = self.send(ctx, op, req).await?;
        Self::json(ctx, op, resp).await
    }

    #[instrument(skip(self, ctx))]
    async fn remove_member(
        &self,
        ctx: &CallContext,
        group_name: &str,
        account_id: &str,
    ) -> GatewayResult<Removal> {
        let op = "remove group member";
        let req = self
            .http
            .delete(self.endpoint("group/user"))
            .query(&[("groupname", group_name), ("accountId", account_id)]);
        let resp = self.send(ctx, op, req).await?;
        Self::removal(ctx, op, resp).await
    }
}
