//! Group membership reconciler.
//!
//! A membership has no record of its own in Jira. It exists while the
//! user's expanded group list contains the group name.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{
    confirm, ensure_live, removed, require, Created, Error, Observed, Operation, Reconciler,
    Result,
};
use crate::clients::{MembershipGateway, UserGateway};
use crate::context::CallContext;
use crate::identity::{self, Identity};
use crate::projector::Projector;
use crate::schema::ResourceKind;

const KIND: ResourceKind = ResourceKind::GroupMembership;

/// Desired membership of one user in one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipSpec {
    pub group_name: String,
    pub account_id: String,
}

impl MembershipSpec {
    pub fn new(group_name: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            account_id: account_id.into(),
        }
    }
}

/// Membership reconciler. The identity is `group_name:account_id`.
pub struct MembershipReconciler<G> {
    gateway: Arc<G>,
}

impl<G: MembershipGateway + UserGateway> MembershipReconciler<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl<G: MembershipGateway + UserGateway> Reconciler for MembershipReconciler<G> {
    type Spec = MembershipSpec;

    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn create(&self, ctx: &CallContext, spec: &Self::Spec) -> Result<Created> {
        require(KIND, "group_name", &spec.group_name)?;
        require(KIND, "account_id", &spec.account_id)?;
        let id = identity::encode(
            KIND,
            &[spec.group_name.as_str(), spec.account_id.as_str()],
        )?;
        ensure_live(ctx, KIND, Operation::Create)?;

        info!("Adding {} to group {}", spec.account_id, spec.group_name);
        self.gateway
            .add_member(ctx, &spec.group_name, &spec.account_id)
            .await
            .map_err(|e| Error::remote(KIND, Operation::Create, e))?;

        confirm(self, ctx, id).await
    }

    async fn read(&self, ctx: &CallContext, id: &Identity) -> Result<Observed> {
        let [group_name, account_id] = identity::decode::<2>(KIND, id)?;
        ensure_live(ctx, KIND, Operation::Read)?;

        let user = self
            .gateway
            .fetch_user(ctx, account_id, true)
            .await
            .map_err(|e| Error::remote(KIND, Operation::Read, e))?;

        let Some(user) = user else {
            warn!("User {} of membership {} not found in Jira", account_id, id);
            return Ok(Observed::Absent);
        };
        if !user.is_member_of(group_name) {
            warn!("User {} is no longer in group {}", account_id, group_name);
            return Ok(Observed::Absent);
        }

        let mut p = Projector::new(KIND);
        p.set("group_name", group_name).set("account_id", account_id);
        Ok(Observed::Present(p.finish()?))
    }

    async fn delete(&self, ctx: &CallContext, id: &Identity) -> Result<()> {
        let [group_name, account_id] = identity::decode::<2>(KIND, id)?;
        ensure_live(ctx, KIND, Operation::Delete)?;

        info!("Removing {} from group {}", account_id, group_name);
        let outcome = self.gateway.remove_member(ctx, group_name, account_id).await;
        removed(KIND, id, outcome)
    }
}
