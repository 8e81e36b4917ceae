//! User reconciler - manages Jira users by email address.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{
    confirm, ensure_live, removed, require, Created, Error, Observed, Operation, Reconciler,
    Result,
};
use crate::clients::{UserGateway, UserRecord};
use crate::context::CallContext;
use crate::identity::{self, Identity};
use crate::projector::{ObservedState, ProjectionError, Projector};
use crate::schema::ResourceKind;

const KIND: ResourceKind = ResourceKind::User;

/// Desired user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSpec {
    pub email: String,
}

impl UserSpec {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}

/// User reconciler. The identity is the Jira account id.
pub struct UserReconciler<G> {
    gateway: Arc<G>,
}

impl<G: UserGateway> UserReconciler<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }
}

fn project(user: &UserRecord) -> std::result::Result<ObservedState, ProjectionError> {
    let mut p = Projector::new(KIND);
    p.set("account_id", user.account_id.as_str())
        .set("account_type", user.account_type.clone())
        .set("email", user.email_address.clone())
        .set("display_name", user.display_name.clone())
        .set("active", user.active);
    p.finish()
}

#[async_trait]
impl<G: UserGateway> Reconciler for UserReconciler<G> {
    type Spec = UserSpec;

    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn create(&self, ctx: &CallContext, spec: &Self::Spec) -> Result<Created> {
        require(KIND, "email", &spec.email)?;
        ensure_live(ctx, KIND, Operation::Create)?;

        info!("Creating user {}", spec.email);
        let user = self
            .gateway
            .create_user(ctx, &spec.email)
            .await
            .map_err(|e| Error::remote(KIND, Operation::Create, e))?;

        let id = identity::encode(KIND, &[user.account_id.as_str()])?;
        confirm(self, ctx, id).await
    }

    async fn read(&self, ctx: &CallContext, id: &Identity) -> Result<Observed> {
        let [account_id] = identity::decode::<1>(KIND, id)?;
        ensure_live(ctx, KIND, Operation::Read)?;

        let user = self
            .gateway
            .fetch_user(ctx, account_id, false)
            .await
            .map_err(|e| Error::remote(KIND, Operation::Read, e))?;

        match user {
            Some(user) => Ok(Observed::Present(project(&user)?)),
            None => {
                warn!("User {} not found in Jira", id);
                Ok(Observed::Absent)
            }
        }
    }

    async fn delete(&self, ctx: &CallContext, id: &Identity) -> Result<()> {
        let [account_id] = identity::decode::<1>(KIND, id)?;
        ensure_live(ctx, KIND, Operation::Delete)?;

        info!("Deleting user {}", id);
        let outcome = self.gateway.delete_user(ctx, account_id).await;
        removed(KIND, id, outcome)
    }
}
