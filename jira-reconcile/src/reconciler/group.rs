//! Group reconciler - manages Jira groups by name.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{
    confirm, ensure_live, removed, require, Created, Error, Observed, Operation, Reconciler,
    Result,
};
use crate::clients::GroupGateway;
use crate::context::CallContext;
use crate::identity::{self, Identity};
use crate::projector::Projector;
use crate::schema::ResourceKind;

const KIND: ResourceKind = ResourceKind::Group;

/// Desired group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
}

impl GroupSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Group reconciler. The identity is the group name.
pub struct GroupReconciler<G> {
    gateway: Arc<G>,
}

impl<G: GroupGateway> GroupReconciler<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl<G: GroupGateway> Reconciler for GroupReconciler<G> {
    type Spec = GroupSpec;

    fn kind(&self) -> ResourceKind {
        KIND
    }

    async fn create(&self, ctx: &CallContext, spec: &Self::Spec) -> Result<Created> {
        require(KIND, "name", &spec.name)?;
        ensure_live(ctx, KIND, Operation::Create)?;

        info!("Creating group {}", spec.name);
        let group = self
            .gateway
            .create_group(ctx, &spec.name)
            .await
            .map_err(|e| Error::remote(KIND, Operation::Create, e))?;

        let id = identity::encode(KIND, &[group.name.as_str()])?;
        confirm(self, ctx, id).await
    }

    async fn read(&self, ctx: &CallContext, id: &Identity) -> Result<Observed> {
        let [name] = identity::decode::<1>(KIND, id)?;
        ensure_live(ctx, KIND, Operation::Read)?;

        let Some(group) = self
            .gateway
            .fetch_group(ctx, name)
            .await
            .map_err(|e| Error::remote(KIND, Operation::Read, e))?
        else {
            warn!("Group {} not found in Jira", id);
            return Ok(Observed::Absent);
        };

        let mut p = Projector::new(KIND);
        p.set("group_id", group.group_id).set("name", group.name);
        Ok(Observed::Present(p.finish()?))
    }

    async fn delete(&self, ctx: &CallContext, id: &Identity) -> Result<()> {
        let [name] = identity::decode::<1>(KIND, id)?;
        ensure_live(ctx, KIND, Operation::Delete)?;

        info!("Deleting group {}", id);
        let outcome = self.gateway.delete_group(ctx, name).await;
        removed(KIND, id, outcome)
    }
}
