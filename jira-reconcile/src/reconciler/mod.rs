//! Reconcilers for the managed Jira resource kinds.
//!
//! Each reconciler drives one kind through create, read, update, delete and
//! import. Every declared attribute is force-new, so `update` never contacts
//! Jira; drift in a declared attribute is resolved by destroy and recreate.
//!
//! Callers must not run two lifecycle calls against the same identity at the
//! same time. Nothing here locks.

pub mod group;
pub mod membership;
pub mod user;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clients::{GatewayError, GatewayResult, Removal};
use crate::context::CallContext;
use crate::identity::{Identity, IdentityError};
use crate::projector::{ObservedState, ProjectionError};
use crate::schema::ResourceKind;

pub use group::{GroupReconciler, GroupSpec};
pub use membership::{MembershipReconciler, MembershipSpec};
pub use user::{UserReconciler, UserSpec};

/// Lifecycle operation, used to label errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => f.write_str("create"),
            Operation::Read => f.write_str("read"),
            Operation::Delete => f.write_str("delete"),
        }
    }
}

/// Errors surfaced by a reconciler. A confirmed "not found" is never one.
#[derive(Debug, Error)]
pub enum Error {
    /// A required attribute of the desired spec is missing.
    #[error("{kind}: required attribute `{field}` is missing")]
    IncompleteSpec {
        kind: ResourceKind,
        field: &'static str,
    },

    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Jira accepted the create but the resource could not be read back.
    #[error("{kind} {identity}: created but not found when read back")]
    CreatePostconditionFailed {
        kind: ResourceKind,
        identity: Identity,
    },

    /// Jira accepted the create but the confirming read failed. The
    /// identity is valid and must be tracked.
    #[error("{kind} {identity}: created but the confirming read failed: {source}")]
    Unconfirmed {
        kind: ResourceKind,
        identity: Identity,
        #[source]
        source: Box<Error>,
    },

    /// The gateway failed; presence of the resource is unknown.
    #[error("{kind} {operation}: {source}")]
    Remote {
        kind: ResourceKind,
        operation: Operation,
        #[source]
        source: GatewayError,
    },

    #[error("{kind} {operation} cancelled")]
    Cancelled {
        kind: ResourceKind,
        operation: Operation,
    },

    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

impl Error {
    fn remote(kind: ResourceKind, operation: Operation, source: GatewayError) -> Self {
        if source.is_cancelled() {
            Error::Cancelled { kind, operation }
        } else {
            Error::Remote {
                kind,
                operation,
                source,
            }
        }
    }

    /// Identity the orchestrator must keep tracking despite the error.
    pub fn created_identity(&self) -> Option<&Identity> {
        match self {
            Error::Unconfirmed { identity, .. } => Some(identity),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Result of a read.
#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    Present(ObservedState),
    /// Confirmed gone. The caller clears tracking.
    Absent,
}

impl Observed {
    pub fn is_absent(&self) -> bool {
        matches!(self, Observed::Absent)
    }

    pub fn into_state(self) -> Option<ObservedState> {
        match self {
            Observed::Present(state) => Some(state),
            Observed::Absent => None,
        }
    }
}

/// A resource that was created and read back.
#[derive(Debug, Clone, PartialEq)]
pub struct Created {
    pub identity: Identity,
    pub state: ObservedState,
}

/// Lifecycle contract of one resource kind.
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// Desired attributes declared by the caller.
    type Spec: Send + Sync;

    fn kind(&self) -> ResourceKind;

    /// Create the resource and confirm it with a read.
    async fn create(&self, ctx: &CallContext, spec: &Self::Spec) -> Result<Created>;

    /// Refresh observed state. Absence is an outcome, not an error.
    async fn read(&self, ctx: &CallContext, id: &Identity) -> Result<Observed>;

    /// Delete the resource. Already gone counts as success.
    async fn delete(&self, ctx: &CallContext, id: &Identity) -> Result<()>;

    /// All attributes are force-new; nothing to apply in place.
    async fn update(&self, _ctx: &CallContext, id: &Identity, _spec: &Self::Spec) -> Result<()> {
        debug!("Update of {} {} is a no-op", self.kind(), id);
        Ok(())
    }

    /// Start tracking an existing resource.
    async fn import(&self, ctx: &CallContext, id: &Identity) -> Result<Observed> {
        self.read(ctx, id).await
    }
}

/// Fail fast when the call was cancelled before any remote effect.
fn ensure_live(ctx: &CallContext, kind: ResourceKind, operation: Operation) -> Result<()> {
    if ctx.is_cancelled() {
        return Err(Error::Cancelled { kind, operation });
    }
    Ok(())
}

/// Reject an empty required attribute of a desired spec.
fn require(kind: ResourceKind, field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::IncompleteSpec { kind, field });
    }
    Ok(())
}

/// Read back a freshly created resource.
async fn confirm<R>(reconciler: &R, ctx: &CallContext, identity: Identity) -> Result<Created>
where
    R: Reconciler + ?Sized,
{
    let kind = reconciler.kind();
    match reconciler.read(ctx, &identity).await {
        Ok(Observed::Present(state)) => {
            info!("Created {} {}", kind, identity);
            Ok(Created { identity, state })
        }
        Ok(Observed::Absent) => {
            warn!("{} {} missing right after create", kind, identity);
            Err(Error::CreatePostconditionFailed { kind, identity })
        }
        Err(source) => Err(Error::Unconfirmed {
            kind,
            identity,
            source: Box::new(source),
        }),
    }
}

/// Log and map the outcome of a delete call.
fn removed(
    kind: ResourceKind,
    id: &Identity,
    outcome: GatewayResult<Removal>,
) -> Result<()> {
    match outcome {
        Ok(Removal::Removed) => {
            info!("Deleted {} {}", kind, id);
            Ok(())
        }
        Ok(Removal::AlreadyAbsent) => {
            info!("{} {} already gone", kind, id);
            Ok(())
        }
        Err(e) => Err(Error::remote(kind, Operation::Delete, e)),
    }
}
