//! jira-reconcile: keeps declared Jira users, groups and group memberships
//! in step with a Jira Cloud site.
//!
//! - [`identity`]: durable identity codec
//! - [`clients`]: per-kind gateways and the HTTP client
//! - [`projector`]: remote record to observed state
//! - [`reconciler`]: create/read/update/delete/import per kind

pub mod clients;
pub mod config;
pub mod context;
pub mod identity;
pub mod projector;
pub mod provider;
pub mod reconciler;
pub mod schema;

pub use config::{ConfigError, ProviderConfig};
pub use context::CallContext;
pub use identity::{Identity, IdentityError};
pub use projector::{ObservedState, ProjectionError};
pub use provider::Provider;
pub use reconciler::{Created, Error, Observed, Reconciler};
pub use schema::ResourceKind;
