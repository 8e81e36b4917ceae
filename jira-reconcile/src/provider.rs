//! Configured provider: one Jira client shared by all reconcilers.

use std::sync::Arc;

use tracing::info;

use crate::clients::JiraClient;
use crate::config::{ConfigError, ProviderConfig};
use crate::reconciler::{GroupReconciler, MembershipReconciler, UserReconciler};
use crate::schema::ResourceKind;

/// Resource kinds served by the provider.
pub const RESOURCE_KINDS: [ResourceKind; 3] = [
    ResourceKind::User,
    ResourceKind::Group,
    ResourceKind::GroupMembership,
];

/// Provider built once at start-up from a validated configuration.
#[derive(Debug)]
pub struct Provider {
    config: ProviderConfig,
    client: Arc<JiraClient>,
}

impl Provider {
    /// Validate `config` and build the Jira client.
    pub fn configure(config: ProviderConfig) -> Result<Self, ConfigError> {
        let client = JiraClient::new(&config)?;
        info!("Configured Jira provider for {}", config.domain);
        Ok(Self {
            config,
            client: Arc::new(client),
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn users(&self) -> UserReconciler<JiraClient> {
        UserReconciler::new(Arc::clone(&self.client))
    }

    pub fn groups(&self) -> GroupReconciler<JiraClient> {
        GroupReconciler::new(Arc::clone(&self.client))
    }

    pub fn memberships(&self) -> MembershipReconciler<JiraClient> {
        MembershipReconciler::new(Arc::clone(&self.client))
    }
}
