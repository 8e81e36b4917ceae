//! Provider configuration.
//!
//! Resolved once at start-up and handed to the Jira client; never mutated
//! afterwards.

use std::fmt;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

/// Default request timeout for Jira calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("provider setting `{0}` must not be empty")]
    Missing(&'static str),

    #[error("invalid Jira domain {domain:?}: {reason}")]
    InvalidDomain { domain: String, reason: String },
}

/// Credentials and endpoint of the Jira site.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Site domain (`example.atlassian.net`) or full base URL.
    pub domain: String,
    /// Email of the API user.
    pub email: String,
    /// API token of the API user.
    pub token: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("domain", &self.domain)
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ProviderConfig {
    pub fn new(
        domain: impl Into<String>,
        email: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            email: email.into(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("domain", &self.domain),
            ("email", &self.email),
            ("token", &self.token),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(name));
            }
        }
        self.base_url().map(|_| ())
    }

    /// Base URL of the site. A bare domain is served over https.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let domain = self.domain.trim().trim_end_matches('/');
        let raw = if domain.contains("://") {
            domain.to_string()
        } else {
            format!("https://{domain}")
        };

        let invalid = |reason: String| ConfigError::InvalidDomain {
            domain: self.domain.clone(),
            reason,
        };

        let url = Url::parse(&raw).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "https" | "http" => {}
            other => return Err(invalid(format!("unsupported scheme {other}"))),
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }
        Ok(url)
    }
}
