//! Durable identity codec.
//!
//! Every tracked resource is addressed by one identity string. Single-key
//! kinds use the remote key as-is; group memberships join the group name and
//! the account id with [`SEPARATOR`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::ResourceKind;

/// Separator between the keys of a composite identity.
pub const SEPARATOR: &str = ":";

/// Opaque identity of one remote resource within its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Wrap an identity string as stored by the orchestrator.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Identity {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Errors produced while encoding or decoding an identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// A key value cannot take part in an identity.
    #[error("invalid {kind} key `{field}`: {reason}")]
    InvalidKey {
        kind: ResourceKind,
        field: &'static str,
        reason: &'static str,
    },

    /// The identity does not split into the keys of its kind.
    #[error("malformed {kind} identity {identity:?}: expected {expected} component(s) separated by ':', found {found}")]
    MalformedIdentity {
        kind: ResourceKind,
        identity: String,
        expected: usize,
        found: usize,
    },
}

/// Encode the ordered key values of `kind` into an identity.
///
/// Only the last key may contain [`SEPARATOR`]; decoding splits off the
/// leading keys and hands the remainder to the last one.
pub fn encode(kind: ResourceKind, keys: &[&str]) -> Result<Identity, IdentityError> {
    let fields = kind.key_fields();
    if keys.len() != fields.len() {
        return Err(IdentityError::MalformedIdentity {
            kind,
            identity: keys.join(SEPARATOR),
            expected: fields.len(),
            found: keys.len(),
        });
    }

    let last = keys.len() - 1;
    for (idx, (key, field)) in keys.iter().zip(fields.iter().copied()).enumerate() {
        if key.is_empty() {
            return Err(IdentityError::InvalidKey {
                kind,
                field,
                reason: "must not be empty",
            });
        }
        if idx != last && key.contains(SEPARATOR) {
            return Err(IdentityError::InvalidKey {
                kind,
                field,
                reason: "must not contain ':'",
            });
        }
    }

    Ok(Identity(keys.join(SEPARATOR)))
}

/// Decode an identity of `kind` back into exactly `N` keys.
pub fn decode<const N: usize>(
    kind: ResourceKind,
    identity: &Identity,
) -> Result<[&str; N], IdentityError> {
    let expected = kind.key_fields().len();
    let raw = identity.as_str();
    let found = raw.split(SEPARATOR).filter(|part| !part.is_empty()).count();

    let malformed = || IdentityError::MalformedIdentity {
        kind,
        identity: raw.to_string(),
        expected,
        found,
    };

    if N != expected {
        return Err(malformed());
    }

    let mut keys = [""; N];
    let mut parts = raw.splitn(N, SEPARATOR);
    for slot in keys.iter_mut() {
        match parts.next() {
            Some(part) if !part.is_empty() => *slot = part,
            _ => return Err(malformed()),
        }
    }

    Ok(keys)
}
