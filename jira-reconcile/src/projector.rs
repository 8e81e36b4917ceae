//! Projection of remote records onto tracked attributes.
//!
//! Every attribute write is validated on its own. Failures are collected and
//! reported together once all attributes have been attempted.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::schema::{self, FieldSchema, FieldType, ResourceKind};

/// Attribute values observed on the remote side.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ObservedState {
    attributes: BTreeMap<&'static str, Value>,
}

impl ObservedState {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// A single rejected attribute write.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub cause: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.cause)
    }
}

/// All attribute writes that failed during one projection.
#[derive(Debug, Clone, Error)]
#[error("{} attribute(s) of {kind} could not be set: {}", .failures.len(), join(.failures))]
pub struct ProjectionError {
    kind: ResourceKind,
    failures: Vec<FieldError>,
    projected: ObservedState,
}

impl ProjectionError {
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn failures(&self) -> &[FieldError] {
        &self.failures
    }

    /// Attributes that were written successfully.
    pub fn projected(&self) -> &ObservedState {
        &self.projected
    }
}

fn join(failures: &[FieldError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Accumulates attribute writes for one resource kind.
pub struct Projector {
    kind: ResourceKind,
    state: ObservedState,
    failures: Vec<FieldError>,
}

impl Projector {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            state: ObservedState::default(),
            failures: Vec::new(),
        }
    }

    /// Write one attribute. A rejected write is recorded, never raised.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        match schema::field(self.kind, name) {
            None => self.reject(name, "not a tracked attribute".to_string()),
            Some(field) => match check(field, &value) {
                Ok(()) => {
                    self.state.attributes.insert(field.name, value);
                }
                Err(cause) => self.reject(name, cause),
            },
        }
        self
    }

    fn reject(&mut self, name: &str, cause: String) {
        self.failures.push(FieldError {
            field: name.to_string(),
            cause,
        });
    }

    /// Finish the projection. Errors only after every write was attempted.
    pub fn finish(self) -> Result<ObservedState, ProjectionError> {
        if self.failures.is_empty() {
            Ok(self.state)
        } else {
            Err(ProjectionError {
                kind: self.kind,
                failures: self.failures,
                projected: self.state,
            })
        }
    }
}

fn check(field: &FieldSchema, value: &Value) -> Result<(), String> {
    match (field.ty, value) {
        (_, Value::Null) if field.is_required() && !field.hideable => {
            Err("value is required".to_string())
        }
        (_, Value::Null) => Ok(()),
        (FieldType::String, Value::String(s)) if field.is_required() && s.is_empty() => {
            Err("value is required".to_string())
        }
        (FieldType::String, Value::String(_)) | (FieldType::Bool, Value::Bool(_)) => Ok(()),
        (expected, other) => Err(format!("expected {expected}, got {}", type_of(other))),
    }
}

fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn projects_group_record() {
        let mut p = Projector::new(ResourceKind::Group);
        p.set("group_id", "abc").set("name", "eng");
        let state = p.finish().unwrap();

        assert_eq!(state.len(), 2);
        assert_eq!(state.get_str("group_id"), Some("abc"));
        assert_eq!(state.get_str("name"), Some("eng"));
    }

    #[test]
    fn failed_write_does_not_stop_later_writes() {
        let mut p = Projector::new(ResourceKind::Group);
        p.set("group_id", json!(42)).set("name", "eng");
        let err = p.finish().unwrap_err();

        assert_eq!(err.failures().len(), 1);
        assert_eq!(err.failures()[0].field, "group_id");
        assert_eq!(err.failures()[0].cause, "expected string, got number");
        assert_eq!(err.projected().get_str("name"), Some("eng"));
        assert!(err.projected().get("group_id").is_none());

        let msg = err.to_string();
        assert!(msg.contains("group_id: expected string, got number"), "{msg}");
        assert!(msg.starts_with("1 attribute(s) of jira_group"), "{msg}");
    }

    #[test]
    fn every_failure_is_reported() {
        let mut p = Projector::new(ResourceKind::User);
        p.set("email", "")
            .set("active", "yes")
            .set("nickname", "bob")
            .set("account_id", "acct-1");
        let err = p.finish().unwrap_err();

        let fields: Vec<_> = err.failures().iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, ["email", "active", "nickname"]);
        assert_eq!(err.failures()[2].cause, "not a tracked attribute");
        assert_eq!(err.projected().get_str("account_id"), Some("acct-1"));
    }

    #[test]
    fn computed_fields_accept_null() {
        let mut p = Projector::new(ResourceKind::User);
        p.set("email", "a@example.com")
            .set("display_name", Value::Null)
            .set("active", true);
        let state = p.finish().unwrap();

        assert_eq!(state.get("display_name"), Some(&Value::Null));
        assert_eq!(state.get_bool("active"), Some(true));
    }

    #[test]
    fn hidden_email_projects_as_null() {
        let mut p = Projector::new(ResourceKind::User);
        p.set("email", Value::Null).set("account_id", "acct-1");
        let state = p.finish().unwrap();

        assert_eq!(state.get("email"), Some(&Value::Null));
        assert_eq!(state.get_str("account_id"), Some("acct-1"));
    }

    #[test]
    fn required_null_is_rejected() {
        let mut p = Projector::new(ResourceKind::Group);
        p.set("name", Value::Null);
        let err = p.finish().unwrap_err();
        assert_eq!(err.failures()[0].field, "name");
        assert_eq!(err.failures()[0].cause, "value is required");
    }

    #[test]
    fn required_fields_reject_empty_string() {
        let mut p = Projector::new(ResourceKind::GroupMembership);
        p.set("group_name", "").set("account_id", "acct-1");
        let err = p.finish().unwrap_err();
        assert_eq!(err.failures()[0].field, "group_name");
        assert_eq!(err.failures()[0].cause, "value is required");
    }
}
