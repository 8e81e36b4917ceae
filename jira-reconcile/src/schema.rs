//! Tracked attributes per resource kind.

use std::fmt;

use serde::Serialize;

/// Kinds of Jira resources managed by the reconcilers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResourceKind {
    User,
    Group,
    GroupMembership,
}

impl ResourceKind {
    /// Name the resource kind is declared under.
    pub fn type_name(self) -> &'static str {
        match self {
            ResourceKind::User => "jira_user",
            ResourceKind::Group => "jira_group",
            ResourceKind::GroupMembership => "jira_group_membership",
        }
    }

    /// Fields that form the durable identity, in encoding order.
    pub fn key_fields(self) -> &'static [&'static str] {
        match self {
            ResourceKind::User => &["account_id"],
            ResourceKind::Group => &["name"],
            ResourceKind::GroupMembership => &["group_name", "account_id"],
        }
    }

    /// Attributes projected into observed state.
    pub fn schema(self) -> &'static [FieldSchema] {
        match self {
            ResourceKind::User => USER_SCHEMA,
            ResourceKind::Group => GROUP_SCHEMA,
            ResourceKind::GroupMembership => GROUP_MEMBERSHIP_SCHEMA,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Value type of a tracked attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Bool,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => f.write_str("string"),
            FieldType::Bool => f.write_str("bool"),
        }
    }
}

/// How an attribute is sourced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMode {
    /// Declared by the caller. Changing it forces destroy and recreate.
    RequiredForceNew,
    /// Assigned by Jira; may be absent from a record.
    Computed,
}

/// One tracked attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub ty: FieldType,
    pub mode: FieldMode,
    /// Jira may withhold the value (profile visibility), so it may project as null.
    pub hideable: bool,
}

impl FieldSchema {
    const fn required(name: &'static str) -> Self {
        Self {
            name,
            ty: FieldType::String,
            mode: FieldMode::RequiredForceNew,
            hideable: false,
        }
    }

    const fn computed(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            mode: FieldMode::Computed,
            hideable: false,
        }
    }

    const fn hideable(self) -> Self {
        Self {
            hideable: true,
            ..self
        }
    }

    pub fn is_required(&self) -> bool {
        self.mode == FieldMode::RequiredForceNew
    }
}

const USER_SCHEMA: &[FieldSchema] = &[
    FieldSchema::required("email").hideable(),
    FieldSchema::computed("account_id", FieldType::String),
    FieldSchema::computed("account_type", FieldType::String),
    FieldSchema::computed("display_name", FieldType::String),
    FieldSchema::computed("active", FieldType::Bool),
];

const GROUP_SCHEMA: &[FieldSchema] = &[
    FieldSchema::required("name"),
    FieldSchema::computed("group_id", FieldType::String),
];

const GROUP_MEMBERSHIP_SCHEMA: &[FieldSchema] = &[
    FieldSchema::required("group_name"),
    FieldSchema::required("account_id"),
];

/// Look up a field of `kind` by name.
pub fn field(kind: ResourceKind, name: &str) -> Option<&'static FieldSchema> {
    kind.schema().iter().find(|f| f.name == name)
}
