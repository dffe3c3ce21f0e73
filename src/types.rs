//! Result types shared by the provider verbs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::Schema;

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The path to the attribute that changed.
    pub path: String,
    /// The value before the change (None if creating).
    pub before: Option<Value>,
    /// The value after the change (None if deleting).
    pub after: Option<Value>,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(path: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// Create a change for a new attribute.
    pub fn added(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// Create a change for a removed attribute.
    pub fn removed(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// Create a change for a modified attribute.
    pub fn modified(path: impl Into<String>, before: Value, after: Value) -> Self {
        Self::new(path, Some(before), Some(after))
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation.
    pub planned_state: Value,
    /// The list of attribute changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource requires replacement.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Create a plan result with no changes.
    pub fn no_change(state: Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// Create a plan result with changes.
    pub fn with_changes(
        planned_state: Value,
        changes: Vec<AttributeChange>,
        requires_replace: bool,
    ) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }

    /// Diff `prior` against `planned` over the attributes of `schema`.
    ///
    /// Null and absent values are treated alike. Changes are ordered by
    /// attribute name. A change to any `force_new` attribute of an existing
    /// resource requires replacement.
    pub fn diff(schema: &Schema, prior: Option<&Value>, planned: Value) -> Self {
        let mut changes = Vec::new();
        let mut requires_replace = false;

        for name in schema.attribute_names() {
            let before = prior.and_then(|p| non_null(p.get(name)));
            let after = non_null(planned.get(name));
            let change = match (before, after) {
                (None, None) => continue,
                (Some(b), Some(a)) if b == a => continue,
                (None, Some(a)) => AttributeChange::added(name, a.clone()),
                (Some(b), None) => AttributeChange::removed(name, b.clone()),
                (Some(b), Some(a)) => AttributeChange::modified(name, b.clone(), a.clone()),
            };

            if prior.is_some() && schema.attribute(name).is_some_and(|attr| attr.force_new) {
                requires_replace = true;
            }
            changes.push(change);
        }

        Self::with_changes(planned, changes, requires_replace)
    }

    /// The plan for destroying a resource: every prior attribute is removed.
    pub fn destroy(schema: &Schema, prior: &Value) -> Self {
        let changes = schema
            .attribute_names()
            .into_iter()
            .filter_map(|name| {
                non_null(prior.get(name)).map(|v| AttributeChange::removed(name, v.clone()))
            })
            .collect();

        Self::with_changes(Value::Null, changes, false)
    }
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// An imported resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state.
    pub state: Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Provider metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Provider type name, the prefix of every resource type.
    pub type_name: String,
    /// Provider version.
    pub version: String,
    /// List of resource type names.
    pub resources: Vec<String>,
    /// List of data source type names.
    pub data_sources: Vec<String>,
    /// Server capabilities.
    pub capabilities: ServerCapabilities,
}

/// Server capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServerCapabilities {
    /// Whether the provider supports planning destroy operations.
    pub plan_destroy: bool,
}
