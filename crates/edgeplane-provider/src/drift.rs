//! Drift detection between declared and observed state

use crate::resource::{AttributeSchema, Attributes, FieldKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Declared but not yet present remotely
    Added,
    Changed,
    /// Present remotely, explicitly removed from declared state
    Removed,
}

/// A single field-level difference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub kind: ChangeKind,
    pub old: Option<Value>,
    pub new: Option<Value>,
}

/// Field-level differences, ordered by field name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub changes: Vec<FieldChange>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldChange> {
        self.changes.iter()
    }

    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.changes.iter().find(|c| c.field == field)
    }

    pub fn fields(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.field.as_str()).collect()
    }

    /// Changed fields the schema marks as force-new
    pub fn requires_replacement(&self, schema: &AttributeSchema) -> Vec<String> {
        self.changes
            .iter()
            .filter(|c| c.kind != ChangeKind::Added)
            .filter(|c| schema.field(&c.field).is_some_and(|f| f.force_new))
            .map(|c| c.field.clone())
            .collect()
    }
}

/// Compares declared state against observed state.
///
/// Pure: the same inputs always give the same `ChangeSet`.
pub struct DriftDetector<'a> {
    schema: &'a AttributeSchema,
}

impl<'a> DriftDetector<'a> {
    pub fn new(schema: &'a AttributeSchema) -> Self {
        Self { schema }
    }

    pub fn compute(&self, declared: &Attributes, observed: &Attributes) -> ChangeSet {
        let fields: BTreeSet<&String> = declared.keys().chain(observed.keys()).collect();
        let mut changes = Vec::new();

        for field in fields {
            let schema = self.schema.field(field).copied().unwrap_or_default();
            if schema.computed {
                continue;
            }

            let want = declared.get(field).filter(|v| !v.is_null());
            let have = observed.get(field).filter(|v| !v.is_null());

            match (want, have) {
                (Some(want), None) => changes.push(FieldChange {
                    field: field.clone(),
                    kind: ChangeKind::Added,
                    old: None,
                    new: Some(want.clone()),
                }),
                (Some(want), Some(have)) => {
                    if !values_equal(schema.kind, want, have) {
                        changes.push(FieldChange {
                            field: field.clone(),
                            kind: ChangeKind::Changed,
                            old: Some(have.clone()),
                            new: Some(want.clone()),
                        });
                    }
                }
                // Unmanaged fields are left alone
                (None, Some(have)) if schema.removable => changes.push(FieldChange {
                    field: field.clone(),
                    kind: ChangeKind::Removed,
                    old: Some(have.clone()),
                    new: None,
                }),
                _ => {}
            }
        }

        ChangeSet { changes }
    }
}

fn values_equal(kind: FieldKind, a: &Value, b: &Value) -> bool {
    match (kind, a, b) {
        (FieldKind::Set, Value::Array(a), Value::Array(b)) => as_set(a) == as_set(b),
        _ => a == b,
    }
}

fn as_set(values: &[Value]) -> BTreeSet<String> {
    values.iter().map(Value::to_string).collect()
}
