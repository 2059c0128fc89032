//! Managed resource model

use crate::error::{ProviderError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Attribute bag for declared and observed state. Keys are ordered so that
/// iteration (and everything computed from it) is deterministic.
pub type Attributes = BTreeMap<String, Value>;

/// Resource kinds managed by edgeplane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Image & video manager policy set
    ImagingPolicySet,
    /// Single EdgeKV item
    #[serde(rename = "edgekv_item")]
    EdgeKvItem,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::ImagingPolicySet => write!(f, "imaging_policy_set"),
            ResourceKind::EdgeKvItem => write!(f, "edgekv_item"),
        }
    }
}

impl FromStr for ResourceKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "imaging_policy_set" => Ok(ResourceKind::ImagingPolicySet),
            "edgekv_item" => Ok(ResourceKind::EdgeKvItem),
            other => Err(ProviderError::InvalidConfig(format!(
                "unknown resource kind: {}",
                other
            ))),
        }
    }
}

/// Activation network (partition) of the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Staging,
    Production,
}

impl Network {
    pub const ALL: [Network; 2] = [Network::Staging, Network::Production];

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Staging => "staging",
            Network::Production => "production",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "staging" => Ok(Network::Staging),
            "production" => Ok(Network::Production),
            other => Err(ProviderError::InvalidConfig(format!(
                "invalid network '{}': expected 'staging' or 'production'",
                other
            ))),
        }
    }
}

/// Composite resource identity, e.g. `contractID:policySetID` or
/// `namespace:network:group`. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub const SEPARATOR: char = ':';

    /// Single-part identity as returned by the remote service
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Join parts with `:`. Parts must be non-empty and must not contain `:`.
    pub fn composite<S: AsRef<str>>(parts: &[S]) -> Result<Self> {
        if parts.is_empty() {
            return Err(ProviderError::InvalidConfig(
                "resource id needs at least one part".to_string(),
            ));
        }
        for part in parts {
            let part = part.as_ref();
            if part.is_empty() || part.contains(Self::SEPARATOR) {
                return Err(ProviderError::InvalidConfig(format!(
                    "invalid resource id part: '{}'",
                    part
                )));
            }
        }
        let joined: Vec<&str> = parts.iter().map(AsRef::as_ref).collect();
        Ok(Self(joined.join(":")))
    }

    /// Split into exactly `expected` parts
    pub fn split(&self, expected: usize) -> Result<Vec<&str>> {
        let parts: Vec<&str> = self.0.split(Self::SEPARATOR).collect();
        if parts.len() != expected || parts.iter().any(|p| p.is_empty()) {
            return Err(ProviderError::InvalidConfig(format!(
                "resource id '{}' must have {} ':'-separated parts",
                self.0, expected
            )));
        }
        Ok(parts)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a managed resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    #[default]
    Absent,
    Creating,
    Present,
    Updating,
    Deleting,
    /// A remote call failed; the engine does not retry on its own
    Failed,
}

impl LifecycleStatus {
    pub fn can_transition_to(self, to: LifecycleStatus) -> bool {
        use LifecycleStatus::*;

        if to == Failed {
            return true;
        }
        matches!(
            (self, to),
            (Absent, Creating)
                | (Absent, Present)
                | (Creating, Present)
                | (Present, Present)
                | (Present, Updating)
                | (Present, Deleting)
                | (Updating, Present)
                | (Deleting, Absent)
                | (Deleting, Present)
                | (Failed, Creating)
                | (Failed, Present)
                | (Failed, Updating)
                | (Failed, Deleting)
                | (Failed, Absent)
        )
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleStatus::Absent => write!(f, "absent"),
            LifecycleStatus::Creating => write!(f, "creating"),
            LifecycleStatus::Present => write!(f, "present"),
            LifecycleStatus::Updating => write!(f, "updating"),
            LifecycleStatus::Deleting => write!(f, "deleting"),
            LifecycleStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A resource owned by one reconciliation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedResource {
    pub kind: ResourceKind,

    /// Remote identity
    pub id: ResourceId,

    /// Desired state last applied
    pub declared: Attributes,

    /// Last state read back from the remote service
    pub observed: Attributes,
}

impl ManagedResource {
    /// Full resource key (kind:id)
    pub fn key(&self) -> String {
        format!("{}:{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldKind {
    #[default]
    Scalar,
    /// Unordered collection, compared as a set
    Set,
    List,
    Map,
}

/// Per-field reconciliation rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldSchema {
    pub kind: FieldKind,

    /// Omitting the field from declared state removes it remotely
    pub removable: bool,

    /// Changing the field requires replacing the resource
    pub force_new: bool,

    /// Set by the remote service only; never drifts
    pub computed: bool,
}

impl FieldSchema {
    pub fn scalar() -> Self {
        Self::default()
    }

    pub fn set() -> Self {
        Self {
            kind: FieldKind::Set,
            ..Default::default()
        }
    }

    pub fn list() -> Self {
        Self {
            kind: FieldKind::List,
            ..Default::default()
        }
    }

    pub fn map() -> Self {
        Self {
            kind: FieldKind::Map,
            ..Default::default()
        }
    }

    pub fn removable(mut self) -> Self {
        self.removable = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }
}

/// Field rules for one resource kind. Fields not listed are treated as
/// unmanaged scalars.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSchema {
    fields: BTreeMap<String, FieldSchema>,
}

impl AttributeSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldSchema)> {
        self.fields.iter()
    }
}
