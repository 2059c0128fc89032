//! Reconciliation engine
//!
//! One engine owns one managed resource and drives it through the lifecycle
//! state machine:
//!
//! ```text
//! Absent ──create──▶ Creating ──▶ Present ──update──▶ Updating ──▶ Present
//!                                    │
//!                                    └──delete──▶ Deleting ──▶ Absent
//!
//! any failed remote call ──▶ Failed (kept until the caller acts)
//! ```
//!
//! Every method takes `&mut self`, so passes for one identity are strictly
//! sequential. Engines for distinct identities share only the client.

use crate::action::{Action, ActionType, ApplyResult, Plan};
use crate::client::{RemoteClient, ResourceType, UpdateMode};
use crate::drift::{ChangeKind, ChangeSet, DriftDetector};
use crate::error::{Operation, ProviderError, Result};
use crate::resource::{Attributes, LifecycleStatus, ManagedResource, ResourceId, ResourceKind};
use crate::state::ResourceRecord;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Result of `ReconciliationEngine::update`
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// Declared state already matched; no remote call was made
    Unchanged,
    Updated(ChangeSet),
}

pub struct ReconciliationEngine {
    client: Arc<dyn RemoteClient>,
    resource_type: Arc<dyn ResourceType>,
    status: LifecycleStatus,
    resource: Option<ManagedResource>,
    last_error: Option<String>,
}

impl ReconciliationEngine {
    pub fn new(client: Arc<dyn RemoteClient>, resource_type: Arc<dyn ResourceType>) -> Self {
        Self {
            client,
            resource_type,
            status: LifecycleStatus::Absent,
            resource: None,
            last_error: None,
        }
    }

    /// Rebuild an engine from a persisted record.
    ///
    /// A record saved mid-transition (creating, updating, deleting) means
    /// the pass was interrupted; the engine resumes in `Failed`.
    pub fn from_record(
        client: Arc<dyn RemoteClient>,
        resource_type: Arc<dyn ResourceType>,
        record: ResourceRecord,
    ) -> Result<Self> {
        if record.kind != resource_type.kind() {
            return Err(ProviderError::InvalidConfig(format!(
                "record {} does not belong to resource kind {}",
                record.key(),
                resource_type.kind()
            )));
        }

        let (status, last_error) = match record.status {
            LifecycleStatus::Creating | LifecycleStatus::Updating | LifecycleStatus::Deleting => (
                LifecycleStatus::Failed,
                Some(format!("interrupted while {}", record.status)),
            ),
            status => (status, record.last_error),
        };

        Ok(Self {
            client,
            resource_type,
            status,
            resource: Some(ManagedResource {
                kind: record.kind,
                id: record.id,
                declared: record.declared,
                observed: record.observed,
            }),
            last_error,
        })
    }

    pub fn kind(&self) -> ResourceKind {
        self.resource_type.kind()
    }

    pub fn status(&self) -> LifecycleStatus {
        self.status
    }

    pub fn resource(&self) -> Option<&ManagedResource> {
        self.resource.as_ref()
    }

    /// Reconciled observed state, for the orchestration driver to surface
    pub fn observed(&self) -> Option<&Attributes> {
        self.resource.as_ref().map(|r| &r.observed)
    }

    /// Message of the error that moved the resource to `Failed`
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn record(&self) -> Option<ResourceRecord> {
        self.resource.as_ref().map(|r| ResourceRecord {
            kind: r.kind,
            id: r.id.clone(),
            status: self.status,
            declared: r.declared.clone(),
            observed: r.observed.clone(),
            last_error: self.last_error.clone(),
            updated_at: Utc::now(),
        })
    }

    /// Create the resource remotely, then read it back.
    ///
    /// If the create call fails nothing is recorded. If the read-back fails
    /// the identity is kept so the resource can still be deleted.
    pub async fn create(&mut self, declared: Attributes) -> Result<&ManagedResource> {
        if let Some(existing) = &self.resource {
            return Err(ProviderError::InvalidConfig(format!(
                "{} already exists; delete or forget it first",
                existing.key()
            )));
        }
        self.transition(LifecycleStatus::Creating)?;

        let kind = self.kind();
        let created = match self.client.create(&declared).await {
            Ok(created) => created,
            Err(e) => return Err(self.fail(ProviderError::remote(kind, Operation::Create, e))),
        };

        let resource = ManagedResource {
            kind,
            id: created.id,
            declared,
            observed: created.attributes,
        };
        let key = resource.key();
        let id = resource.id.clone();
        tracing::debug!("Created {}, reading back", key);
        self.resource = Some(resource);

        match self.client.read(&id).await {
            Ok(object) => self.set_observed(object.attributes),
            Err(e) => return Err(self.fail(ProviderError::remote(&key, Operation::Read, e))),
        }

        self.transition(LifecycleStatus::Present)?;
        self.last_error = None;
        tracing::info!("Created {}", key);
        self.present()
    }

    /// Refresh observed state from the remote service.
    ///
    /// On an engine without a resource this adopts `id` (import).
    pub async fn read(&mut self, id: &ResourceId) -> Result<&Attributes> {
        if self.resource.is_some() {
            self.check_identity(id)?;
        }
        let key = format!("{}:{}", self.kind(), id);

        let object = match self.client.read(id).await {
            Ok(object) => object,
            Err(e) if e.is_not_found() => {
                tracing::debug!("{} not found remotely", key);
                return Err(ProviderError::ResourceMissing(key));
            }
            Err(e) => return Err(self.fail(ProviderError::remote(&key, Operation::Read, e))),
        };

        if self.resource.is_none() {
            tracing::info!("Adopting {}", key);
            self.resource = Some(ManagedResource {
                kind: self.kind(),
                id: id.clone(),
                declared: Attributes::new(),
                observed: Attributes::new(),
            });
        }
        self.set_observed(object.attributes);

        self.transition(LifecycleStatus::Present)?;
        self.last_error = None;
        Ok(&self.present()?.observed)
    }

    /// Bring the remote resource in line with `declared`.
    ///
    /// An empty change set makes no remote call.
    pub async fn update(&mut self, id: &ResourceId, declared: Attributes) -> Result<UpdateOutcome> {
        self.check_identity(id)?;
        let resource = self.present()?;
        let key = resource.key();
        let schema = self.resource_type.schema();

        let changes = DriftDetector::new(schema).compute(&declared, &resource.observed);
        if changes.is_empty() {
            tracing::debug!("{} is up to date", key);
            self.set_declared(declared);
            return Ok(UpdateOutcome::Unchanged);
        }

        let fields = changes.requires_replacement(schema);
        if !fields.is_empty() {
            return Err(ProviderError::RequiresReplacement { key, fields });
        }

        let request = self.build_request(&declared, &resource.observed, &changes);
        self.transition(LifecycleStatus::Updating)?;
        tracing::debug!("Updating {}: {}", key, changes.fields().join(", "));

        if let Err(e) = self.client.update(id, &request).await {
            return Err(self.fail(ProviderError::remote(&key, Operation::Update, e)));
        }
        match self.client.read(id).await {
            Ok(object) => self.set_observed(object.attributes),
            Err(e) => return Err(self.fail(ProviderError::remote(&key, Operation::Read, e))),
        }

        self.set_declared(declared);
        self.transition(LifecycleStatus::Present)?;
        self.last_error = None;
        tracing::info!("Updated {}", key);
        Ok(UpdateOutcome::Updated(changes))
    }

    /// Run the kind's pre-delete check, then delete remotely.
    ///
    /// A resource the remote service no longer knows counts as deleted.
    pub async fn delete(&mut self, id: &ResourceId) -> Result<()> {
        self.check_identity(id)?;
        let key = self.present()?.key();

        let previous = self.status;
        self.transition(LifecycleStatus::Deleting)?;

        if let Err(e) = self
            .resource_type
            .pre_delete(self.client.as_ref(), id)
            .await
        {
            return Err(match e {
                ProviderError::RemoteCallFailed { .. } => self.fail(e),
                e => {
                    self.status = previous;
                    e
                }
            });
        }

        match self.client.delete(id).await {
            Ok(()) => tracing::info!("Deleted {}", key),
            Err(e) if e.is_not_found() => {
                tracing::warn!("{} was already gone: {}", key, e);
            }
            Err(e) => return Err(self.fail(ProviderError::remote(&key, Operation::Delete, e))),
        }

        self.resource = None;
        self.transition(LifecycleStatus::Absent)?;
        self.last_error = None;
        Ok(())
    }

    /// Drop the local record without touching the remote service
    pub fn forget(&mut self) -> Option<ManagedResource> {
        self.status = LifecycleStatus::Absent;
        self.last_error = None;
        self.resource.take()
    }

    /// Plan what `apply` would do. `None` means the resource should not exist.
    pub fn plan(&self, declared: Option<&Attributes>) -> Plan {
        let kind = self.kind();
        let schema = self.resource_type.schema();
        let detector = DriftDetector::new(schema);

        let (action_type, resource_id, changes) = match (declared, &self.resource) {
            (None, None) => return Plan::empty(),
            (Some(declared), None) => (
                ActionType::Create,
                None,
                detector.compute(declared, &Attributes::new()),
            ),
            (None, Some(resource)) => (
                ActionType::Delete,
                Some(resource.id.to_string()),
                ChangeSet::default(),
            ),
            (Some(declared), Some(resource)) => {
                let changes = detector.compute(declared, &resource.observed);
                let action_type = if changes.is_empty() {
                    ActionType::NoOp
                } else if !changes.requires_replacement(schema).is_empty() {
                    ActionType::Replace
                } else {
                    ActionType::Update
                };
                (action_type, Some(resource.id.to_string()), changes)
            }
        };

        let description = match &resource_id {
            Some(id) => format!("{} {}:{}", action_type, kind, id),
            None => format!("{} {}", action_type, kind),
        };

        Plan::new(vec![Action {
            action_type,
            kind,
            resource_id,
            description,
            changes,
        }])
    }

    /// Execute the plan for `declared` through the lifecycle operations
    pub async fn apply(&mut self, declared: Option<Attributes>) -> Result<ApplyResult> {
        let start = Instant::now();
        let plan = self.plan(declared.as_ref());
        let Some(action) = plan.actions.into_iter().next() else {
            return Ok(ApplyResult {
                action_type: ActionType::NoOp,
                resource_id: None,
                changes: ChangeSet::default(),
                duration_ms: start.elapsed().as_millis() as u64,
            });
        };

        let current = self.resource.as_ref().map(|r| r.id.clone());
        match (action.action_type, current, declared) {
            (ActionType::Create, _, Some(declared)) => {
                self.create(declared).await?;
            }
            (ActionType::Update | ActionType::NoOp, Some(id), Some(declared)) => {
                self.update(&id, declared).await?;
            }
            (ActionType::Replace, Some(id), Some(declared)) => {
                self.delete(&id).await?;
                self.create(declared).await?;
            }
            (ActionType::Delete, Some(id), _) => {
                self.delete(&id).await?;
            }
            (action_type, _, _) => {
                return Err(ProviderError::InvalidConfig(format!(
                    "cannot {} {}",
                    action_type,
                    self.kind()
                )));
            }
        }

        Ok(ApplyResult {
            action_type: action.action_type,
            resource_id: self.resource.as_ref().map(|r| r.id.to_string()),
            changes: action.changes,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn build_request(
        &self,
        declared: &Attributes,
        observed: &Attributes,
        changes: &ChangeSet,
    ) -> Attributes {
        let schema = self.resource_type.schema();
        match self.resource_type.update_mode() {
            UpdateMode::Partial => changes
                .iter()
                .map(|c| (c.field.clone(), c.new.clone().unwrap_or(Value::Null)))
                .collect(),
            UpdateMode::Full => {
                let mut request: Attributes = observed
                    .iter()
                    .filter(|(k, _)| !schema.field(k).is_some_and(|f| f.computed))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                for (k, v) in declared.iter().filter(|(_, v)| !v.is_null()) {
                    request.insert(k.clone(), v.clone());
                }
                for removed in changes.iter().filter(|c| c.kind == ChangeKind::Removed) {
                    request.remove(&removed.field);
                }
                request
            }
        }
    }

    fn check_identity(&self, id: &ResourceId) -> Result<()> {
        match &self.resource {
            Some(resource) if &resource.id != id => Err(ProviderError::IdentityMismatch {
                expected: resource.id.to_string(),
                actual: id.to_string(),
            }),
            Some(_) => Ok(()),
            None => Err(ProviderError::ResourceMissing(format!(
                "{}:{}",
                self.kind(),
                id
            ))),
        }
    }

    fn present(&self) -> Result<&ManagedResource> {
        self.resource
            .as_ref()
            .ok_or_else(|| ProviderError::ResourceMissing(self.kind().to_string()))
    }

    fn set_observed(&mut self, observed: Attributes) {
        if let Some(resource) = &mut self.resource {
            resource.observed = observed;
        }
    }

    fn set_declared(&mut self, declared: Attributes) {
        if let Some(resource) = &mut self.resource {
            resource.declared = declared;
        }
    }

    fn transition(&mut self, to: LifecycleStatus) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(ProviderError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        tracing::debug!("{}: {} -> {}", self.kind(), self.status, to);
        self.status = to;
        Ok(())
    }

    fn fail(&mut self, error: ProviderError) -> ProviderError {
        tracing::warn!("{}", error);
        self.status = LifecycleStatus::Failed;
        self.last_error = Some(error.to_string());
        error
    }
}
