//! Policy set resource kind
//!
//! Identity is `contractID:policySetID`. The contract and the media type
//! cannot change in place; name and region are updated with a full payload.
//! A policy set is only deleted once neither network holds a policy other
//! than the service-generated `.auto` one.

use crate::api::ImagingApi;
use crate::error::{ImagingError, Result};
use crate::model::{
    CreatePolicySet, ListPoliciesResponse, MediaType, PolicySet, Region, UpdatePolicySet,
};
use async_trait::async_trait;
use edgeplane_provider::{
    AUTO_SENTINEL, AttributeSchema, Attributes, DependentsGuard, FieldSchema, ListFilter,
    Network, RemoteClient, RemoteError, RemoteObject, RemoteResult, ResourceId, ResourceKind,
    ResourceType, UpdateMode, count_remaining,
};
use serde_json::{Value, json};
use std::sync::Arc;

/// Number of policies left once the `.auto` policy is excluded
pub fn filter_remaining_policies(response: &ListPoliciesResponse) -> usize {
    count_remaining(
        response.items.iter().map(|p| p.id.as_str()),
        AUTO_SENTINEL,
    )
}

/// Declared state of a policy set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySetSpec {
    pub contract_id: String,
    pub name: String,
    pub region: Region,
    pub media_type: MediaType,
}

impl PolicySetSpec {
    pub fn to_attributes(&self) -> Attributes {
        Attributes::from([
            ("contract_id".to_string(), json!(self.contract_id)),
            ("name".to_string(), json!(self.name)),
            ("region".to_string(), json!(self.region.as_str())),
            ("type".to_string(), json!(self.media_type.as_str())),
        ])
    }

    pub fn from_attributes(attributes: &Attributes) -> Result<Self> {
        Ok(Self {
            contract_id: string_attr(attributes, "contract_id")?.to_string(),
            name: string_attr(attributes, "name")?.to_string(),
            region: string_attr(attributes, "region")?.parse()?,
            media_type: string_attr(attributes, "type")?.parse()?,
        })
    }
}

fn string_attr<'a>(attributes: &'a Attributes, name: &'static str) -> Result<&'a str> {
    attributes
        .get(name)
        .and_then(Value::as_str)
        .ok_or(ImagingError::MissingAttribute(name))
}

/// Observed attributes of a policy set, including the identity parts
pub fn policy_set_attributes(contract_id: &str, policy_set: &PolicySet) -> Attributes {
    let mut attributes = Attributes::from([
        ("contract_id".to_string(), json!(contract_id)),
        ("id".to_string(), json!(policy_set.id)),
        ("name".to_string(), json!(policy_set.name)),
        ("region".to_string(), json!(policy_set.region.as_str())),
        ("type".to_string(), json!(policy_set.media_type.as_str())),
    ]);
    if let Some(modified) = &policy_set.last_modified_date {
        attributes.insert("last_modified_date".to_string(), json!(modified));
    }
    attributes
}

fn rejected(error: impl ToString) -> RemoteError {
    RemoteError::Rejected(error.to_string())
}

fn split_id(id: &ResourceId) -> RemoteResult<(&str, &str)> {
    let parts = id.split(2).map_err(rejected)?;
    Ok((parts[0], parts[1]))
}

/// Adapts `ImagingApi` policy-set calls to `RemoteClient`
pub struct PolicySetClient {
    api: Arc<dyn ImagingApi>,
}

impl PolicySetClient {
    pub fn new(api: Arc<dyn ImagingApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl RemoteClient for PolicySetClient {
    async fn create(&self, request: &Attributes) -> RemoteResult<RemoteObject> {
        let spec = PolicySetSpec::from_attributes(request).map_err(rejected)?;
        tracing::debug!("Creating policy set {} in {}", spec.name, spec.contract_id);

        let body = CreatePolicySet {
            name: spec.name,
            region: spec.region,
            media_type: spec.media_type,
        };
        let created = self.api.create_policy_set(&spec.contract_id, &body).await?;

        let id = ResourceId::composite(&[spec.contract_id.as_str(), created.id.as_str()])
            .map_err(rejected)?;
        Ok(RemoteObject::new(
            id,
            policy_set_attributes(&spec.contract_id, &created),
        ))
    }

    async fn read(&self, id: &ResourceId) -> RemoteResult<RemoteObject> {
        let (contract_id, policy_set_id) = split_id(id)?;
        let policy_set = self.api.get_policy_set(contract_id, policy_set_id).await?;
        Ok(RemoteObject::new(
            id.clone(),
            policy_set_attributes(contract_id, &policy_set),
        ))
    }

    async fn update(&self, id: &ResourceId, request: &Attributes) -> RemoteResult<()> {
        let (contract_id, policy_set_id) = split_id(id)?;
        let body = UpdatePolicySet {
            name: string_attr(request, "name").map_err(rejected)?.to_string(),
            region: string_attr(request, "region")
                .and_then(|region| region.parse::<Region>())
                .map_err(rejected)?,
        };
        self.api
            .update_policy_set(contract_id, policy_set_id, &body)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &ResourceId) -> RemoteResult<()> {
        let (contract_id, policy_set_id) = split_id(id)?;
        self.api.delete_policy_set(contract_id, policy_set_id).await
    }

    async fn list(&self, filter: &ListFilter) -> RemoteResult<Vec<RemoteObject>> {
        let (contract_id, policy_set_id) = split_id(&filter.parent)?;
        let network = filter
            .network
            .ok_or_else(|| rejected("listing policies needs a network"))?;

        let response = self
            .api
            .list_policies(contract_id, policy_set_id, network)
            .await?;
        tracing::debug!(
            "Policy set {} has {} policies on {} ({} user-owned)",
            filter.parent,
            response.total_items,
            network,
            filter_remaining_policies(&response)
        );

        Ok(response
            .items
            .into_iter()
            .map(|policy| {
                let mut attributes = Attributes::from([("id".to_string(), json!(policy.id))]);
                if let Some(version) = policy.version {
                    attributes.insert("version".to_string(), json!(version));
                }
                RemoteObject::new(ResourceId::new(policy.id), attributes)
            })
            .collect())
    }
}

/// Reconciliation rules for policy sets
pub struct PolicySetResource {
    schema: AttributeSchema,
    guard: DependentsGuard,
}

impl PolicySetResource {
    pub fn new() -> Self {
        Self {
            schema: AttributeSchema::new()
                .with("id", FieldSchema::scalar().computed())
                .with("last_modified_date", FieldSchema::scalar().computed())
                .with("contract_id", FieldSchema::scalar().force_new())
                .with("type", FieldSchema::scalar().force_new())
                .with("name", FieldSchema::scalar())
                .with("region", FieldSchema::scalar()),
            guard: DependentsGuard::new([Network::Production, Network::Staging]),
        }
    }
}

impl Default for PolicySetResource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceType for PolicySetResource {
    fn kind(&self) -> ResourceKind {
        ResourceKind::ImagingPolicySet
    }

    fn schema(&self) -> &AttributeSchema {
        &self.schema
    }

    fn update_mode(&self) -> UpdateMode {
        UpdateMode::Full
    }

    async fn pre_delete(
        &self,
        client: &dyn RemoteClient,
        id: &ResourceId,
    ) -> edgeplane_provider::Result<()> {
        self.guard.check(client, id).await
    }
}
