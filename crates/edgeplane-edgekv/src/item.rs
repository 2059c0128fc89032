//! EdgeKV item resource kind
//!
//! Identity is `namespace:network:group:item`; only the value can change in
//! place.

use crate::api::{EdgeKvApi, ItemGroup};
use crate::error::{EdgeKvError, Result};
use async_trait::async_trait;
use edgeplane_provider::{
    AttributeSchema, Attributes, FieldSchema, ListFilter, Network, RemoteClient, RemoteError,
    RemoteObject, RemoteResult, ResourceId, ResourceKind, ResourceType,
};
use serde_json::{Value, json};
use std::sync::Arc;

/// Declared state of one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSpec {
    pub group: ItemGroup,
    pub item: String,
    pub value: String,
}

impl ItemSpec {
    pub fn id(&self) -> edgeplane_provider::Result<ResourceId> {
        ResourceId::composite(&[
            self.group.namespace.as_str(),
            self.group.network.as_str(),
            self.group.group.as_str(),
            self.item.as_str(),
        ])
    }

    pub fn to_attributes(&self) -> Attributes {
        item_attributes(&self.group, &self.item, &self.value)
    }

    pub fn from_attributes(attributes: &Attributes) -> Result<Self> {
        let network: Network = string_attr(attributes, "network")?.parse()?;
        Ok(Self {
            group: ItemGroup::new(
                string_attr(attributes, "namespace_name")?,
                network,
                string_attr(attributes, "group_name")?,
            ),
            item: string_attr(attributes, "item_id")?.to_string(),
            value: string_attr(attributes, "item_value")?.to_string(),
        })
    }
}

fn string_attr<'a>(attributes: &'a Attributes, name: &'static str) -> Result<&'a str> {
    attributes
        .get(name)
        .and_then(Value::as_str)
        .ok_or(EdgeKvError::MissingAttribute(name))
}

fn item_attributes(group: &ItemGroup, item: &str, value: &str) -> Attributes {
    Attributes::from([
        ("namespace_name".to_string(), json!(group.namespace)),
        ("network".to_string(), json!(group.network.as_str())),
        ("group_name".to_string(), json!(group.group)),
        ("item_id".to_string(), json!(item)),
        ("item_value".to_string(), json!(value)),
    ])
}

fn rejected(error: impl ToString) -> RemoteError {
    RemoteError::Rejected(error.to_string())
}

fn split_id(id: &ResourceId) -> RemoteResult<(ItemGroup, String)> {
    let parts = id.split(4).map_err(rejected)?;
    let group = ItemGroup::from_parts(&parts).map_err(rejected)?;
    Ok((group, parts[3].to_string()))
}

/// Adapts `EdgeKvApi` item calls to `RemoteClient`
pub struct ItemClient {
    api: Arc<dyn EdgeKvApi>,
}

impl ItemClient {
    pub fn new(api: Arc<dyn EdgeKvApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl RemoteClient for ItemClient {
    async fn create(&self, request: &Attributes) -> RemoteResult<RemoteObject> {
        let spec = ItemSpec::from_attributes(request).map_err(rejected)?;
        let id = spec.id().map_err(rejected)?;
        tracing::debug!("Writing EdgeKV item {}", id);

        self.api
            .upsert_item(&spec.group, &spec.item, &spec.value)
            .await?;
        Ok(RemoteObject::new(id, spec.to_attributes()))
    }

    async fn read(&self, id: &ResourceId) -> RemoteResult<RemoteObject> {
        let (group, item) = split_id(id)?;
        let value = self.api.get_item(&group, &item).await?;
        Ok(RemoteObject::new(
            id.clone(),
            item_attributes(&group, &item, &value),
        ))
    }

    async fn update(&self, id: &ResourceId, request: &Attributes) -> RemoteResult<()> {
        let (group, item) = split_id(id)?;
        let value = request
            .get("item_value")
            .and_then(Value::as_str)
            .ok_or_else(|| rejected("item_value is required"))?;
        self.api.upsert_item(&group, &item, value).await
    }

    async fn delete(&self, id: &ResourceId) -> RemoteResult<()> {
        let (group, item) = split_id(id)?;
        self.api.delete_item(&group, &item).await
    }

    /// Items of the group named by the filter's parent (`namespace:network:group`)
    async fn list(&self, filter: &ListFilter) -> RemoteResult<Vec<RemoteObject>> {
        let parts = filter.parent.split(3).map_err(rejected)?;
        let mut group = ItemGroup::from_parts(&parts).map_err(rejected)?;
        if let Some(network) = filter.network {
            group.network = network;
        }

        let keys = self.api.list_items(&group).await?;
        keys.into_iter()
            .map(|key| -> RemoteResult<RemoteObject> {
                let id = ResourceId::composite(&[
                    group.namespace.as_str(),
                    group.network.as_str(),
                    group.group.as_str(),
                    key.as_str(),
                ])
                .map_err(rejected)?;
                let attributes = Attributes::from([("item_id".to_string(), json!(key))]);
                Ok(RemoteObject::new(id, attributes))
            })
            .collect()
    }
}

/// Reconciliation rules for EdgeKV items
pub struct ItemResource {
    schema: AttributeSchema,
}

impl ItemResource {
    pub fn new() -> Self {
        Self {
            schema: AttributeSchema::new()
                .with("namespace_name", FieldSchema::scalar().force_new())
                .with("network", FieldSchema::scalar().force_new())
                .with("group_name", FieldSchema::scalar().force_new())
                .with("item_id", FieldSchema::scalar().force_new())
                .with("item_value", FieldSchema::scalar()),
        }
    }
}

impl Default for ItemResource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceType for ItemResource {
    fn kind(&self) -> ResourceKind {
        ResourceKind::EdgeKvItem
    }

    fn schema(&self) -> &AttributeSchema {
        &self.schema
    }
}
