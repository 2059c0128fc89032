//! EdgeKV group items and item lifecycle against an in-memory API

use async_trait::async_trait;
use edgeplane_edgekv::{
    EdgeKvApi, EdgeKvError, ItemClient, ItemGroup, ItemResource, ItemSpec, read_group_items,
};
use edgeplane_provider::{
    LifecycleStatus, ListFilter, Network, ProviderError, ReconciliationEngine, RemoteClient,
    RemoteError, RemoteResult, ResourceId, UpdateOutcome,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Stores items per group id and records every call
#[derive(Default)]
struct MemoryEdgeKv {
    groups: Mutex<BTreeMap<String, BTreeMap<String, String>>>,
    calls: Mutex<Vec<String>>,
    fail_list: Option<RemoteError>,
}

impl MemoryEdgeKv {
    fn with_items(group: &ItemGroup, items: &[(&str, &str)]) -> Self {
        let store = Self::default();
        store.groups.lock().unwrap().insert(
            key(group),
            items
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        store
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn key(group: &ItemGroup) -> String {
    group.id().unwrap().to_string()
}

#[async_trait]
impl EdgeKvApi for MemoryEdgeKv {
    async fn list_items(&self, group: &ItemGroup) -> RemoteResult<Vec<String>> {
        self.record(format!("list {}", key(group)));
        if let Some(e) = &self.fail_list {
            return Err(e.clone());
        }
        Ok(self
            .groups
            .lock()
            .unwrap()
            .get(&key(group))
            .map(|items| items.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_item(&self, group: &ItemGroup, item: &str) -> RemoteResult<String> {
        self.record(format!("get {}", item));
        self.groups
            .lock()
            .unwrap()
            .get(&key(group))
            .and_then(|items| items.get(item).cloned())
            .ok_or_else(|| RemoteError::NotFound(format!("item {} not found", item)))
    }

    async fn upsert_item(&self, group: &ItemGroup, item: &str, value: &str) -> RemoteResult<()> {
        self.record(format!("upsert {}={}", item, value));
        self.groups
            .lock()
            .unwrap()
            .entry(key(group))
            .or_default()
            .insert(item.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_item(&self, group: &ItemGroup, item: &str) -> RemoteResult<()> {
        self.record(format!("delete {}", item));
        self.groups
            .lock()
            .unwrap()
            .get_mut(&key(group))
            .and_then(|items| items.remove(item))
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound(format!("item {} not found", item)))
    }
}

fn countries() -> ItemGroup {
    ItemGroup::new("ns1", Network::Staging, "countries")
}

fn item(value: &str) -> ItemSpec {
    ItemSpec {
        group: countries(),
        item: "US".to_string(),
        value: value.to_string(),
    }
}

#[tokio::test]
async fn test_read_group_items() {
    let api = MemoryEdgeKv::with_items(
        &countries(),
        &[("US", "United States"), ("DE", "Germany")],
    );

    let group_items = read_group_items(&api, &countries()).await.unwrap();
    assert_eq!(group_items.id.as_str(), "ns1:staging:countries");
    assert_eq!(group_items.items["DE"], "Germany");
    assert_eq!(group_items.items["US"], "United States");
    assert_eq!(
        api.calls(),
        vec!["list ns1:staging:countries", "get DE", "get US"]
    );
}

#[tokio::test]
async fn test_read_empty_group() {
    let api = MemoryEdgeKv::default();
    let group_items = read_group_items(&api, &countries()).await.unwrap();
    assert!(group_items.items.is_empty());
}

#[tokio::test]
async fn test_read_group_items_list_failure() {
    let api = MemoryEdgeKv {
        fail_list: Some(RemoteError::Rejected("namespace ns1 does not exist".to_string())),
        ..Default::default()
    };

    let err = read_group_items(&api, &countries()).await.unwrap_err();
    assert!(matches!(err, EdgeKvError::ListItems(_)));
    assert_eq!(
        err.to_string(),
        "could not list items: namespace ns1 does not exist"
    );
}

fn engine(api: &Arc<MemoryEdgeKv>) -> ReconciliationEngine {
    ReconciliationEngine::new(
        Arc::new(ItemClient::new(api.clone())),
        Arc::new(ItemResource::new()),
    )
}

#[tokio::test]
async fn test_item_lifecycle() {
    let api = Arc::new(MemoryEdgeKv::default());
    let mut engine = engine(&api);

    let id = engine
        .create(item("United States").to_attributes())
        .await
        .unwrap()
        .id
        .clone();
    assert_eq!(id.as_str(), "ns1:staging:countries:US");
    assert_eq!(engine.status(), LifecycleStatus::Present);

    let outcome = engine
        .update(&id, item("United States of America").to_attributes())
        .await
        .unwrap();
    assert!(matches!(outcome, UpdateOutcome::Updated(_)));

    let outcome = engine
        .update(&id, item("United States of America").to_attributes())
        .await
        .unwrap();
    assert_eq!(outcome, UpdateOutcome::Unchanged);

    engine.delete(&id).await.unwrap();
    assert_eq!(engine.status(), LifecycleStatus::Absent);

    assert_eq!(
        api.calls(),
        vec![
            "upsert US=United States",
            "get US",
            "upsert US=United States of America",
            "get US",
            "delete US",
        ]
    );
}

#[tokio::test]
async fn test_item_rename_requires_replacement() {
    let api = Arc::new(MemoryEdgeKv::default());
    let mut engine = engine(&api);
    let id = engine
        .create(item("United States").to_attributes())
        .await
        .unwrap()
        .id
        .clone();

    let mut renamed = item("United States");
    renamed.item = "USA".to_string();

    let err = engine.update(&id, renamed.to_attributes()).await.unwrap_err();
    match err {
        ProviderError::RequiresReplacement { fields, .. } => {
            assert_eq!(fields, vec!["item_id".to_string()])
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_read_missing_item() {
    let api = Arc::new(MemoryEdgeKv::default());
    let mut engine = engine(&api);

    let err = engine
        .read(&ResourceId::new("ns1:staging:countries:FR"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::ResourceMissing(_)));
    assert!(engine.resource().is_none());
}

#[tokio::test]
async fn test_list_items_on_other_network() {
    let production = ItemGroup::new("ns1", Network::Production, "countries");
    let api = Arc::new(MemoryEdgeKv::with_items(&production, &[("JP", "Japan")]));
    let client = ItemClient::new(api.clone());

    let objects = client
        .list(&ListFilter {
            parent: countries().id().unwrap(),
            network: Some(Network::Production),
        })
        .await
        .unwrap();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].id.as_str(), "ns1:production:countries:JP");
}
