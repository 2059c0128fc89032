//! EdgeKV API client

use async_trait::async_trait;
use edgeplane_provider::{ApiClient, Network, ResourceId, RemoteResult};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};

/// A group of items inside a namespace on one network
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemGroup {
    pub namespace: String,
    pub network: Network,
    pub group: String,
}

impl ItemGroup {
    pub fn new(namespace: impl Into<String>, network: Network, group: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            network,
            group: group.into(),
        }
    }

    /// `namespace:network:group`
    pub fn id(&self) -> edgeplane_provider::Result<ResourceId> {
        ResourceId::composite(&[
            self.namespace.as_str(),
            self.network.as_str(),
            self.group.as_str(),
        ])
    }

    /// Parse the first three parts of `namespace:network:group[:item]`
    pub fn from_parts(parts: &[&str]) -> edgeplane_provider::Result<Self> {
        match parts {
            [namespace, network, group, ..] => Ok(Self::new(*namespace, network.parse()?, *group)),
            _ => Err(edgeplane_provider::ProviderError::InvalidConfig(format!(
                "'{}' is not a namespace:network:group id",
                parts.join(":")
            ))),
        }
    }

    fn segments(&self) -> [&str; 8] {
        [
            "edgekv",
            "v1",
            "networks",
            self.network.as_str(),
            "namespaces",
            &self.namespace,
            "groups",
            &self.group,
        ]
    }
}

/// Item calls of the EdgeKV API
#[async_trait]
pub trait EdgeKvApi: Send + Sync {
    /// Keys of every item in the group
    async fn list_items(&self, group: &ItemGroup) -> RemoteResult<Vec<String>>;

    async fn get_item(&self, group: &ItemGroup, item: &str) -> RemoteResult<String>;

    async fn upsert_item(&self, group: &ItemGroup, item: &str, value: &str) -> RemoteResult<()>;

    async fn delete_item(&self, group: &ItemGroup, item: &str) -> RemoteResult<()>;
}

/// `EdgeKvApi` over HTTP
pub struct HttpEdgeKvApi {
    api: ApiClient,
}

impl HttpEdgeKvApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn group_url(&self, group: &ItemGroup) -> RemoteResult<Url> {
        self.api.segment_url(&group.segments())
    }

    fn item_url(&self, group: &ItemGroup, item: &str) -> RemoteResult<Url> {
        let mut segments = group.segments().to_vec();
        segments.extend(["items", item]);
        self.api.segment_url(&segments)
    }
}

#[async_trait]
impl EdgeKvApi for HttpEdgeKvApi {
    async fn list_items(&self, group: &ItemGroup) -> RemoteResult<Vec<String>> {
        let req = self.api.request_url(Method::GET, self.group_url(group)?);
        self.api.send_json(req).await
    }

    async fn get_item(&self, group: &ItemGroup, item: &str) -> RemoteResult<String> {
        let req = self.api.request_url(Method::GET, self.item_url(group, item)?);
        self.api.send_text(req).await
    }

    async fn upsert_item(&self, group: &ItemGroup, item: &str, value: &str) -> RemoteResult<()> {
        let req = self
            .api
            .request_url(Method::PUT, self.item_url(group, item)?)
            .header(CONTENT_TYPE, "text/plain")
            .body(value.to_string());
        self.api.send_empty(req).await
    }

    async fn delete_item(&self, group: &ItemGroup, item: &str) -> RemoteResult<()> {
        let req = self
            .api
            .request_url(Method::DELETE, self.item_url(group, item)?);
        self.api.send_empty(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_id() {
        let group = ItemGroup::new("ns1", Network::Staging, "countries");
        assert_eq!(group.id().unwrap().as_str(), "ns1:staging:countries");
    }

    fn http_api() -> HttpEdgeKvApi {
        HttpEdgeKvApi::new(ApiClient::new(
            reqwest::Client::new(),
            "https://example.com/",
        ))
    }

    #[test]
    fn test_group_url() {
        let group = ItemGroup::new("ns1", Network::Staging, "countries");
        assert_eq!(
            http_api().group_url(&group).unwrap().as_str(),
            "https://example.com/edgekv/v1/networks/staging/namespaces/ns1/groups/countries"
        );
    }

    #[test]
    fn test_item_url_encodes_item_key() {
        let group = ItemGroup::new("ns1", Network::Production, "countries");
        assert_eq!(
            http_api().item_url(&group, "a/b?c#d").unwrap().as_str(),
            "https://example.com/edgekv/v1/networks/production/namespaces/ns1/groups/countries/items/a%2Fb%3Fc%23d"
        );
    }

    #[test]
    fn test_group_from_parts() {
        let group = ItemGroup::from_parts(&["ns1", "production", "countries"]).unwrap();
        assert_eq!(group.network, Network::Production);
        assert!(ItemGroup::from_parts(&["ns1", "qa", "countries"]).is_err());
    }
}
