//! Image & video manager API client

use crate::model::{CreatePolicySet, ListPoliciesResponse, PolicySet, UpdatePolicySet};
use async_trait::async_trait;
use edgeplane_provider::{ApiClient, Network, RemoteResult};
use reqwest::Method;

const API_PREFIX: &str = "imaging/v2";

/// Policy-set calls of the imaging API
#[async_trait]
pub trait ImagingApi: Send + Sync {
    async fn create_policy_set(
        &self,
        contract_id: &str,
        request: &CreatePolicySet,
    ) -> RemoteResult<PolicySet>;

    async fn get_policy_set(&self, contract_id: &str, policy_set_id: &str)
    -> RemoteResult<PolicySet>;

    async fn update_policy_set(
        &self,
        contract_id: &str,
        policy_set_id: &str,
        request: &UpdatePolicySet,
    ) -> RemoteResult<PolicySet>;

    async fn delete_policy_set(&self, contract_id: &str, policy_set_id: &str) -> RemoteResult<()>;

    async fn list_policies(
        &self,
        contract_id: &str,
        policy_set_id: &str,
        network: Network,
    ) -> RemoteResult<ListPoliciesResponse>;
}

/// `ImagingApi` over HTTP
pub struct HttpImagingApi {
    api: ApiClient,
}

impl HttpImagingApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ImagingApi for HttpImagingApi {
    async fn create_policy_set(
        &self,
        contract_id: &str,
        request: &CreatePolicySet,
    ) -> RemoteResult<PolicySet> {
        let req = self
            .api
            .request(Method::POST, &format!("{}/policysets", API_PREFIX))
            .header("Contract", contract_id)
            .json(request);
        self.api.send_json(req).await
    }

    async fn get_policy_set(
        &self,
        contract_id: &str,
        policy_set_id: &str,
    ) -> RemoteResult<PolicySet> {
        let req = self
            .api
            .request(
                Method::GET,
                &format!("{}/policysets/{}", API_PREFIX, policy_set_id),
            )
            .header("Contract", contract_id);
        self.api.send_json(req).await
    }

    async fn update_policy_set(
        &self,
        contract_id: &str,
        policy_set_id: &str,
        request: &UpdatePolicySet,
    ) -> RemoteResult<PolicySet> {
        let req = self
            .api
            .request(
                Method::PUT,
                &format!("{}/policysets/{}", API_PREFIX, policy_set_id),
            )
            .header("Contract", contract_id)
            .json(request);
        self.api.send_json(req).await
    }

    async fn delete_policy_set(&self, contract_id: &str, policy_set_id: &str) -> RemoteResult<()> {
        let req = self
            .api
            .request(
                Method::DELETE,
                &format!("{}/policysets/{}", API_PREFIX, policy_set_id),
            )
            .header("Contract", contract_id);
        self.api.send_empty(req).await
    }

    async fn list_policies(
        &self,
        contract_id: &str,
        policy_set_id: &str,
        network: Network,
    ) -> RemoteResult<ListPoliciesResponse> {
        let req = self
            .api
            .request(
                Method::GET,
                &format!("{}/network/{}/policies", API_PREFIX, network),
            )
            .header("Contract", contract_id)
            .header("Policy-Set", policy_set_id);
        self.api.send_json(req).await
    }
}
