//! Scripted imaging API for lifecycle tests

use async_trait::async_trait;
use edgeplane_imaging::{
    CreatePolicySet, ImagingApi, ListPoliciesResponse, MediaType, PolicyOutput, PolicySet, Region,
    UpdatePolicySet,
};
use edgeplane_provider::{Network, RemoteError, RemoteResult};
use std::collections::VecDeque;
use std::sync::Mutex;

pub const CONTRACT_ID: &str = "1-TEST";
pub const POLICY_SET_ID: &str = "testID";
pub const POLICY_SET_NAME: &str = "test_policy_set";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(String, CreatePolicySet),
    Get(String, String),
    Update(String, String, UpdatePolicySet),
    Delete(String, String),
    List(String, String, Network),
}

pub enum Reply {
    PolicySet(PolicySet),
    Policies(ListPoliciesResponse),
    Done,
    Error(RemoteError),
}

#[derive(Default)]
pub struct MockImaging {
    script: Mutex<VecDeque<(Call, Reply)>>,
    calls: Mutex<Vec<Call>>,
}

impl MockImaging {
    pub fn on(&self, call: Call, reply: Reply) -> &Self {
        self.script.lock().unwrap().push_back((call, reply));
        self
    }

    /// Script the same call `times` times
    pub fn on_times(&self, call: Call, reply: impl Fn() -> Reply, times: usize) -> &Self {
        for _ in 0..times {
            self.on(call.clone(), reply());
        }
        self
    }

    pub fn count(&self, predicate: fn(&Call) -> bool) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| predicate(c))
            .count()
    }

    pub fn verify(&self) {
        let script = self.script.lock().unwrap();
        assert!(
            script.is_empty(),
            "expected calls not made: {:?}",
            script.iter().map(|(c, _)| c).collect::<Vec<_>>()
        );
    }

    fn next(&self, call: Call) -> Reply {
        self.calls.lock().unwrap().push(call.clone());
        let (expected, reply) = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected call: {:?}", call));
        assert_eq!(expected, call);
        reply
    }
}

#[async_trait]
impl ImagingApi for MockImaging {
    async fn create_policy_set(
        &self,
        contract_id: &str,
        request: &CreatePolicySet,
    ) -> RemoteResult<PolicySet> {
        match self.next(Call::Create(contract_id.to_string(), request.clone())) {
            Reply::PolicySet(set) => Ok(set),
            Reply::Error(e) => Err(e),
            _ => panic!("bad reply for create"),
        }
    }

    async fn get_policy_set(
        &self,
        contract_id: &str,
        policy_set_id: &str,
    ) -> RemoteResult<PolicySet> {
        match self.next(Call::Get(contract_id.to_string(), policy_set_id.to_string())) {
            Reply::PolicySet(set) => Ok(set),
            Reply::Error(e) => Err(e),
            _ => panic!("bad reply for get"),
        }
    }

    async fn update_policy_set(
        &self,
        contract_id: &str,
        policy_set_id: &str,
        request: &UpdatePolicySet,
    ) -> RemoteResult<PolicySet> {
        match self.next(Call::Update(
            contract_id.to_string(),
            policy_set_id.to_string(),
            request.clone(),
        )) {
            Reply::PolicySet(set) => Ok(set),
            Reply::Error(e) => Err(e),
            _ => panic!("bad reply for update"),
        }
    }

    async fn delete_policy_set(&self, contract_id: &str, policy_set_id: &str) -> RemoteResult<()> {
        match self.next(Call::Delete(
            contract_id.to_string(),
            policy_set_id.to_string(),
        )) {
            Reply::Done => Ok(()),
            Reply::Error(e) => Err(e),
            _ => panic!("bad reply for delete"),
        }
    }

    async fn list_policies(
        &self,
        contract_id: &str,
        policy_set_id: &str,
        network: Network,
    ) -> RemoteResult<ListPoliciesResponse> {
        match self.next(Call::List(
            contract_id.to_string(),
            policy_set_id.to_string(),
            network,
        )) {
            Reply::Policies(response) => Ok(response),
            Reply::Error(e) => Err(e),
            _ => panic!("bad reply for list"),
        }
    }
}

pub fn policy_set(region: Region) -> PolicySet {
    PolicySet {
        id: POLICY_SET_ID.to_string(),
        name: POLICY_SET_NAME.to_string(),
        region,
        media_type: MediaType::Image,
        last_modified_date: None,
    }
}

pub fn policies(ids: &[&str]) -> ListPoliciesResponse {
    ListPoliciesResponse::new(ids.iter().map(|id| PolicyOutput::new(*id)).collect())
}

pub fn create_call(region: Region) -> Call {
    Call::Create(
        CONTRACT_ID.to_string(),
        CreatePolicySet {
            name: POLICY_SET_NAME.to_string(),
            region,
            media_type: MediaType::Image,
        },
    )
}

pub fn get_call() -> Call {
    Call::Get(CONTRACT_ID.to_string(), POLICY_SET_ID.to_string())
}

pub fn list_call(network: Network) -> Call {
    Call::List(
        CONTRACT_ID.to_string(),
        POLICY_SET_ID.to_string(),
        network,
    )
}

pub fn delete_call() -> Call {
    Call::Delete(CONTRACT_ID.to_string(), POLICY_SET_ID.to_string())
}
