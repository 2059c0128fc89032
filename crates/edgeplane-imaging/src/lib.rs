//! Image & video manager policy sets for edgeplane
//!
//! Implements the `imaging_policy_set` resource kind on top of the
//! reconciliation engine in `edgeplane-provider`.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use edgeplane_imaging::{HttpImagingApi, PolicySetClient, PolicySetResource, PolicySetSpec};
//! use edgeplane_provider::{ApiClient, ReconciliationEngine};
//!
//! let api = HttpImagingApi::new(ApiClient::new(signed_client, "https://host.example.com"));
//! let client = Arc::new(PolicySetClient::new(Arc::new(api)));
//! let mut engine = ReconciliationEngine::new(client, Arc::new(PolicySetResource::new()));
//!
//! engine.create(spec.to_attributes()).await?;
//! ```

pub mod api;
pub mod error;
pub mod model;
pub mod policy_set;

pub use api::{HttpImagingApi, ImagingApi};
pub use error::{ImagingError, Result};
pub use model::{
    CreatePolicySet, ListPoliciesResponse, MediaType, PolicyOutput, PolicySet, Region,
    UpdatePolicySet,
};
pub use policy_set::{
    PolicySetClient, PolicySetResource, PolicySetSpec, filter_remaining_policies,
    policy_set_attributes,
};
