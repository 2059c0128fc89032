//! edgeplane provider abstraction
//!
//! Drives managed resources through their create/read/update/delete
//! lifecycle against a remote management API and detects drift between
//! declared and observed state.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │             Orchestration driver                 │
//! └─────────────────┬───────────────────────────────┘
//!                   │ plan / apply / create / read / update / delete
//! ┌─────────────────▼───────────────────────────────┐
//! │               edgeplane-provider                 │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │          ReconciliationEngine             │   │
//! │  │   lifecycle state machine + DriftDetector │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ ResourceType │  │  State Mgmt  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────┬───────────────────────┘
//!         │ trait RemoteClient
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │    imaging    │ │    edgekv     │
//! │  policy sets  │ │     items     │
//! └───────────────┘ └───────────────┘
//! ```

pub mod action;
pub mod client;
pub mod drift;
pub mod engine;
pub mod error;
pub mod guard;
pub mod http;
pub mod resource;
pub mod state;

// Re-exports
pub use action::{Action, ActionType, ApplyResult, Plan, PlanSummary};
pub use client::{
    ListFilter, RemoteClient, RemoteError, RemoteObject, RemoteResult, ResourceType, UpdateMode,
};
pub use drift::{ChangeKind, ChangeSet, DriftDetector, FieldChange};
pub use engine::{ReconciliationEngine, UpdateOutcome};
pub use error::{Operation, ProviderError, Result};
pub use guard::{AUTO_SENTINEL, DependentsGuard, count_remaining};
pub use http::ApiClient;
pub use resource::{
    AttributeSchema, Attributes, FieldKind, FieldSchema, LifecycleStatus, ManagedResource,
    Network, ResourceId, ResourceKind,
};
pub use state::{ResourceRecord, StateLock, StateManager, StateSnapshot};
