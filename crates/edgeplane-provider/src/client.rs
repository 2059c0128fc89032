//! Remote client and resource type traits
//!
//! `RemoteClient` is the narrow CRUD surface the engine calls; each remote
//! API family adapts its own SDK calls to it. `ResourceType` carries the
//! per-kind rules (schema, update payload shape, pre-delete checks).
//!
//! Calls are plain futures: dropping one cancels the in-flight request, and
//! the engine never detaches or retries them.

use crate::error::Result;
use crate::resource::{AttributeSchema, Attributes, Network, ResourceId, ResourceKind};
use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a remote client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("{0}")]
    NotFound(String),

    /// Timeouts, throttling, server errors; the same call may succeed later
    #[error("{0}")]
    Transient(String),

    /// The service refused the request; retrying will not help
    #[error("{0}")]
    Rejected(String),
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteError::Transient(_))
    }

    pub fn message(&self) -> &str {
        match self {
            RemoteError::NotFound(m) | RemoteError::Transient(m) | RemoteError::Rejected(m) => m,
        }
    }

    pub fn into_message(self) -> String {
        match self {
            RemoteError::NotFound(m) | RemoteError::Transient(m) | RemoteError::Rejected(m) => m,
        }
    }
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// A remote object and its attributes as the service reports them
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteObject {
    pub id: ResourceId,
    pub attributes: Attributes,
}

impl RemoteObject {
    pub fn new(id: ResourceId, attributes: Attributes) -> Self {
        Self { id, attributes }
    }
}

/// Filter for `RemoteClient::list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    /// Container whose children are listed
    pub parent: ResourceId,

    /// Network partition to list, or the client's default
    pub network: Option<Network>,
}

/// CRUD access to one resource kind of the remote service.
///
/// Implementations must be safe to share between engines.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn create(&self, request: &Attributes) -> RemoteResult<RemoteObject>;

    async fn read(&self, id: &ResourceId) -> RemoteResult<RemoteObject>;

    async fn update(&self, id: &ResourceId, request: &Attributes) -> RemoteResult<()>;

    async fn delete(&self, id: &ResourceId) -> RemoteResult<()>;

    async fn list(&self, filter: &ListFilter) -> RemoteResult<Vec<RemoteObject>>;
}

/// Payload shape the remote API expects on update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Only changed fields (removed fields as `null`)
    #[default]
    Partial,
    /// Every managed field
    Full,
}

/// Per-kind reconciliation rules
#[async_trait]
pub trait ResourceType: Send + Sync {
    fn kind(&self) -> ResourceKind;

    fn schema(&self) -> &AttributeSchema;

    fn update_mode(&self) -> UpdateMode {
        UpdateMode::Partial
    }

    /// Runs before the remote delete; an error aborts the delete
    async fn pre_delete(&self, _client: &dyn RemoteClient, _id: &ResourceId) -> Result<()> {
        Ok(())
    }
}
