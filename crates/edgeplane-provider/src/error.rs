//! Provider error types

use crate::client::RemoteError;
use crate::resource::LifecycleStatus;
use std::fmt;
use thiserror::Error;

/// Remote operation that was in flight when an error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    List,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
            Operation::List => write!(f, "list"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ProviderError {
    /// The remote service failed the call; `message` is the service's own text
    #[error("{operation} {key} failed: {message}")]
    RemoteCallFailed {
        key: String,
        operation: Operation,
        message: String,
        retryable: bool,
    },

    #[error("Resource not found: {0}")]
    ResourceMissing(String),

    #[error("cannot delete {key}: {count} dependent resource(s) remain: {}", .dependents.join(", "))]
    DependentResourcesRemain {
        key: String,
        count: usize,
        dependents: Vec<String>,
    },

    #[error("invalid lifecycle transition: {from} -> {to}")]
    InvalidTransition {
        from: LifecycleStatus,
        to: LifecycleStatus,
    },

    #[error("resource identity is immutable: expected {expected}, got {actual}")]
    IdentityMismatch { expected: String, actual: String },

    #[error("{key}: changing {} requires replacement", .fields.join(", "))]
    RequiresReplacement { key: String, fields: Vec<String> },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    pub fn remote(key: impl fmt::Display, operation: Operation, error: RemoteError) -> Self {
        let retryable = error.is_transient();
        ProviderError::RemoteCallFailed {
            key: key.to_string(),
            operation,
            message: error.into_message(),
            retryable,
        }
    }

    /// Whether the orchestration driver may retry the same call
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RemoteCallFailed {
                retryable: true,
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
