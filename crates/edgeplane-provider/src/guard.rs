//! Pre-delete guard for container resources
//!
//! A container may only be deleted once no user-owned dependents remain in
//! any network. Every network is listed before the decision is made.

use crate::client::{ListFilter, RemoteClient};
use crate::error::{Operation, ProviderError, Result};
use crate::resource::{Network, ResourceId};

/// Identifier of dependents the service creates on its own
pub const AUTO_SENTINEL: &str = ".auto";

/// Number of ids left after dropping every `sentinel` entry
pub fn count_remaining<'a, I>(ids: I, sentinel: &str) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    ids.into_iter().filter(|id| *id != sentinel).count()
}

#[derive(Debug, Clone)]
pub struct DependentsGuard {
    networks: Vec<Network>,
    sentinel: String,
}

impl DependentsGuard {
    pub fn new(networks: impl IntoIterator<Item = Network>) -> Self {
        Self {
            networks: networks.into_iter().collect(),
            sentinel: AUTO_SENTINEL.to_string(),
        }
    }

    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    /// Fails with `DependentResourcesRemain` if any network still holds a
    /// non-sentinel dependent of `id`.
    pub async fn check(&self, client: &dyn RemoteClient, id: &ResourceId) -> Result<()> {
        let mut dependents = Vec::new();

        for network in &self.networks {
            let filter = ListFilter {
                parent: id.clone(),
                network: Some(*network),
            };
            let objects = client
                .list(&filter)
                .await
                .map_err(|e| ProviderError::remote(id, Operation::List, e))?;

            let remaining: Vec<String> = objects
                .iter()
                .filter(|o| o.id.as_str() != self.sentinel)
                .map(|o| format!("{}/{}", network, o.id))
                .collect();
            tracing::debug!("{} has {} dependent(s) on {}", id, remaining.len(), network);
            dependents.extend(remaining);
        }

        if !dependents.is_empty() {
            return Err(ProviderError::DependentResourcesRemain {
                key: id.to_string(),
                count: dependents.len(),
                dependents,
            });
        }

        Ok(())
    }
}
