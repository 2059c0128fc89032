//! Observed-state snapshots
//!
//! Manages the `state.json` file under the state directory (`.edgeplane` by
//! default), which records the last reconciled state of every resource.

use crate::error::{ProviderError, Result};
use crate::resource::{Attributes, LifecycleStatus, ResourceId, ResourceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

const STATE_VERSION: u32 = 1;
const STATE_FILE: &str = "state.json";
const STATE_BACKUP: &str = "state.json.backup";
const LOCK_FILE: &str = "lock.json";

/// Snapshot of every managed resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// State file version
    pub version: u32,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Resources indexed by kind:id
    pub resources: BTreeMap<String, ResourceRecord>,
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get records of one resource kind
    pub fn by_kind(&self, kind: ResourceKind) -> Vec<&ResourceRecord> {
        self.resources.values().filter(|r| r.kind == kind).collect()
    }

    /// Add or update a record
    pub fn upsert(&mut self, record: ResourceRecord) {
        self.resources.insert(record.key(), record);
        self.updated_at = Utc::now();
    }

    /// Remove a record
    pub fn remove(&mut self, key: &str) -> Option<ResourceRecord> {
        let result = self.resources.remove(key);
        if result.is_some() {
            self.updated_at = Utc::now();
        }
        result
    }

    pub fn get(&self, key: &str) -> Option<&ResourceRecord> {
        self.resources.get(key)
    }
}

/// Persisted state of one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub kind: ResourceKind,
    pub id: ResourceId,
    pub status: LifecycleStatus,
    pub declared: Attributes,
    pub observed: Attributes,

    /// Error that moved the resource to `failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    pub updated_at: DateTime<Utc>,
}

impl ResourceRecord {
    /// Full resource key (kind:id)
    pub fn key(&self) -> String {
        format!("{}:{}", self.kind, self.id)
    }
}

/// State manager for reading/writing state files
pub struct StateManager {
    state_dir: PathBuf,
}

impl StateManager {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            state_dir: state_dir.as_ref().to_path_buf(),
        }
    }

    fn state_path(&self) -> PathBuf {
        self.state_dir.join(STATE_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.state_dir.join(STATE_BACKUP)
    }

    fn lock_path(&self) -> PathBuf {
        self.state_dir.join(LOCK_FILE)
    }

    async fn ensure_state_dir(&self) -> Result<()> {
        if !self.state_dir.exists() {
            fs::create_dir_all(&self.state_dir).await?;
            tracing::debug!("Created state directory: {}", self.state_dir.display());
        }
        Ok(())
    }

    /// Load the current snapshot, or an empty one if none was saved yet
    pub async fn load(&self) -> Result<StateSnapshot> {
        let path = self.state_path();
        if !path.exists() {
            tracing::debug!("State file not found, returning empty state");
            return Ok(StateSnapshot::new());
        }

        let content = fs::read_to_string(&path).await?;
        let state: StateSnapshot = serde_json::from_str(&content)?;

        if state.version > STATE_VERSION {
            return Err(ProviderError::StateError(format!(
                "State file version {} is newer than supported version {}",
                state.version, STATE_VERSION
            )));
        }

        tracing::debug!("Loaded state with {} resources", state.resources.len());
        Ok(state)
    }

    /// Save the snapshot, keeping the previous file as a backup
    pub async fn save(&self, state: &StateSnapshot) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.state_path();
        let backup = self.backup_path();

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
            tracing::debug!("Created state backup");
        }

        let content = serde_json::to_string_pretty(state)?;
        fs::write(&path, content).await?;

        tracing::debug!("Saved state with {} resources", state.resources.len());
        Ok(())
    }

    /// Acquire a lock for exclusive access
    pub async fn acquire_lock(&self) -> Result<StateLock> {
        self.ensure_state_dir().await?;

        let lock_path = self.lock_path();

        if lock_path.exists() {
            let content = fs::read_to_string(&lock_path).await?;
            let lock_info: LockInfo = serde_json::from_str(&content)?;

            // Locks older than an hour are considered stale
            let age = Utc::now().signed_duration_since(lock_info.acquired_at);
            if age.num_hours() < 1 {
                return Err(ProviderError::LockError(format!(
                    "State is locked by {} since {}",
                    lock_info.holder, lock_info.acquired_at
                )));
            }

            tracing::warn!("Removing stale lock from {}", lock_info.holder);
        }

        let lock_info = LockInfo {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            acquired_at: Utc::now(),
        };

        let content = serde_json::to_string_pretty(&lock_info)?;
        fs::write(&lock_path, content).await?;

        tracing::debug!("Acquired state lock");
        Ok(StateLock {
            lock_path,
            released: false,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

/// RAII guard for state lock
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            if self.lock_path.exists() {
                fs::remove_file(&self.lock_path).await?;
                tracing::debug!("Released state lock");
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released && self.lock_path.exists() {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn record() -> ResourceRecord {
        ResourceRecord {
            kind: ResourceKind::ImagingPolicySet,
            id: ResourceId::new("1-TEST:testID"),
            status: LifecycleStatus::Present,
            declared: Attributes::from([("name".to_string(), json!("test_policy_set"))]),
            observed: Attributes::from([("region".to_string(), json!("EMEA"))]),
            last_error: None,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_state_save_load() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let mut state = StateSnapshot::new();
        state.upsert(record());

        manager.save(&state).await.unwrap();

        let loaded = manager.load().await.unwrap();
        assert_eq!(loaded.resources.len(), 1);
        let loaded_record = loaded.get("imaging_policy_set:1-TEST:testID").unwrap();
        assert_eq!(loaded_record, &record_with_time(loaded_record.updated_at));
        assert_eq!(loaded.by_kind(ResourceKind::ImagingPolicySet).len(), 1);
        assert!(loaded.by_kind(ResourceKind::EdgeKvItem).is_empty());
    }

    fn record_with_time(updated_at: DateTime<Utc>) -> ResourceRecord {
        ResourceRecord {
            updated_at,
            ..record()
        }
    }

    #[tokio::test]
    async fn test_save_keeps_backup() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        manager.save(&StateSnapshot::new()).await.unwrap();
        manager.save(&StateSnapshot::new()).await.unwrap();

        assert!(temp_dir.path().join(STATE_BACKUP).exists());
    }

    #[tokio::test]
    async fn test_empty_state() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let state = manager.load().await.unwrap();
        assert!(state.resources.is_empty());
    }

    #[tokio::test]
    async fn test_newer_version_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let state = StateSnapshot {
            version: STATE_VERSION + 1,
            ..Default::default()
        };
        manager.save(&state).await.unwrap();

        assert!(matches!(
            manager.load().await,
            Err(ProviderError::StateError(_))
        ));
    }

    #[tokio::test]
    async fn test_lock_is_exclusive() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let lock = manager.acquire_lock().await.unwrap();
        assert!(matches!(
            manager.acquire_lock().await,
            Err(ProviderError::LockError(_))
        ));

        lock.release().await.unwrap();
        let relock = manager.acquire_lock().await.unwrap();
        drop(relock);
        assert!(!temp_dir.path().join(LOCK_FILE).exists());
    }

    #[test]
    fn test_remove_record() {
        let mut state = StateSnapshot::new();
        state.upsert(record());
        assert!(state.remove("imaging_policy_set:1-TEST:testID").is_some());
        assert!(state.remove("imaging_policy_set:1-TEST:testID").is_none());
    }
}
