pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "EDGEPLANE_CONFIG_PATH";

const CANDIDATES: [&str; 2] = ["edgeplane.local.yaml", "edgeplane.yaml"];

/// Provider configuration (`edgeplane.yaml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EdgeplaneConfig {
    pub rules: RulesConfig,
    pub state: StateConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulesConfig {
    /// Rule format used when a document does not name one
    pub format: String,

    /// One entry per behavior/criterion block
    pub strict: bool,

    /// Fields allowed only in the default rule, on top of the built-in ones
    pub root_only: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            format: "latest".to_string(),
            strict: true,
            root_only: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StateConfig {
    pub dir: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".edgeplane"),
        }
    }
}

impl EdgeplaneConfig {
    pub fn from_yaml(content: &str, origin: &str) -> Result<Self> {
        // An empty file is a valid, all-default config
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content, &path.display().to_string())?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load the discovered config file, or defaults when there is none
    pub fn load_or_default() -> Result<(Self, Option<PathBuf>)> {
        match find_config_file() {
            Ok(path) => Ok((Self::load(&path)?, Some(path))),
            Err(ConfigError::ConfigFileNotFound) => {
                tracing::debug!("No config file found, using defaults");
                Ok((Self::default(), None))
            }
            Err(e) => Err(e),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Global config location (`~/.config/edgeplane/edgeplane.yaml`)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("edgeplane").join("edgeplane.yaml"))
}

/// Find the project's edgeplane.yaml
///
/// Search order:
/// 1. `EDGEPLANE_CONFIG_PATH` (direct path)
/// 2. current directory: edgeplane.local.yaml, edgeplane.yaml
/// 3. `./.edgeplane/` with the same names
/// 4. `~/.config/edgeplane/edgeplane.yaml` (global config)
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(
            "{} points at a missing file: {}",
            CONFIG_PATH_ENV,
            path.display()
        );
    }

    let current_dir = std::env::current_dir()?;

    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let project_dir = current_dir.join(".edgeplane");
    if project_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = project_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(global_config) = global_config_path()
        && global_config.exists()
    {
        return Ok(global_config);
    }

    Err(ConfigError::ConfigFileNotFound)
}
