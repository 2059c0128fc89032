use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "config file not found. Checked:\n\
        - current directory: edgeplane.local.yaml, edgeplane.yaml\n\
        - ./.edgeplane/ directory\n\
        - ~/.config/edgeplane/edgeplane.yaml\n\
        Set EDGEPLANE_CONFIG_PATH to point at a file directly"
    )]
    ConfigFileNotFound,

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
