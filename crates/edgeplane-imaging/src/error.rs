//! Imaging error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("invalid {field}: '{value}' (expected one of: {expected})")]
    InvalidValue {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("missing required attribute: {0}")]
    MissingAttribute(&'static str),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Provider(#[from] edgeplane_provider::ProviderError),
}

pub type Result<T> = std::result::Result<T, ImagingError>;
