//! EdgeKV error types

use edgeplane_provider::RemoteError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EdgeKvError {
    #[error("could not list items: {0}")]
    ListItems(RemoteError),

    #[error("could not read item '{item}': {source}")]
    GetItem { item: String, source: RemoteError },

    #[error("missing required attribute: {0}")]
    MissingAttribute(&'static str),

    #[error(transparent)]
    Provider(#[from] edgeplane_provider::ProviderError),
}

pub type Result<T> = std::result::Result<T, EdgeKvError>;
