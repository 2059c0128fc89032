use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("KDL parse error: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("failed to read rule document: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A structural block holds a number of entries other than the one allowed in strict mode
    #[error("{path}: {block} block: expected {want} element(s), got {got}")]
    TooManyElements {
        path: String,
        block: &'static str,
        got: usize,
        want: usize,
    },

    #[error("{path}: {block} block must contain an entry")]
    EmptyBlock { path: String, block: &'static str },

    /// A root-only field appeared in a nested rule
    #[error("{path}: cannot be used outside 'default' rule: {field}")]
    IllegalPlacement { field: String, path: String },

    #[error("invalid rule format '{0}': expected 'latest' or 'vYYYY-MM-DD'")]
    InvalidRuleFormat(String),

    #[error("{path}: unknown field '{field}'")]
    UnknownField { field: String, path: String },

    #[error("{path}: invalid value for '{field}': {message}")]
    InvalidValue {
        field: String,
        path: String,
        message: String,
    },

    #[error("{0} requires a name")]
    MissingName(&'static str),

    #[error("invalid rule document: {0}")]
    InvalidDocument(String),
}

pub type Result<T> = std::result::Result<T, RuleError>;
