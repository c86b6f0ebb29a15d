//! Error types for URLGuard

/// Result type alias using URLGuard's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for URLGuard operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The incoming payload or URL is not usable
    #[error("{0}")]
    RequestValidation(String),

    /// The classifier artifact is missing or corrupt
    #[error("model load error: {0}")]
    ModelLoad(String),

    /// The loaded classifier produced an unexpected shape
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Configuration errors (e.g. remote strategy without an API key)
    #[error("configuration error: {0}")]
    Config(String),

    /// Remote reasoning failures that were not absorbed by the fallback policy
    #[error("remote reasoning error: {0}")]
    RemoteReasoning(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new request validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::RequestValidation(msg.into())
    }

    /// Create a new model load error
    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new remote reasoning error
    pub fn remote_reasoning(msg: impl Into<String>) -> Self {
        Self::RemoteReasoning(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short machine-readable name of the error kind, used for metrics labels
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequestValidation(_) => "validation",
            Self::ModelLoad(_) => "model_load",
            Self::Classifier(_) => "classifier",
            Self::Config(_) => "configuration",
            Self::RemoteReasoning(_) => "remote_reasoning",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Internal(_) => "internal",
        }
    }
}
