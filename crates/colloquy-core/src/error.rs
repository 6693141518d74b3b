use thiserror::Error;

/// Top-level error type for the Colloquy system.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for ColloquyError`
/// so that the `?` operator works seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ColloquyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for ColloquyError {
    fn from(err: toml::de::Error) -> Self {
        ColloquyError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ColloquyError {
    fn from(err: toml::ser::Error) -> Self {
        ColloquyError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ColloquyError {
    fn from(err: serde_json::Error) -> Self {
        ColloquyError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Colloquy operations.
pub type Result<T> = std::result::Result<T, ColloquyError>;
