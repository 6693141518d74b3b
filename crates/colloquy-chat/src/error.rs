//! Error types for the conversation pipeline.

use colloquy_core::error::ColloquyError;

/// Errors from the conversation pipeline.
///
/// Provider failures never appear here: the orchestrator converts them
/// into the fallback reply. Only validation and storage problems surface.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("thread not found: {0}")]
    ThreadNotFound(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<ColloquyError> for ChatError {
    fn from(err: ColloquyError) -> Self {
        ChatError::Storage(err.to_string())
    }
}
