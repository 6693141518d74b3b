//! Context assembly for completion requests.
//!
//! Maps the bounded recent slice of a thread's stored messages into the
//! minimal `{role, content}` shape the completion provider expects.

use colloquy_provider::ContextMessage;
use colloquy_storage::MessageRepository;

use crate::error::ChatError;

/// Builds the ordered message history sent to the completion provider.
///
/// Pure read: for a given storage state, building the context twice
/// yields the same sequence.
pub struct ContextBuilder {
    window: usize,
}

impl ContextBuilder {
    /// Create a builder with a fixed recent-message window.
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Read the most recent messages of a thread, oldest-first, mapped to
    /// provider turns.
    pub fn build(
        &self,
        messages: &MessageRepository,
        thread_id: &str,
    ) -> Result<Vec<ContextMessage>, ChatError> {
        let window = messages.recent_window(thread_id, self.window as u64)?;
        Ok(window
            .into_iter()
            .map(|m| ContextMessage::new(m.role.as_str(), m.content))
            .collect())
    }
}
