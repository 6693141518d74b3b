//! Application state shared across all route handlers.
//!
//! AppState holds the orchestrator, repositories, and configuration.
//! It is passed to handlers via axum's State extractor.

use std::sync::Arc;

use colloquy_chat::ConversationOrchestrator;
use colloquy_core::config::ColloquyConfig;
use colloquy_provider::CompletionClient;
use colloquy_storage::{Database, MessageRepository, ThreadRepository};

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<ColloquyConfig>,
    /// SQLite database for persistent storage.
    pub database: Arc<Database>,
    /// Thread metadata store.
    pub threads: Arc<ThreadRepository>,
    /// Message store.
    pub messages: Arc<MessageRepository>,
    /// The conversation pipeline coordinator.
    pub orchestrator: Arc<ConversationOrchestrator>,
}

impl AppState {
    /// Create a new AppState over the given database and completion client.
    ///
    /// The client should already carry its retry/deadline policy; the
    /// composition root (or a test) decides what stands behind it.
    pub fn new(
        config: ColloquyConfig,
        database: Database,
        client: Arc<dyn CompletionClient>,
    ) -> Self {
        let database = Arc::new(database);
        let orchestrator = ConversationOrchestrator::new(
            Arc::clone(&database),
            client,
            config.chat.clone(),
            config.provider.model.clone(),
        );
        Self {
            config: Arc::new(config),
            threads: Arc::new(ThreadRepository::new(Arc::clone(&database))),
            messages: Arc::new(MessageRepository::new(Arc::clone(&database))),
            orchestrator: Arc::new(orchestrator),
            database,
        }
    }
}
