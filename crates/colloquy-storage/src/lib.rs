//! Colloquy storage crate - SQLite persistence for threads and messages.
//!
//! Provides a WAL-mode SQLite database with migrations and repository
//! implementations for the thread/message data model. Messages are
//! append-only; thread metadata (`title`, `updated_at`) is the only
//! mutable state.

pub mod db;
pub mod migrations;
pub mod repository;

pub use db::Database;
pub use repository::{MessageRepository, ThreadRepository};
