//! Conversation pipeline for Colloquy.
//!
//! Turns an inbound user message into a persisted exchange: the
//! orchestrator coordinates the context builder, the completion client,
//! and the thread/message repositories, absorbing provider failures into
//! a fallback assistant reply so an exchange is always closed.

pub mod context;
pub mod error;
pub mod orchestrator;

pub use context::ContextBuilder;
pub use error::ChatError;
pub use orchestrator::ConversationOrchestrator;
