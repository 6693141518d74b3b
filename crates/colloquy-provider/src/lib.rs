//! Colloquy provider crate - the completion provider boundary.
//!
//! Defines the `CompletionClient` trait, an HTTP client for
//! OpenAI-compatible chat completion endpoints, the provider error
//! taxonomy (timeout / transient / fatal), and a retrying wrapper that
//! enforces an overall wall-clock deadline with exponential backoff.

pub mod client;
pub mod retry;

pub use client::{
    Completion, CompletionClient, CompletionRequest, ContextMessage, HttpCompletionClient,
    ProviderError,
};
pub use retry::{RetryPolicy, RetryingClient};
