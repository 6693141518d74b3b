//! Colloquy HTTP API crate.
//!
//! Exposes the conversation pipeline over a JSON HTTP interface built
//! with axum. The router, handlers, shared state, and error mapping
//! live here; the binary crate wires them together at startup.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::{create_router, start_server};
pub use state::AppState;
