//! Colloquy core crate - shared types, errors, and configuration.
//!
//! Defines the thread/message data model, the top-level error enum used
//! across crate boundaries, and the TOML-backed application configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::ColloquyConfig;
pub use error::{ColloquyError, Result};
pub use types::*;
