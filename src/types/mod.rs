//! Core types for the admission engine.
//!
//! - **IDs**: Strongly-typed identifiers (ToolId, UserId, BucketKey)
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Document locations, engine behaviour, logging

mod config;
mod errors;
mod ids;

pub use config::{Config, DeniedRefill, EngineConfig, ObservabilityConfig, StoreConfig};
pub use errors::{Error, Result, EXIT_ERROR};
pub use ids::{BucketKey, ToolId, UserId, KEY_SEPARATOR};
