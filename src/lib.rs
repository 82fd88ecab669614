//! # Toolbucket - per-tool, per-user admission control
//!
//! Token-bucket rate limiting for tool invocations, with limits and consumption
//! state kept in two JSON documents so decisions survive across processes:
//! - Limit registry: tool → capacity and refill rate
//! - Bucket engine: lazy refill, admit/deny, durable accounting
//! - Engine handle: one engine shared by many async callers
//!
//! ## Architecture
//!
//! ```text
//!                    ┌─────────────────────────────────┐
//!   check/set/...  → │          BucketEngine           │
//!                    │  ┌──────────────┐ ┌──────────┐  │
//!                    │  │LimitRegistry │ │ Buckets  │  │
//!                    │  └──────┬───────┘ └────┬─────┘  │
//!                    └─────────┼──────────────┼────────┘
//!                              ▼              ▼
//!                         config.json     state.json
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod engine;
pub mod registry;
pub mod store;
pub mod types;
pub mod validation;

// Internal utilities
pub mod observability;

pub use engine::{BucketEngine, Decision, EngineHandle, StatusReport};
pub use registry::{LimitRegistry, Policy};
pub use types::{Config, Error, Result, ToolId, UserId};
