//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use std::path::PathBuf;
use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Exit code reported for any engine failure (unknown tool included).
pub const EXIT_ERROR: i32 = 2;

/// Main error enum for the admission engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Check requested for a tool that has no policy.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Invalid policy values (capacity, refill rate) or configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Malformed identifiers.
    #[error("validation error: {0}")]
    Validation(String),

    /// A document could not be read or written.
    #[error("persistence error at {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document exists but does not hold the expected JSON mapping.
    #[error("malformed document at {}: {source}", .path.display())]
    MalformedDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The engine task behind an `EngineHandle` has stopped.
    #[error("engine is no longer running")]
    EngineClosed,
}

impl Error {
    /// True for failures of the durable documents, as opposed to caller errors.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Error::Persistence { .. } | Error::MalformedDocument { .. }
        )
    }

    /// Process exit code for the command-line collaborator.
    ///
    /// Every error maps to the same code so automated callers can tell
    /// "not configured / broken" apart from an ordinary denial.
    pub fn exit_code(&self) -> i32 {
        EXIT_ERROR
    }
}

// Convenience constructors
impl Error {
    pub fn unknown_tool(tool: impl Into<String>) -> Self {
        Self::UnknownTool(tool.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::MalformedDocument {
            path: path.into(),
            source,
        }
    }
}
