//! Durable JSON documents.
//!
//! Each document is one pretty-printed JSON object on disk. A missing or empty
//! file reads as the default value. Writes use atomic temp-file + rename so a
//! crash or a concurrent reader never sees a half-written document.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::types::{Error, Result};

/// A single JSON document at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonDocument {
    path: PathBuf,
}

impl JsonDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document, falling back to `T::default()` when it does not exist.
    pub fn load<T>(&self) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "document absent, starting empty");
                return Ok(T::default());
            }
            Err(e) => return Err(Error::persistence(&self.path, e)),
        };

        if raw.trim().is_empty() {
            return Ok(T::default());
        }

        serde_json::from_str(&raw).map_err(|e| Error::malformed(&self.path, e))
    }

    /// Replace the document with `value`.
    pub fn save<T>(&self, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        let mut output =
            serde_json::to_vec_pretty(value).map_err(|e| Error::malformed(&self.path, e))?;
        output.push(b'\n');

        let dir = match self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            Some(dir) => {
                fs::create_dir_all(dir).map_err(|e| Error::persistence(dir, e))?;
                dir.to_path_buf()
            }
            None => PathBuf::from("."),
        };

        // One temp file per save, so overlapping writers never share a staging file.
        let mut staged = NamedTempFile::new_in(&dir).map_err(|e| Error::persistence(&dir, e))?;
        let staged_path = staged.path().to_path_buf();
        staged
            .write_all(&output)
            .map_err(|e| Error::persistence(&staged_path, e))?;
        staged
            .persist(&self.path)
            .map_err(|e| Error::persistence(&self.path, e.error))?;

        tracing::trace!(path = %self.path.display(), bytes = output.len(), "document saved");
        Ok(())
    }
}
