//! Limit registry — per-tool admission policies.
//!
//! Maps each tool to the capacity and refill rate that govern every user's
//! bucket for that tool. Policies change only through `set_limit`; a check
//! never creates one. The whole mapping is written back as a single document
//! after every change.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::store::JsonDocument;
use crate::types::{Error, Result, ToolId};
use crate::validation::{validate_capacity, validate_refill_rate};

/// Capacity and refill rate for one tool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Maximum tokens a bucket can hold (burst size).
    pub capacity: u32,
    /// Tokens added per second of elapsed time.
    pub refill_rate: f64,
}

impl Policy {
    pub fn new(capacity: u32, refill_rate: f64) -> Result<Self> {
        validate_capacity(capacity)?;
        validate_refill_rate(refill_rate)?;
        Ok(Self {
            capacity,
            refill_rate,
        })
    }

    /// Capacity as a token count.
    pub fn max_tokens(&self) -> f64 {
        f64::from(self.capacity)
    }
}

/// Tool → policy mapping backed by the policy document.
#[derive(Debug)]
pub struct LimitRegistry {
    document: JsonDocument,
    policies: BTreeMap<String, Policy>,
}

impl LimitRegistry {
    /// Load the registry from `path`; a missing document yields an empty registry.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let document = JsonDocument::new(path.as_ref());
        let policies: BTreeMap<String, Policy> = document.load()?;

        for (tool, policy) in &policies {
            ToolId::new(tool.as_str())
                .and_then(|_| Policy::new(policy.capacity, policy.refill_rate))
                .map_err(|e| {
                    Error::config(format!(
                        "invalid policy for '{}' in {}: {}",
                        tool,
                        document.path().display(),
                        e
                    ))
                })?;
        }

        tracing::debug!(
            path = %document.path().display(),
            tools = policies.len(),
            "limit registry loaded"
        );
        Ok(Self {
            document,
            policies,
        })
    }

    /// Insert or overwrite the policy for `tool` and persist the registry.
    pub fn set_limit(&mut self, tool: &ToolId, capacity: u32, refill_rate: f64) -> Result<()> {
        let policy = Policy::new(capacity, refill_rate)?;
        let previous = self.policies.insert(tool.as_str().to_string(), policy);

        if let Err(e) = self.document.save(&self.policies) {
            match previous {
                Some(old) => self.policies.insert(tool.as_str().to_string(), old),
                None => self.policies.remove(tool.as_str()),
            };
            return Err(e);
        }

        tracing::info!(tool = %tool, capacity, refill_rate, "limit set");
        Ok(())
    }

    /// Look up the policy for `tool`.
    pub fn get_policy(&self, tool: &ToolId) -> Option<Policy> {
        self.policies.get(tool.as_str()).copied()
    }

    /// All policies, ordered by tool name.
    pub fn policies(&self) -> impl Iterator<Item = (&str, &Policy)> {
        self.policies.iter().map(|(tool, policy)| (tool.as_str(), policy))
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
