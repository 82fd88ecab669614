//! Bucket engine — admission decisions with lazy refill and durable accounting.
//!
//! The engine owns the limit registry and every live bucket. A check is one
//! logical step: resolve the policy, create or refill the bucket, debit one
//! token if available, persist the state document, answer. Nothing runs in the
//! background; time only matters when a check looks at the clock.
//!
//! ```text
//!   check(tool, user)
//!        │
//!        ▼
//!   LimitRegistry ──(no policy)──► Error::UnknownTool
//!        │ policy
//!        ▼
//!   bucket absent? ──yes──► Bucket::full
//!        │ no
//!        ▼
//!   Bucket::refilled
//!        │
//!        ▼
//!   try_debit ──none──► Denied
//!        │ some
//!        ▼
//!   persist state ──► Allowed
//! ```
//!
//! `BucketEngine` is a plain value driven through `&mut self`. Share it across
//! tasks with [`EngineHandle`], which funnels every call through one owner.

pub mod bucket;
pub mod clock;
pub mod handle;
pub mod status;

pub use bucket::Bucket;
pub use clock::{Clock, ManualClock, SystemClock};
pub use handle::EngineHandle;
pub use status::{StatusReport, ToolStatus};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::registry::{LimitRegistry, Policy};
use crate::store::JsonDocument;
use crate::types::{BucketKey, Config, DeniedRefill, Error, Result, StoreConfig, ToolId, UserId};

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allowed,
    Denied,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allowed
    }

    /// Process exit code for the command-line collaborator.
    pub fn exit_code(self) -> i32 {
        match self {
            Decision::Allowed => 0,
            Decision::Denied => 1,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Allowed => write!(f, "ALLOWED"),
            Decision::Denied => write!(f, "DENIED"),
        }
    }
}

/// Token-bucket admission engine over a policy document and a state document.
#[derive(Debug)]
pub struct BucketEngine {
    registry: LimitRegistry,
    state: JsonDocument,
    /// "tool:user" → bucket, mirroring the state document.
    buckets: BTreeMap<String, Bucket>,
    clock: Arc<dyn Clock>,
    denied_refill: DeniedRefill,
}

impl BucketEngine {
    /// Load both documents using the system clock.
    pub fn open(store: &StoreConfig) -> Result<Self> {
        Self::open_with_clock(store, Arc::new(SystemClock))
    }

    /// Load both documents with an injected clock.
    pub fn open_with_clock(store: &StoreConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let registry = LimitRegistry::open(&store.policy_path)?;
        let state = JsonDocument::new(&store.state_path);
        let buckets: BTreeMap<String, Bucket> = state.load()?;

        tracing::debug!(
            state = %store.state_path.display(),
            buckets = buckets.len(),
            "bucket state loaded"
        );
        Ok(Self {
            registry,
            state,
            buckets,
            clock,
            denied_refill: DeniedRefill::default(),
        })
    }

    /// Open from a full configuration (store locations and engine options).
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::open(&config.store)?.with_denied_refill(config.engine.denied_refill))
    }

    pub fn with_denied_refill(mut self, mode: DeniedRefill) -> Self {
        self.denied_refill = mode;
        self
    }

    pub fn registry(&self) -> &LimitRegistry {
        &self.registry
    }

    /// Decide whether `user` may use `tool` now, consuming a token if so.
    ///
    /// Capacity and refill rate are read from the registry on every call, so
    /// a new limit applies to the very next check.
    pub fn check(&mut self, tool: &ToolId, user: &UserId) -> Result<Decision> {
        let policy = self
            .registry
            .get_policy(tool)
            .ok_or_else(|| Error::unknown_tool(tool.as_str()))?;

        let key = BucketKey::new(tool.clone(), user.clone()).to_string();
        let now = self.clock.now_secs();
        let previous = self.buckets.get(&key).copied();
        let current = Self::prepare(previous, &policy, now);

        match current.try_debit() {
            Some(debited) => {
                self.commit(key, previous, debited)?;
                tracing::debug!(tool = %tool, user = %user, tokens = debited.tokens, "allowed");
                Ok(Decision::Allowed)
            }
            None => {
                if self.denied_refill == DeniedRefill::Persist {
                    self.commit(key, previous, current)?;
                }
                tracing::debug!(tool = %tool, user = %user, tokens = current.tokens, "denied");
                Ok(Decision::Denied)
            }
        }
    }

    /// A new bucket starts full and is not refilled again in the same call.
    fn prepare(previous: Option<Bucket>, policy: &Policy, now: f64) -> Bucket {
        match previous {
            None => Bucket::full(policy, now),
            Some(bucket) => bucket.refilled(policy, now),
        }
    }

    /// Store `bucket` under `key` and persist; on failure restore `previous`.
    fn commit(&mut self, key: String, previous: Option<Bucket>, bucket: Bucket) -> Result<()> {
        self.buckets.insert(key.clone(), bucket);

        if let Err(e) = self.state.save(&self.buckets) {
            match previous {
                Some(old) => {
                    self.buckets.insert(key.clone(), old);
                }
                None => {
                    self.buckets.remove(&key);
                }
            }
            tracing::error!(key = %key, error = %e, "failed to persist bucket state");
            return Err(e);
        }
        Ok(())
    }

    /// Insert or overwrite a tool's policy. Existing token counts are untouched.
    pub fn set_limit(&mut self, tool: &ToolId, capacity: u32, refill_rate: f64) -> Result<()> {
        self.registry.set_limit(tool, capacity, refill_rate)
    }

    /// Policies and last persisted token counts, without refilling.
    pub fn status(&self) -> StatusReport {
        let mut report = StatusReport::default();
        for (tool, policy) in self.registry.policies() {
            report.insert_tool(tool, policy.capacity, policy.refill_rate);
        }

        for (raw_key, bucket) in &self.buckets {
            match BucketKey::parse(raw_key) {
                Some(key) => {
                    report.insert_user(key.tool().as_str(), key.user().as_str(), bucket.tokens);
                }
                None => tracing::warn!(key = %raw_key, "skipping unparseable bucket key"),
            }
        }
        report
    }

    /// Drop every bucket for every tool and user. Policies are kept.
    pub fn reset(&mut self) -> Result<()> {
        let cleared = std::mem::take(&mut self.buckets);

        if let Err(e) = self.state.save(&self.buckets) {
            self.buckets = cleared;
            tracing::error!(error = %e, "failed to persist bucket reset");
            return Err(e);
        }

        tracing::info!(buckets = cleared.len(), "all buckets reset");
        Ok(())
    }

    /// The stored bucket for one pair, if it exists.
    pub fn bucket(&self, tool: &ToolId, user: &UserId) -> Option<Bucket> {
        let key = BucketKey::new(tool.clone(), user.clone()).to_string();
        self.buckets.get(&key).copied()
    }

    /// Number of live buckets across all tools.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}
