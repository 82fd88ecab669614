//! Token bucket state and its pure transitions.
//!
//! Creation, refill and debit are separate steps so the engine can create a
//! bucket full and skip the refill for it in the same call.

use serde::{Deserialize, Serialize};

use crate::registry::Policy;

/// One (tool, user) bucket as stored in the state document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Available tokens, in `[0, capacity]`.
    pub tokens: f64,
    /// Epoch seconds of the last committed refill.
    pub last_refill: f64,
}

impl Bucket {
    /// A bucket holding the full capacity of `policy`.
    pub fn full(policy: &Policy, now: f64) -> Self {
        Self {
            tokens: policy.max_tokens(),
            last_refill: now,
        }
    }

    /// Tokens accrued since `last_refill`, capped at capacity.
    ///
    /// A clock that went backwards counts as zero elapsed time.
    pub fn refilled(&self, policy: &Policy, now: f64) -> Self {
        let elapsed = (now - self.last_refill).max(0.0);
        let tokens = (self.tokens + elapsed * policy.refill_rate)
            .min(policy.max_tokens())
            .max(0.0);
        Self {
            tokens,
            last_refill: now,
        }
    }

    /// Take one token, if there is one.
    pub fn try_debit(&self) -> Option<Self> {
        if self.tokens >= 1.0 {
            Some(Self {
                tokens: self.tokens - 1.0,
                last_refill: self.last_refill,
            })
        } else {
            None
        }
    }
}
