//! Status report — policies plus last committed token counts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One tool's policy and its users' stored token counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolStatus {
    pub capacity: u32,
    pub refill_rate: f64,
    /// user → tokens, as last persisted (not refilled to the present).
    pub users: BTreeMap<String, f64>,
}

/// tool → status, serialised as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusReport {
    tools: BTreeMap<String, ToolStatus>,
}

impl StatusReport {
    pub(crate) fn insert_tool(&mut self, tool: &str, capacity: u32, refill_rate: f64) {
        self.tools.insert(
            tool.to_string(),
            ToolStatus {
                capacity,
                refill_rate,
                users: BTreeMap::new(),
            },
        );
    }

    /// Record a user's tokens; ignored when the tool has no policy.
    pub(crate) fn insert_user(&mut self, tool: &str, user: &str, tokens: f64) -> bool {
        match self.tools.get_mut(tool) {
            Some(status) => {
                status.users.insert(user.to_string(), tokens);
                true
            }
            None => false,
        }
    }

    pub fn tool(&self, tool: &str) -> Option<&ToolStatus> {
        self.tools.get(tool)
    }

    pub fn tools(&self) -> impl Iterator<Item = (&str, &ToolStatus)> {
        self.tools.iter().map(|(name, status)| (name.as_str(), status))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialises_as_flat_mapping() {
        let mut report = StatusReport::default();
        report.insert_tool("search", 5, 1.0);
        assert!(report.insert_user("search", "alice", 3.5));
        assert!(!report.insert_user("unknown", "alice", 1.0));

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            json!({
                "search": {
                    "capacity": 5,
                    "refill_rate": 1.0,
                    "users": { "alice": 3.5 }
                }
            })
        );
    }
}
