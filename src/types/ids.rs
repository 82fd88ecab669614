//! Strongly-typed identifiers.
//!
//! All IDs are validated at construction time and implement common traits.

use serde::Serialize;
use std::fmt;

use crate::validation;

/// Separator between the tool and user parts of a bucket key.
pub const KEY_SEPARATOR: char = ':';

/// Macro to define a strongly-typed ID newtype wrapper.
///
/// Generates: struct, `new()`, `as_str()`, Display, Serialize, `TryFrom<&str>`.
/// The validator receives the raw string and the type name.
macro_rules! define_id {
    ($name:ident, $validate:path) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> crate::types::Result<Self> {
                let s = s.into();
                $validate(&s, stringify!($name))?;
                Ok(Self(s))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = crate::types::Error;

            fn try_from(s: &str) -> crate::types::Result<Self> {
                Self::new(s)
            }
        }
    };
}

define_id!(ToolId, validation::validate_tool_name);
define_id!(UserId, validation::validate_non_empty);

/// Composite `tool:user` key addressing one consumer's bucket.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey {
    tool: ToolId,
    user: UserId,
}

impl BucketKey {
    pub fn new(tool: ToolId, user: UserId) -> Self {
        Self { tool, user }
    }

    /// Split a stored key on its first separator.
    ///
    /// Returns `None` when there is no separator or either part is invalid.
    pub fn parse(raw: &str) -> Option<Self> {
        let (tool, user) = raw.split_once(KEY_SEPARATOR)?;
        Some(Self {
            tool: ToolId::new(tool).ok()?,
            user: UserId::new(user).ok()?,
        })
    }

    pub fn tool(&self) -> &ToolId {
        &self.tool
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.tool, KEY_SEPARATOR, self.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_id_rejects_separator() {
        assert!(ToolId::new("search").is_ok());
        assert!(ToolId::new("a:b").is_err());
        assert!(ToolId::new("").is_err());
    }

    #[test]
    fn test_user_id_allows_separator() {
        let user = UserId::new("org:alice").unwrap();
        assert_eq!(user.as_str(), "org:alice");
        assert!(UserId::new("").is_err());
    }

    #[test]
    fn test_bucket_key_display() {
        let key = BucketKey::new(ToolId::new("search").unwrap(), UserId::new("alice").unwrap());
        assert_eq!(key.to_string(), "search:alice");
    }

    #[test]
    fn test_bucket_key_parse_splits_on_first_separator() {
        let key = BucketKey::parse("search:org:alice").unwrap();
        assert_eq!(key.tool().as_str(), "search");
        assert_eq!(key.user().as_str(), "org:alice");
    }

    #[test]
    fn test_bucket_key_parse_rejects_garbage() {
        assert!(BucketKey::parse("no-separator").is_none());
        assert!(BucketKey::parse(":alice").is_none());
        assert!(BucketKey::parse("search:").is_none());
    }
}
