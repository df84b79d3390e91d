//! Tool name identifier type.
//!
//! ToolName is the wire-level identity of a tool. Every conversation API
//! accepted here restricts function names to the same token pattern:
//! `^[a-zA-Z0-9_-]{1,64}$`.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Maximum length of a tool name accepted by the conversation APIs.
const MAX_LEN: usize = 64;

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("tool name pattern is valid"))
}

/// A validated tool name.
///
/// Example: `get_currencies`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToolName(String);

/// Error returned when attempting to create an invalid tool name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidToolName {
    /// The name was empty
    Empty,
    /// The name exceeded the maximum length
    TooLong {
        /// The length that was supplied
        len: usize,
        /// The maximum allowed length
        max: usize,
    },
    /// The name contained characters outside `[a-zA-Z0-9_-]`
    InvalidCharacters(String),
}

impl fmt::Display for InvalidToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "invalid tool name: must not be empty"),
            Self::TooLong { len, max } => {
                write!(f, "invalid tool name: {len} characters exceeds maximum of {max}")
            }
            Self::InvalidCharacters(name) => write!(
                f,
                "invalid tool name '{name}': only letters, digits, '_' and '-' are allowed"
            ),
        }
    }
}

impl std::error::Error for InvalidToolName {}

impl ToolName {
    /// Parses a tool name from a string, validating the pattern.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToolName::Empty` for an empty string,
    /// `InvalidToolName::TooLong` beyond 64 characters, and
    /// `InvalidToolName::InvalidCharacters` for anything outside the pattern.
    pub fn parse(s: &str) -> Result<Self, InvalidToolName> {
        if s.is_empty() {
            return Err(InvalidToolName::Empty);
        }
        if s.len() > MAX_LEN {
            return Err(InvalidToolName::TooLong {
                len: s.len(),
                max: MAX_LEN,
            });
        }
        if !pattern().is_match(s) {
            return Err(InvalidToolName::InvalidCharacters(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ToolName {
    type Err = InvalidToolName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ToolName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for ToolName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ToolName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_tool_name() {
        let name = ToolName::parse("get_currencies").unwrap();
        assert_eq!(name.as_str(), "get_currencies");
    }

    #[test]
    fn parse_accepts_dashes_and_digits() {
        assert!(ToolName::parse("geo-code-v2").is_ok());
    }

    #[test]
    fn parse_empty_fails() {
        assert_eq!(ToolName::parse(""), Err(InvalidToolName::Empty));
    }

    #[test]
    fn parse_too_long_fails() {
        let long = "a".repeat(65);
        assert!(matches!(
            ToolName::parse(&long),
            Err(InvalidToolName::TooLong { len: 65, max: 64 })
        ));
        assert!(ToolName::parse(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn parse_invalid_characters_fails() {
        assert!(matches!(
            ToolName::parse("get weather"),
            Err(InvalidToolName::InvalidCharacters(_))
        ));
        assert!(ToolName::parse("module.func").is_err());
    }

    #[test]
    fn serde_roundtrip_and_rejection() {
        let name = ToolName::parse("get_weather").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"get_weather\"");

        let bad: Result<ToolName, _> = serde_json::from_str("\"no spaces\"");
        assert!(bad.is_err());
    }

    #[test]
    fn tool_name_can_be_used_as_hash_key() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        let name = ToolName::parse("calc").unwrap();
        set.insert(name.clone());

        assert!(set.contains(&name));
    }
}
