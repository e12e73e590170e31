//! Security identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a tradable instrument.
///
/// The engine only hashes, orders and clones securities; the ticker string
/// is opaque to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Security(String);

impl Security {
    /// Create a security from a ticker.
    pub fn new(ticker: impl Into<String>) -> Self {
        Self(ticker.into())
    }

    /// Get the ticker.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Security {
    fn from(ticker: &str) -> Self {
        Self::new(ticker)
    }
}

impl From<String> for Security {
    fn from(ticker: String) -> Self {
        Self(ticker)
    }
}

impl AsRef<str> for Security {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_serde_is_transparent() {
        let sec = Security::new("SPY");
        let json = serde_json::to_string(&sec).unwrap();
        assert_eq!(json, "\"SPY\"");

        let back: Security = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sec);
    }

    #[test]
    fn test_security_display() {
        assert_eq!(Security::from("QQQ").to_string(), "QQQ");
    }
}
