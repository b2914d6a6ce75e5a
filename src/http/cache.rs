//! HTTP cache control module
//!
//! Provides document fingerprinting, `ETag` generation and conditional
//! request handling.

use sha2::{Digest, Sha256};
use std::fmt;

/// Weak validator marker a client may prefix to an entity tag
const WEAK_PREFIX: &str = "W/";

/// Compute the fingerprint of a document
///
/// Lowercase hex SHA-256 over the exact text, 64 characters.
pub fn fingerprint(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Quoted form of a fingerprint exchanged through `ETag` / `If-None-Match`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationToken(String);

impl ValidationToken {
    pub fn from_fingerprint(fingerprint: &str) -> Self {
        Self(format!("\"{fingerprint}\""))
    }

    /// Fingerprint and quote a document in one step
    pub fn for_content(content: &str) -> Self {
        Self::from_fingerprint(&fingerprint(content))
    }

    /// Header value, quotes included
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Token with surrounding quotes removed
    pub fn unquoted(&self) -> &str {
        self.0.trim_matches('"')
    }
}

impl fmt::Display for ValidationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a client-supplied validator for comparison
///
/// Drops a leading `W/` and any surrounding double quotes.
pub fn normalize_validator(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix(WEAK_PREFIX)
        .unwrap_or(value)
        .trim_matches('"')
}

/// Check if client's `If-None-Match` header matches the server's token
///
/// The header is treated as a single validator; weak and strong forms of
/// the same tag compare equal.
///
/// # Returns
/// Returns true if matched (should return 304), false otherwise
pub fn check_etag_match(if_none_match: Option<&str>, token: &ValidationToken) -> bool {
    if_none_match.is_some_and(|client| normalize_validator(client) == token.unquoted())
}

/// Cache control policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Public cache with specified max-age (seconds)
    Public(u32),
    /// No cache
    NoCache,
}

impl CachePolicy {
    /// Convert to Cache-Control header value
    pub fn to_header_value(self) -> String {
        match self {
            Self::Public(max_age) => format!("public, max-age={max_age}"),
            Self::NoCache => "no-cache".to_string(),
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::Public(300)
    }
}
