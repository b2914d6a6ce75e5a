//! Storage key derivation
//!
//! Maps a request path onto the key a document is stored under.

use std::fmt;

/// Suffix every document key carries
pub const DEFAULT_SUFFIX: &str = ".json";

/// Normalized identifier of one document in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Derive the key for a request path
    ///
    /// Strips every leading `/` and appends `suffix` unless already present.
    /// Never fails; the same path always yields the same key.
    pub fn from_path(path: &str, suffix: &str) -> Self {
        let trimmed = path.trim_start_matches('/');
        if trimmed.ends_with(suffix) {
            Self(trimmed.to_string())
        } else {
            Self(format!("{trimmed}{suffix}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
