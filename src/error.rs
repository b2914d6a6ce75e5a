//! Error types
//!
//! Store faults and key enumeration faults. Messages are extracted through
//! typed variants; `Unknown` carries no message.

/// Fallback detail used when a fault carries no message
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Failure raised by a key-value store backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying I/O failure (filesystem backend, seed file)
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Listing cursor could not be decoded
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    /// Backend-specific failure with a message
    #[error("{0}")]
    Backend(String),

    /// Failure with no usable message
    #[error("Unknown error")]
    Unknown,
}

impl StoreError {
    /// Human-readable message, if the fault carries one
    pub fn message(&self) -> Option<String> {
        let message = match self {
            Self::Unknown => return None,
            other => other.to_string(),
        };
        if message.trim().is_empty() {
            None
        } else {
            Some(message)
        }
    }

    /// Message with the `"Unknown error"` fallback applied
    pub fn details(&self) -> String {
        self.message().unwrap_or_else(|| UNKNOWN_ERROR.to_string())
    }
}

/// Failure while enumerating every key in the store
#[derive(Debug, thiserror::Error)]
pub enum EnumerationError {
    /// A page fetch failed; everything collected so far is discarded
    #[error("listing page {page} failed: {source}")]
    Store {
        page: usize,
        #[source]
        source: StoreError,
    },

    /// The store kept returning cursors past the configured page cap
    #[error("key enumeration exceeded {max_pages} pages")]
    PageLimitExceeded { max_pages: usize },

    /// The store handed back the cursor it was just given
    #[error("store returned the same cursor twice: {cursor}")]
    StalledCursor { cursor: String },
}

impl EnumerationError {
    /// Detail string exposed in the `/list-keys` error body
    pub fn details(&self) -> String {
        match self {
            Self::Store { source, .. } => source.details(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message() {
        let err = StoreError::Backend("namespace unavailable".to_string());
        assert_eq!(err.message().as_deref(), Some("namespace unavailable"));
        assert_eq!(err.details(), "namespace unavailable");
    }

    #[test]
    fn test_unknown_falls_back() {
        assert_eq!(StoreError::Unknown.message(), None);
        assert_eq!(StoreError::Unknown.details(), "Unknown error");
    }

    #[test]
    fn test_blank_message_falls_back() {
        let err = StoreError::Backend("  ".to_string());
        assert_eq!(err.details(), "Unknown error");
    }

    #[test]
    fn test_enumeration_details_use_store_message() {
        let err = EnumerationError::Store {
            page: 2,
            source: StoreError::Backend("timeout".to_string()),
        };
        assert_eq!(err.details(), "timeout");
        assert_eq!(err.to_string(), "listing page 2 failed: timeout");

        let err = EnumerationError::Store {
            page: 1,
            source: StoreError::Unknown,
        };
        assert_eq!(err.details(), "Unknown error");
    }

    #[test]
    fn test_enumeration_guard_details() {
        let err = EnumerationError::PageLimitExceeded { max_pages: 3 };
        assert_eq!(err.details(), "key enumeration exceeded 3 pages");
    }
}
