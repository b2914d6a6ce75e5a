//! Document resolution
//!
//! Turns a request path plus an optional `If-None-Match` value into one of
//! three outcomes: the document, "not modified", or "not found".

use super::key::StorageKey;
use crate::error::StoreError;
use crate::http::cache::{check_etag_match, ValidationToken};
use crate::store::KvStore;

/// Outcome of resolving one document request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Full document body with its validator
    Found {
        key: StorageKey,
        body: String,
        etag: ValidationToken,
    },
    /// Client copy is current
    NotModified { key: StorageKey, etag: ValidationToken },
    /// No entry, or an empty value, under the derived key
    NotFound { key: StorageKey },
}

/// Resolve a document request against `store`
///
/// Store faults are returned as-is; the caller decides how to answer them.
pub async fn resolve_document(
    store: &dyn KvStore,
    path: &str,
    if_none_match: Option<&str>,
    suffix: &str,
) -> Result<Resolution, StoreError> {
    let key = StorageKey::from_path(path, suffix);

    let body = match store.get_with_metadata(key.as_str()).await? {
        Some(entry) if !entry.value.is_empty() => entry.value,
        _ => return Ok(Resolution::NotFound { key }),
    };

    let etag = ValidationToken::for_content(&body);

    if check_etag_match(if_none_match, &etag) {
        return Ok(Resolution::NotModified { key, etag });
    }

    Ok(Resolution::Found { key, body, etag })
}
