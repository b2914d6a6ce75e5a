//! Key-value store module
//!
//! Read-only view of the document store: point lookups by key and
//! cursor-paginated key listing. Backends:
//! - `memory`: ordered in-memory map, optionally seeded from a JSON file
//! - `fs`: a directory tree, one file per key

pub mod fs;
pub mod memory;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::StoreError;
use crate::logger;
use async_trait::async_trait;
use std::sync::Arc;

pub use fs::FsStore;
pub use memory::MemoryStore;

/// Largest page a single `list` call returns
pub const MAX_LIST_LIMIT: usize = 1000;

/// A stored value together with its optional metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub value: String,
    pub metadata: Option<serde_json::Value>,
}

impl Entry {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            metadata: None,
        }
    }
}

/// Listing request
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Continuation cursor from the previous page, `None` for the first page
    pub cursor: Option<String>,
    /// Requested page size, clamped to `1..=MAX_LIST_LIMIT`
    pub limit: usize,
}

/// A key as reported by `list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedKey {
    pub name: String,
}

/// One page of listing results
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub keys: Vec<ListedKey>,
    /// Present while more pages remain
    pub cursor: Option<String>,
}

/// Document store interface
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the text value and metadata stored under `key`
    async fn get_with_metadata(&self, key: &str) -> Result<Option<Entry>, StoreError>;

    /// Fetch one page of key names
    async fn list(&self, options: ListOptions) -> Result<ListPage, StoreError>;
}

/// Shared handle to the configured store
pub type SharedStore = Arc<dyn KvStore>;

/// Open the backend selected in configuration
pub async fn open(config: &StoreConfig) -> Result<SharedStore, StoreError> {
    match config.backend {
        StoreBackend::Memory => {
            let store = match config.seed_file.as_deref() {
                Some(path) => MemoryStore::from_seed_file(path).await?,
                None => MemoryStore::new(),
            };
            logger::log_info(&format!(
                "Memory store loaded with {} documents",
                store.len().await
            ));
            Ok(Arc::new(store))
        }
        StoreBackend::Fs => {
            let store = FsStore::open(&config.data_dir).await?;
            logger::log_info(&format!(
                "Serving documents from {}",
                store.root().display()
            ));
            Ok(Arc::new(store))
        }
    }
}

/// Clamp a requested page size to what a single call may return
pub const fn clamp_limit(limit: usize) -> usize {
    if limit == 0 || limit > MAX_LIST_LIMIT {
        MAX_LIST_LIMIT
    } else {
        limit
    }
}

/// Encode the last key of a page as an opaque cursor
pub fn encode_cursor(last_key: &str) -> String {
    hex::encode(last_key.as_bytes())
}

/// Decode a cursor back into the key it resumes after
pub fn decode_cursor(cursor: &str) -> Result<String, StoreError> {
    let bytes = hex::decode(cursor).map_err(|_| StoreError::InvalidCursor(cursor.to_string()))?;
    String::from_utf8(bytes).map_err(|_| StoreError::InvalidCursor(cursor.to_string()))
}

/// Cut one page out of lexicographically sorted key names
///
/// Shared by the backends so both honor the same cursor scheme: the cursor
/// names the last key already returned.
pub fn paginate<'a, I>(sorted_keys: I, options: &ListOptions) -> Result<ListPage, StoreError>
where
    I: IntoIterator<Item = &'a str>,
{
    let resume_after = options.cursor.as_deref().map(decode_cursor).transpose()?;
    let limit = clamp_limit(options.limit);

    let mut remaining = sorted_keys
        .into_iter()
        .filter(|key| resume_after.as_deref().map_or(true, |after| *key > after))
        .peekable();

    let keys: Vec<ListedKey> = remaining
        .by_ref()
        .take(limit)
        .map(|name| ListedKey {
            name: name.to_string(),
        })
        .collect();

    let cursor = match (remaining.peek(), keys.last()) {
        (Some(_), Some(last)) => Some(encode_cursor(&last.name)),
        _ => None,
    };

    Ok(ListPage { keys, cursor })
}
