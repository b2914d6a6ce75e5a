//! Full key enumeration
//!
//! Walks the store's cursor-paginated listing until no cursor remains.

use crate::error::EnumerationError;
use crate::store::{KvStore, ListOptions};

/// Page size requested from the store on every call
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Upper bound on page fetches for one enumeration
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// Limits applied to one enumeration
#[derive(Debug, Clone, Copy)]
pub struct EnumerationLimits {
    pub page_size: usize,
    pub max_pages: usize,
}

impl Default for EnumerationLimits {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Return every key name in the store, in the order the store lists them
///
/// Any failed page aborts the walk and nothing collected so far is returned.
pub async fn list_all_keys(
    store: &dyn KvStore,
    limits: EnumerationLimits,
) -> Result<Vec<String>, EnumerationError> {
    let mut keys = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0;

    loop {
        if pages >= limits.max_pages {
            return Err(EnumerationError::PageLimitExceeded {
                max_pages: limits.max_pages,
            });
        }
        pages += 1;

        let page = store
            .list(ListOptions {
                cursor: cursor.clone(),
                limit: limits.page_size,
            })
            .await
            .map_err(|source| EnumerationError::Store {
                page: pages,
                source,
            })?;

        keys.extend(page.keys.into_iter().map(|k| k.name));

        match page.cursor {
            Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                return Err(EnumerationError::StalledCursor { cursor: next });
            }
            Some(next) => cursor = Some(next),
            None => return Ok(keys),
        }
    }
}
