//! In-memory store backend
//!
//! Keeps entries in an ordered map so listing order is lexicographic.
//! Used for tests and for small deployments seeded from a JSON file.

use super::{paginate, Entry, KvStore, ListOptions, ListPage};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Ordered in-memory key-value store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `(key, value)` pairs
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let entries = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Entry::new(v)))
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Load a seed file holding one JSON object of `key -> document`
    ///
    /// String values are stored verbatim; any other value is stored as its
    /// compact JSON text.
    pub async fn from_seed_file(path: &str) -> Result<Self, StoreError> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_seed_json(&raw)
    }

    fn from_seed_json(raw: &str) -> Result<Self, StoreError> {
        let parsed: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)
            .map_err(|e| StoreError::Backend(format!("invalid seed file: {e}")))?;

        let pairs = parsed.into_iter().map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, text)
        });
        Ok(Self::from_pairs(pairs))
    }

    /// Insert or replace an entry
    ///
    /// Serving never writes; this exists for seeding and tests.
    pub async fn insert(&self, key: impl Into<String>, entry: Entry) {
        self.entries.write().await.insert(key.into(), entry);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get_with_metadata(&self, key: &str) -> Result<Option<Entry>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn list(&self, options: ListOptions) -> Result<ListPage, StoreError> {
        let entries = self.entries.read().await;
        paginate(entries.keys().map(String::as_str), &options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_existing_and_missing() {
        let store = MemoryStore::from_pairs([("a.json", "{\"a\":1}")]);

        let entry = store.get_with_metadata("a.json").await.unwrap().unwrap();
        assert_eq!(entry.value, "{\"a\":1}");
        assert!(entry.metadata.is_none());

        assert!(store.get_with_metadata("b.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_lexicographic_and_paginated() {
        let store = MemoryStore::from_pairs([("c", "3"), ("a", "1"), ("b", "2")]);

        let first = store
            .list(ListOptions {
                cursor: None,
                limit: 2,
            })
            .await
            .unwrap();
        let names: Vec<_> = first.keys.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(first.cursor.is_some());

        let second = store
            .list(ListOptions {
                cursor: first.cursor,
                limit: 2,
            })
            .await
            .unwrap();
        assert_eq!(second.keys.len(), 1);
        assert_eq!(second.keys[0].name, "c");
        assert!(second.cursor.is_none());
    }

    #[tokio::test]
    async fn test_insert_with_metadata() {
        let store = MemoryStore::new();
        store
            .insert(
                "m.json",
                Entry {
                    value: "{}".to_string(),
                    metadata: Some(serde_json::json!({"owner": "ops"})),
                },
            )
            .await;

        assert_eq!(store.len().await, 1);
        let entry = store.get_with_metadata("m.json").await.unwrap().unwrap();
        assert_eq!(entry.metadata.unwrap()["owner"], "ops");
    }

    #[test]
    fn test_seed_json() {
        let store =
            MemoryStore::from_seed_json(r#"{"raw.json":"{\"x\": 1}","obj.json":{"y":[1,2]}}"#)
                .unwrap();
        let entries = store.entries.try_read().unwrap();
        assert_eq!(entries["raw.json"].value, "{\"x\": 1}");
        assert_eq!(entries["obj.json"].value, "{\"y\":[1,2]}");
    }

    #[test]
    fn test_seed_json_rejects_non_object() {
        let err = MemoryStore::from_seed_json("[1, 2]").unwrap_err();
        assert!(err.to_string().starts_with("invalid seed file"));
    }
}
