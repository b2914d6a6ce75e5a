//! Filesystem store backend
//!
//! Serves a directory tree: the key `docs/intro.json` maps to the file
//! `<data_dir>/docs/intro.json`. Keys are always `/`-separated.
//!
//! A key names a document when every directory on its path is a real
//! directory under the root and the last component is a regular file, or a
//! symlink resolving to a regular file under the root. Lookups and listings
//! apply the same rule.

use super::{paginate, Entry, KvStore, ListOptions, ListPage};
use crate::error::StoreError;
use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Directory-backed key-value store
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open a store rooted at `data_dir`, which must be an existing directory
    pub async fn open(data_dir: &str) -> Result<Self, StoreError> {
        let root = tokio::fs::canonicalize(data_dir).await?;
        let metadata = tokio::fs::metadata(&root).await?;
        if !metadata.is_dir() {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("data directory is not a directory: {data_dir}"),
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key to a path under the root
    ///
    /// Returns `None` for keys that could escape the root or that do not
    /// name a plain relative file.
    fn key_path(&self, key: &str) -> Option<PathBuf> {
        if key.is_empty() || key.split('/').any(|segment| segment.is_empty()) {
            return None;
        }
        let relative = Path::new(key);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }

    /// Resolve a document path to the regular file it names under the root
    ///
    /// Symlinks are followed only while their target stays under the root.
    async fn contained_file(&self, path: &Path) -> Result<Option<PathBuf>, StoreError> {
        let real = match tokio::fs::canonicalize(path).await {
            Ok(real) => real,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };
        if !real.starts_with(&self.root) {
            return Ok(None);
        }
        let metadata = tokio::fs::metadata(&real).await?;
        Ok(metadata.is_file().then_some(real))
    }

    /// Check that `path` sits in a real directory reached without symlinks
    async fn has_real_parent(&self, path: &Path) -> Result<bool, StoreError> {
        let Some(parent) = path.parent() else {
            return Ok(false);
        };
        match tokio::fs::canonicalize(parent).await {
            Ok(real) if real == parent => Ok(tokio::fs::metadata(&real).await?.is_dir()),
            Ok(_) => Ok(false),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Collect every file below the root as a `/`-separated key, sorted
    async fn collect_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                let path = entry.path();
                let is_document = if file_type.is_dir() {
                    pending.push(path);
                    continue;
                } else if file_type.is_symlink() {
                    self.contained_file(&path).await?.is_some()
                } else {
                    file_type.is_file()
                };
                if is_document {
                    if let Some(key) = self.path_to_key(&path) {
                        keys.push(key);
                    }
                }
            }
        }

        keys.sort_unstable();
        Ok(keys)
    }

    fn path_to_key(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let segments: Option<Vec<&str>> = relative
            .components()
            .map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();
        segments.map(|s| s.join("/"))
    }
}

#[async_trait]
impl KvStore for FsStore {
    async fn get_with_metadata(&self, key: &str) -> Result<Option<Entry>, StoreError> {
        let Some(path) = self.key_path(key) else {
            return Ok(None);
        };

        if !self.has_real_parent(&path).await? {
            return Ok(None);
        }
        let Some(file) = self.contained_file(&path).await? else {
            return Ok(None);
        };

        // Values are text; undecodable bytes are replaced, not rejected
        match tokio::fs::read(&file).await {
            Ok(bytes) => Ok(Some(Entry::new(String::from_utf8_lossy(&bytes)))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn list(&self, options: ListOptions) -> Result<ListPage, StoreError> {
        let keys = self.collect_keys().await?;
        paginate(keys.iter().map(String::as_str), &options)
    }
}
