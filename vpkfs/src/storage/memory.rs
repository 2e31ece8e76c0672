//! In-memory storage backend.
//!
//! Holds whole files keyed by their `/`-delimited path. Directories are never
//! stored explicitly; a directory exists when at least one file lives beneath
//! it. Useful for embedding content and for exercising the filesystem without
//! touching disk.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use parking_lot::RwLock;

use super::traits::{BoxFuture, DirEntry, FileKind, Stat, StorageSource};
use crate::vpath;

/// In-memory storage backend.
///
/// Every successful or failed `read_file` call increments a counter, which
/// lets callers observe whether a higher layer re-read backing bytes.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: RwLock<BTreeMap<String, Bytes>>,
    reads: AtomicUsize,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a file.
    pub fn insert(&self, path: &str, data: impl Into<Bytes>) {
        self.files.write().insert(vpath::normalize(path), data.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_file(self, path: &str, data: impl Into<Bytes>) -> Self {
        self.insert(path, data);
        self
    }

    /// Remove a file, returning whether it existed.
    pub fn remove(&self, path: &str) -> bool {
        self.files.write().remove(&vpath::normalize(path)).is_some()
    }

    /// Number of `read_file` calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Whether any file lives beneath `dir`.
    fn has_children(files: &BTreeMap<String, Bytes>, dir: &str) -> bool {
        let prefix = dir_prefix(dir);
        files
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(&prefix))
    }
}

fn dir_prefix(dir: &str) -> String {
    if dir == "/" {
        "/".to_string()
    } else {
        format!("{}/", dir)
    }
}

impl StorageSource for MemorySource {
    fn read_file<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Option<Bytes>> {
        Box::pin(async move {
            self.reads.fetch_add(1, Ordering::Relaxed);
            self.files.read().get(&vpath::normalize(path)).cloned()
        })
    }

    fn read_directory<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Option<Vec<DirEntry>>> {
        Box::pin(async move {
            let dir = vpath::normalize(path);
            let prefix = dir_prefix(&dir);
            let files = self.files.read();

            let mut entries: Vec<DirEntry> = Vec::new();
            for key in files.range(prefix.clone()..).map(|(k, _)| k) {
                let Some(rest) = key.strip_prefix(&prefix) else {
                    break;
                };
                let entry = match rest.split_once('/') {
                    Some((child, _)) => DirEntry::directory(child),
                    None => DirEntry::file(rest),
                };
                if !entries.iter().any(|e| e.name == entry.name) {
                    entries.push(entry);
                }
            }

            if entries.is_empty() {
                None
            } else {
                Some(entries)
            }
        })
    }

    fn stat<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Option<Stat>> {
        Box::pin(async move {
            let path = vpath::normalize(path);
            let files = self.files.read();
            if let Some(data) = files.get(&path) {
                return Some(Stat::file(data.len() as u64));
            }
            if Self::has_children(&files, &path) {
                return Some(Stat::directory());
            }
            None
        })
    }
}
