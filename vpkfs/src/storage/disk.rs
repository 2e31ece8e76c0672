//! Local disk storage backend.
//!
//! Paths are handed to `tokio::fs` as-is after backslash normalization, so
//! drive-letter paths (`C:/Steam/...`) work on Windows and absolute Unix
//! paths work everywhere else.

use std::sync::OnceLock;
use std::time::SystemTime;

use bytes::Bytes;
use regex::Regex;
use tracing::{debug, warn};

use super::traits::{BoxFuture, DirEntry, FileKind, Stat, StorageSource};

/// Pattern for the numbered data chunks of a multi-part VPK (`pak01_003.vpk`).
///
/// Chunks are never archives on their own, so glob expansion skips them.
fn chunk_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)_\d{3}\.vpk$").unwrap())
}

/// Local disk storage backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskSource;

impl DiskSource {
    /// Create a new disk source.
    pub fn new() -> Self {
        Self
    }

    fn native(path: &str) -> String {
        path.replace('\\', "/")
    }
}

impl StorageSource for DiskSource {
    fn read_file<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Option<Bytes>> {
        Box::pin(async move {
            match tokio::fs::read(Self::native(path)).await {
                Ok(data) => Some(Bytes::from(data)),
                Err(e) => {
                    debug!(path = %path, error = %e, "Disk read failed");
                    None
                }
            }
        })
    }

    fn read_directory<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Option<Vec<DirEntry>>> {
        Box::pin(async move {
            let mut reader = tokio::fs::read_dir(Self::native(path)).await.ok()?;
            let mut entries = Vec::new();
            loop {
                match reader.next_entry().await {
                    Ok(Some(entry)) => {
                        let name = entry.file_name().to_string_lossy().to_string();
                        // file_type() does not follow symlinks; metadata() does
                        let kind = match tokio::fs::metadata(entry.path()).await {
                            Ok(meta) if meta.is_dir() => FileKind::Directory,
                            Ok(_) => FileKind::File,
                            Err(_) => continue,
                        };
                        entries.push(DirEntry::new(name, kind));
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(path = %path, error = %e, "Directory listing interrupted");
                        break;
                    }
                }
            }
            entries.sort_by(|a, b| a.name.cmp(&b.name));
            Some(entries)
        })
    }

    fn stat<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Option<Stat>> {
        Box::pin(async move {
            let meta = tokio::fs::metadata(Self::native(path)).await.ok()?;
            let kind = if meta.is_dir() {
                FileKind::Directory
            } else {
                FileKind::File
            };
            Some(Stat {
                kind,
                size: if meta.is_dir() { 0 } else { meta.len() },
                ctime: meta.created().unwrap_or(SystemTime::UNIX_EPOCH),
                mtime: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            })
        })
    }

    fn glob<'a>(&'a self, pattern: &'a str) -> BoxFuture<'a, Option<Vec<String>>> {
        let pattern = Self::native(pattern);
        Box::pin(async move {
            let expanded = tokio::task::spawn_blocking(move || expand_glob(&pattern)).await;
            match expanded {
                Ok(paths) => Some(paths),
                Err(e) => {
                    warn!(error = %e, "Glob expansion task failed");
                    Some(Vec::new())
                }
            }
        })
    }
}

fn expand_glob(pattern: &str) -> Vec<String> {
    let paths = match glob::glob(pattern) {
        Ok(paths) => paths,
        Err(e) => {
            warn!(pattern = %pattern, error = %e, "Invalid glob pattern");
            return Vec::new();
        }
    };

    let mut out: Vec<String> = paths
        .filter_map(Result::ok)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .filter(|p| !chunk_pattern().is_match(p))
        .collect();
    out.sort();
    out
}
