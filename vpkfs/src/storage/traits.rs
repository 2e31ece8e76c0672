//! Core traits for read-only storage backends.
//!
//! The `StorageSource` trait is the only way the rest of the crate touches
//! bytes. Archive readers, folder providers and the install resolver all hold
//! an `Arc<dyn StorageSource>` and never reach for `std::fs` directly.
//!
//! # Design Principles
//!
//! - **Absent, not failed**: every not-found or unreadable condition is `None`
//! - **Forward-slash paths**: backends translate to their own path form
//! - **Read-only**: no write, rename or delete operations exist
//! - **Dyn-compatible**: uses `Pin<Box<dyn Future>>` for trait object support

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::SystemTime;

use bytes::Bytes;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Kind of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// A regular file.
    File,
    /// A directory.
    Directory,
}

impl FileKind {
    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileKind::File)
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileKind::Directory)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileKind::File => "file",
            FileKind::Directory => "dir",
        };
        f.pad(name)
    }
}

/// Metadata for a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    /// File or directory.
    pub kind: FileKind,

    /// Size in bytes (0 for directories).
    pub size: u64,

    /// Creation time, `UNIX_EPOCH` when unknown.
    pub ctime: SystemTime,

    /// Modification time, `UNIX_EPOCH` when unknown.
    pub mtime: SystemTime,
}

impl Stat {
    /// Metadata for a file with no recoverable timestamps.
    pub fn file(size: u64) -> Self {
        Self {
            kind: FileKind::File,
            size,
            ctime: SystemTime::UNIX_EPOCH,
            mtime: SystemTime::UNIX_EPOCH,
        }
    }

    /// Metadata for a directory with no recoverable timestamps.
    pub fn directory() -> Self {
        Self {
            kind: FileKind::Directory,
            size: 0,
            ctime: SystemTime::UNIX_EPOCH,
            mtime: SystemTime::UNIX_EPOCH,
        }
    }
}

/// An immediate child of a directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirEntry {
    /// Entry name (a single path segment).
    pub name: String,

    /// Whether the entry is a file or a directory.
    pub kind: FileKind,
}

impl DirEntry {
    /// Create a new directory entry.
    pub fn new(name: impl Into<String>, kind: FileKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create a file entry.
    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, FileKind::File)
    }

    /// Create a directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self::new(name, FileKind::Directory)
    }
}

/// Read-only storage backend.
///
/// Implementations must return `None` for any not-found condition and must
/// never panic or surface an error for a simply-missing path. Real I/O
/// failures are also reported as `None`; backends may log them.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` so a single backend can be shared
/// by every archive reader and provider built over it.
pub trait StorageSource: Send + Sync {
    /// Read a whole file.
    fn read_file<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Option<Bytes>>;

    /// List the immediate children of a directory.
    fn read_directory<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Option<Vec<DirEntry>>>;

    /// Stat a file or directory.
    fn stat<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Option<Stat>>;

    /// Expand a glob pattern into concrete paths.
    ///
    /// Returns `None` when the backend has no glob capability; callers then
    /// treat the pattern as one literal path. `Some(vec![])` means the
    /// pattern was expanded and matched nothing.
    fn glob<'a>(&'a self, _pattern: &'a str) -> BoxFuture<'a, Option<Vec<String>>> {
        Box::pin(async { None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_helpers() {
        assert!(FileKind::File.is_file());
        assert!(!FileKind::File.is_dir());
        assert!(FileKind::Directory.is_dir());
    }

    #[test]
    fn test_file_kind_display() {
        assert_eq!(format!("{}", FileKind::File), "file");
        assert_eq!(format!("{}", FileKind::Directory), "dir");
    }

    #[test]
    fn test_stat_constructors_use_epoch() {
        let stat = Stat::file(42);
        assert_eq!(stat.size, 42);
        assert_eq!(stat.mtime, SystemTime::UNIX_EPOCH);
        assert_eq!(Stat::directory().size, 0);
        assert!(Stat::directory().kind.is_dir());
    }
}
