//! Content providers that make up a search path.

use std::sync::Arc;

use bytes::Bytes;

use crate::archive::ArchiveReader;
use crate::storage::{DirEntry, Stat, StorageSource};
use crate::vpath;

/// Kind of provider backing a search path entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// A VPK archive.
    Archive,
    /// A loose folder on the storage backend.
    Folder,
}

impl ProviderKind {
    /// Check if this is an archive provider.
    pub fn is_archive(&self) -> bool {
        matches!(self, ProviderKind::Archive)
    }

    /// Check if this is a folder provider.
    pub fn is_folder(&self) -> bool {
        matches!(self, ProviderKind::Folder)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProviderKind::Archive => "archive",
            ProviderKind::Folder => "folder",
        };
        f.pad(name)
    }
}

/// A folder on the storage backend, addressed by virtual path.
#[derive(Clone)]
pub struct FolderProvider {
    source: Arc<dyn StorageSource>,
    root: String,
}

impl std::fmt::Debug for FolderProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderProvider")
            .field("root", &self.root)
            .finish()
    }
}

impl FolderProvider {
    /// Create a provider rooted at `root` on `source`.
    pub fn new(source: Arc<dyn StorageSource>, root: impl Into<String>) -> Self {
        Self {
            source,
            root: root.into(),
        }
    }

    /// Backing root directory.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Backing path of a virtual path.
    pub fn backing_path(&self, path: &str) -> String {
        vpath::join(&self.root, path)
    }

    pub async fn read_file(&self, path: &str) -> Option<Bytes> {
        self.source.read_file(&self.backing_path(path)).await
    }

    pub async fn read_directory(&self, path: &str) -> Option<Vec<DirEntry>> {
        self.source.read_directory(&self.backing_path(path)).await
    }

    pub async fn stat(&self, path: &str) -> Option<Stat> {
        self.source.stat(&self.backing_path(path)).await
    }

    /// Whether the root exists and is a directory.
    pub async fn validate(&self) -> bool {
        self.source
            .stat(&self.root)
            .await
            .is_some_and(|s| s.kind.is_dir())
    }
}

/// A search path provider: an archive or a folder.
#[derive(Debug, Clone)]
pub enum Provider {
    Archive(Arc<ArchiveReader>),
    Folder(FolderProvider),
}

impl Provider {
    /// Provider for `path`: an archive if it names a `.vpk` file, a folder otherwise.
    pub fn for_path(source: Arc<dyn StorageSource>, path: String) -> Self {
        if vpath::ends_with_ignore_case(&path, ".vpk") {
            Provider::Archive(Arc::new(ArchiveReader::new(source, path)))
        } else {
            Provider::Folder(FolderProvider::new(source, path))
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Provider::Archive(_) => ProviderKind::Archive,
            Provider::Folder(_) => ProviderKind::Folder,
        }
    }

    pub fn is_archive(&self) -> bool {
        self.kind().is_archive()
    }

    /// The archive file or folder root this provider reads from.
    pub fn location(&self) -> &str {
        match self {
            Provider::Archive(reader) => reader.path(),
            Provider::Folder(folder) => folder.root(),
        }
    }

    /// Where `path` lives on the backend.
    ///
    /// For archives this is the directory file itself, since archive
    /// members have no backing path of their own.
    pub fn backing_path(&self, path: &str) -> String {
        match self {
            Provider::Archive(reader) => reader.path().to_string(),
            Provider::Folder(folder) => folder.backing_path(path),
        }
    }

    pub async fn read_file(&self, path: &str) -> Option<Bytes> {
        match self {
            Provider::Archive(reader) => reader.read_file(path).await,
            Provider::Folder(folder) => folder.read_file(path).await,
        }
    }

    pub async fn read_directory(&self, path: &str) -> Option<Vec<DirEntry>> {
        match self {
            Provider::Archive(reader) => reader.read_directory(path).await,
            Provider::Folder(folder) => folder.read_directory(path).await,
        }
    }

    pub async fn stat(&self, path: &str) -> Option<Stat> {
        match self {
            Provider::Archive(reader) => reader.stat(path).await,
            Provider::Folder(folder) => folder.stat(path).await,
        }
    }

    /// Parse the archive or check the folder exists.
    pub async fn validate(&self) -> bool {
        match self {
            Provider::Archive(reader) => reader.validate().await,
            Provider::Folder(folder) => folder.validate().await,
        }
    }
}

/// One entry of a resolved search path.
#[derive(Debug, Clone)]
pub struct SearchPathEntry {
    /// Lowercased qualifier tags.
    pub qualifiers: Vec<String>,
    pub provider: Provider,
}

impl SearchPathEntry {
    pub fn new(qualifiers: Vec<String>, provider: Provider) -> Self {
        Self {
            qualifiers,
            provider,
        }
    }

    /// Whether a query for `qualifier` considers this entry.
    ///
    /// No qualifier matches every entry.
    pub fn matches(&self, qualifier: Option<&str>) -> bool {
        match qualifier {
            None => true,
            Some(q) => self.qualifiers.iter().any(|t| t.eq_ignore_ascii_case(q)),
        }
    }
}

impl std::fmt::Display for SearchPathEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<16} {:<7} {}",
            self.qualifiers.join("+"),
            self.provider.kind(),
            self.provider.location()
        )
    }
}
