//! Lazily parsed, read-only view of one VPK archive.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::error::ArchiveError;
use super::format::{chunk_path, parse_index, ArchiveHeader, ArchiveIndex, FileRecord};
use crate::storage::{DirEntry, Stat, StorageSource};
use crate::vpath;

/// Parse lifecycle of a reader.
#[derive(Debug)]
enum ParseState {
    Unparsed,
    Ready(Arc<ArchiveIndex>),
    Failed(ArchiveError),
}

/// Read-only access to one VPK archive.
///
/// The directory file is read and decoded on first use. Success and failure
/// are both sticky: a failed parse is never retried unless the caller asks
/// for [`reparse`](Self::reparse). Concurrent first callers share one parse.
///
/// Chunk files are loaded whole on first access and cached by chunk index
/// until [`clear_chunk_cache`](Self::clear_chunk_cache) is called. File
/// contents are returned as [`Bytes`] views into the cached chunk whenever the
/// file has no preload prefix.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use vpkfs::archive::ArchiveReader;
/// use vpkfs::storage::DiskSource;
///
/// let reader = ArchiveReader::new(Arc::new(DiskSource::new()), "/hl2/hl2_misc_dir.vpk");
/// if let Some(bytes) = reader.read_file("/scripts/weapon_pistol.txt").await {
///     println!("{} bytes", bytes.len());
/// }
/// ```
pub struct ArchiveReader {
    source: Arc<dyn StorageSource>,
    path: String,
    state: RwLock<ParseState>,
    parse_lock: Mutex<()>,
    chunks: DashMap<u16, Bytes>,
}

impl std::fmt::Debug for ArchiveReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveReader")
            .field("path", &self.path)
            .field("state", &*self.state.read())
            .field("cached_chunks", &self.chunks.len())
            .finish()
    }
}

impl ArchiveReader {
    /// Create a reader for the directory file at `path`.
    ///
    /// Nothing is read until the first query or [`parse`](Self::parse).
    pub fn new(source: Arc<dyn StorageSource>, path: impl Into<String>) -> Self {
        Self {
            source,
            path: path.into(),
            state: RwLock::new(ParseState::Unparsed),
            parse_lock: Mutex::new(()),
            chunks: DashMap::new(),
        }
    }

    /// Backing path of the directory file.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn settled(&self) -> Option<Result<Arc<ArchiveIndex>, ArchiveError>> {
        match &*self.state.read() {
            ParseState::Unparsed => None,
            ParseState::Ready(index) => Some(Ok(Arc::clone(index))),
            ParseState::Failed(e) => Some(Err(e.clone())),
        }
    }

    /// Parse the directory file if that has not happened yet.
    ///
    /// Returns the cached outcome on every later call.
    pub async fn parse(&self) -> Result<Arc<ArchiveIndex>, ArchiveError> {
        if let Some(outcome) = self.settled() {
            return outcome;
        }
        let _guard = self.parse_lock.lock().await;
        // Another caller may have finished while we waited
        if let Some(outcome) = self.settled() {
            return outcome;
        }
        self.load().await
    }

    /// Discard the index and chunk cache, then parse again.
    pub async fn reparse(&self) -> Result<Arc<ArchiveIndex>, ArchiveError> {
        let _guard = self.parse_lock.lock().await;
        *self.state.write() = ParseState::Unparsed;
        self.chunks.clear();
        self.load().await
    }

    async fn load(&self) -> Result<Arc<ArchiveIndex>, ArchiveError> {
        let outcome = match self.source.read_file(&self.path).await {
            Some(data) => parse_index(data).map(Arc::new),
            None => Err(ArchiveError::Unreadable(self.path.clone())),
        };

        let state = match &outcome {
            Ok(index) => {
                debug!(
                    archive = %self.path,
                    version = index.header.version,
                    files = index.files.len(),
                    "Parsed archive index"
                );
                ParseState::Ready(Arc::clone(index))
            }
            Err(e) => {
                warn!(archive = %self.path, error = %e, "Archive parse failed");
                ParseState::Failed(e.clone())
            }
        };
        *self.state.write() = state;
        outcome
    }

    /// Parse if needed and report whether the archive is usable.
    pub async fn validate(&self) -> bool {
        self.parse().await.is_ok()
    }

    /// Header of a successfully parsed archive.
    pub fn header(&self) -> Option<ArchiveHeader> {
        match &*self.state.read() {
            ParseState::Ready(index) => Some(index.header),
            _ => None,
        }
    }

    /// Number of files in the archive (0 if it failed to parse).
    pub async fn file_count(&self) -> usize {
        self.parse().await.map(|i| i.files.len()).unwrap_or(0)
    }

    /// All file paths in the archive, sorted.
    pub async fn paths(&self) -> Vec<String> {
        match self.parse().await {
            Ok(index) => index.files.keys().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Number of chunk buffers currently cached.
    pub fn cached_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Drop every cached chunk buffer.
    pub fn clear_chunk_cache(&self) {
        self.chunks.clear();
    }

    async fn record(&self, path: &str) -> Option<(Arc<ArchiveIndex>, FileRecord)> {
        let index = self.parse().await.ok()?;
        let record = index.files.get(&vpath::normalize(path))?.clone();
        Some((index, record))
    }

    /// Read a whole file.
    ///
    /// Returns `None` if the archive failed to parse, the path is unknown, or
    /// the chunk holding its data cannot be loaded.
    pub async fn read_file(&self, path: &str) -> Option<Bytes> {
        let (index, record) = self.record(path).await?;
        self.assemble(&index, &record).await
    }

    async fn assemble(&self, index: &ArchiveIndex, record: &FileRecord) -> Option<Bytes> {
        if record.length == 0 {
            return Some(record.preload.clone());
        }

        let chunk = self.chunk_bytes(index, record.chunk).await?;
        let base = if record.is_inline() {
            index.header.inline_data_offset()
        } else {
            0
        };
        let start = base + record.offset as usize;
        let end = start + record.length as usize;
        if end > chunk.len() {
            warn!(
                archive = %self.path,
                chunk = record.chunk,
                start,
                end,
                chunk_len = chunk.len(),
                "File data runs past end of chunk"
            );
            return None;
        }

        let window = chunk.slice(start..end);
        if record.preload.is_empty() {
            return Some(window);
        }

        let mut out = BytesMut::with_capacity(record.preload.len() + window.len());
        out.extend_from_slice(&record.preload);
        out.extend_from_slice(&window);
        Some(out.freeze())
    }

    async fn chunk_bytes(&self, index: &ArchiveIndex, chunk: u16) -> Option<Bytes> {
        if chunk == super::format::INLINE_CHUNK {
            return Some(index.data.clone());
        }

        let path = chunk_path(&self.path, chunk);
        if path == self.path {
            // Single-file archive: the directory file is the data file
            return Some(index.data.clone());
        }

        let cached = self.chunks.get(&chunk).map(|c| c.clone());
        if let Some(data) = cached {
            return Some(data);
        }

        match self.source.read_file(&path).await {
            Some(data) => {
                debug!(archive = %self.path, chunk, bytes = data.len(), "Loaded archive chunk");
                self.chunks.insert(chunk, data.clone());
                Some(data)
            }
            None => {
                warn!(archive = %self.path, chunk_path = %path, "Archive chunk unavailable");
                None
            }
        }
    }

    /// List the immediate children of a directory inside the archive.
    pub async fn read_directory(&self, path: &str) -> Option<Vec<DirEntry>> {
        let index = self.parse().await.ok()?;
        let dir = vpath::normalize(path);
        let prefix = if dir == "/" {
            dir
        } else {
            format!("{}/", dir)
        };

        let mut entries = Vec::new();
        let mut seen_dirs: HashSet<&str> = HashSet::new();
        for key in index.files.range(prefix.clone()..).map(|(k, _)| k) {
            let Some(rest) = key.strip_prefix(prefix.as_str()) else {
                break;
            };
            match rest.split_once('/') {
                Some((sub, _)) => {
                    if seen_dirs.insert(sub) {
                        entries.push(DirEntry::directory(sub));
                    }
                }
                None => entries.push(DirEntry::file(rest)),
            }
        }

        if entries.is_empty() {
            None
        } else {
            Some(entries)
        }
    }

    /// Stat a file or directory inside the archive.
    ///
    /// Timestamps are not stored in the format and are always `UNIX_EPOCH`.
    pub async fn stat(&self, path: &str) -> Option<Stat> {
        let index = self.parse().await.ok()?;
        let path = vpath::normalize(path);
        if let Some(record) = index.files.get(&path) {
            return Some(Stat::file(record.size()));
        }
        if index.directories.contains(&path) {
            return Some(Stat::directory());
        }
        None
    }

    /// Check a file's contents against its recorded CRC32.
    ///
    /// `None` if the file cannot be read at all.
    pub async fn verify(&self, path: &str) -> Option<bool> {
        let (index, record) = self.record(path).await?;
        let data = self.assemble(&index, &record).await?;
        let mut crc = flate2::Crc::new();
        crc.update(&data);
        Some(crc.sum() == record.crc)
    }
}
