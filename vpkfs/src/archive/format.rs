//! VPK directory index decoding.
//!
//! # Layout
//!
//! All integers are little-endian.
//!
//! ```text
//! offset  size  field
//! 0       4     signature (0x55AA1234)
//! 4       4     version (1 or 2)
//! 8       4     tree size
//! 12      4     file data size          (v2 only)
//! 16      4     archive MD5 section size (v2 only)
//! 20      4     other MD5 section size   (v2 only)
//! 24      4     signature section size   (v2 only)
//! ```
//!
//! The tree follows the header. It is three nested lists of NUL-terminated
//! strings, each level ending with an empty string:
//!
//! ```text
//! extension ─┬─ directory ─┬─ filename, record, preload bytes
//!            │             ├─ filename, record, preload bytes
//!            │             └─ ""
//!            └─ ""
//! ""
//! ```
//!
//! A record is 16 bytes (crc32, preload length, chunk index, offset, length)
//! followed directly by `preload length` raw bytes.
//!
//! A record whose chunk index is [`INLINE_CHUNK`] keeps its data in the
//! directory file itself, at `tree size + offset`.

use std::collections::{BTreeMap, BTreeSet};

use bytes::Bytes;

use super::error::ArchiveError;

/// Magic number at the start of every VPK directory file.
pub const SIGNATURE: u32 = 0x55AA_1234;

/// Chunk index meaning "data lives in the directory file itself".
pub const INLINE_CHUNK: u16 = 0x7FFF;

/// Header length for version 1 archives.
pub const HEADER_LEN_V1: usize = 12;

/// Header length for version 2 archives.
pub const HEADER_LEN_V2: usize = 28;

/// Size of the fixed part of a file record.
pub const RECORD_LEN: usize = 16;

/// Parsed VPK header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveHeader {
    /// Format version (1 or 2).
    pub version: u32,

    /// Size of the directory tree in bytes.
    pub tree_size: u32,

    /// Size of inline file data after the tree (v2 only, else 0).
    pub file_data_size: u32,

    /// Size of the per-chunk MD5 section (v2 only, else 0).
    pub archive_md5_size: u32,

    /// Size of the whole-file MD5 section (v2 only, else 0).
    pub other_md5_size: u32,

    /// Size of the signature section (v2 only, else 0).
    pub signature_size: u32,
}

impl ArchiveHeader {
    /// Length of the header in bytes.
    pub fn header_len(&self) -> usize {
        if self.version == 1 {
            HEADER_LEN_V1
        } else {
            HEADER_LEN_V2
        }
    }

    /// Base that inline record offsets are added to.
    pub fn inline_data_offset(&self) -> usize {
        self.tree_size as usize
    }
}

/// One file entry from the directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// CRC32 of the complete file contents.
    pub crc: u32,

    /// Chunk holding the file data, or [`INLINE_CHUNK`].
    pub chunk: u16,

    /// Byte offset within the chunk.
    pub offset: u32,

    /// Number of bytes stored in the chunk (excluding preload).
    pub length: u32,

    /// Preload bytes stored inline in the tree. A view into the directory file.
    pub preload: Bytes,
}

impl FileRecord {
    /// Total file size: preload plus chunk bytes.
    pub fn size(&self) -> u64 {
        self.preload.len() as u64 + self.length as u64
    }

    /// Whether the chunk portion lives in the directory file itself.
    pub fn is_inline(&self) -> bool {
        self.chunk == INLINE_CHUNK
    }
}

/// Decoded directory index of one archive.
#[derive(Debug, Clone)]
pub struct ArchiveIndex {
    /// Parsed header.
    pub header: ArchiveHeader,

    /// Canonical path (leading `/`) to record.
    pub files: BTreeMap<String, FileRecord>,

    /// Every directory path that holds a file, plus all of its ancestors.
    pub directories: BTreeSet<String>,

    /// The whole directory file, kept for preload views and inline data.
    pub data: Bytes,
}

struct Cursor<'a> {
    data: &'a Bytes,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a Bytes, pos: usize) -> Self {
        Self { data, pos }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ArchiveError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or(ArchiveError::Truncated {
                offset: self.pos,
                needed: n,
            })?;
        let data: &'a Bytes = self.data;
        let slice = &data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16, ArchiveError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, ArchiveError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn string(&mut self) -> Result<&'a str, ArchiveError> {
        let start = self.pos;
        let data: &'a Bytes = self.data;
        let rest = &data[start..];
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(ArchiveError::UnterminatedString { offset: start })?;
        let s = std::str::from_utf8(&rest[..len])
            .map_err(|_| ArchiveError::InvalidUtf8 { offset: start })?;
        self.pos = start + len + 1;
        Ok(s)
    }

    fn bytes(&mut self, n: usize) -> Result<Bytes, ArchiveError> {
        let start = self.pos;
        self.take(n)?;
        Ok(self.data.slice(start..start + n))
    }
}

/// Parse only the header.
pub fn parse_header(data: &Bytes) -> Result<ArchiveHeader, ArchiveError> {
    let mut cursor = Cursor::new(data, 0);
    let signature = cursor.u32()?;
    if signature != SIGNATURE {
        return Err(ArchiveError::BadSignature(signature));
    }

    let version = cursor.u32()?;
    if version != 1 && version != 2 {
        return Err(ArchiveError::UnsupportedVersion(version));
    }

    let tree_size = cursor.u32()?;
    let mut header = ArchiveHeader {
        version,
        tree_size,
        file_data_size: 0,
        archive_md5_size: 0,
        other_md5_size: 0,
        signature_size: 0,
    };

    if version == 2 {
        header.file_data_size = cursor.u32()?;
        header.archive_md5_size = cursor.u32()?;
        header.other_md5_size = cursor.u32()?;
        header.signature_size = cursor.u32()?;
    }

    Ok(header)
}

/// Parse a complete directory file into an index.
///
/// Fails on the first malformed header field, string or record; no partial
/// index is ever returned.
pub fn parse_index(data: Bytes) -> Result<ArchiveIndex, ArchiveError> {
    let header = parse_header(&data)?;
    let mut cursor = Cursor::new(&data, header.header_len());
    let mut files = BTreeMap::new();
    let mut directories = BTreeSet::new();

    loop {
        let extension = cursor.string()?;
        if extension.is_empty() {
            break;
        }

        loop {
            let raw_dir = cursor.string()?;
            if raw_dir.is_empty() {
                break;
            }
            let dir = canonical_dir(raw_dir);
            record_ancestors(&mut directories, &dir);

            loop {
                let name = cursor.string()?;
                if name.is_empty() {
                    break;
                }
                let path = full_path(&dir, name, extension);

                let crc = cursor.u32()?;
                let preload_len = cursor.u16()?;
                let chunk = cursor.u16()?;
                let offset = cursor.u32()?;
                let length = cursor.u32()?;
                let preload = cursor.bytes(preload_len as usize)?;

                files.insert(
                    path,
                    FileRecord {
                        crc,
                        chunk,
                        offset,
                        length,
                        preload,
                    },
                );
            }
        }
    }

    Ok(ArchiveIndex {
        header,
        files,
        directories,
        data,
    })
}

/// A single space is the root; anything else gets a leading `/` and loses a
/// trailing one.
fn canonical_dir(raw: &str) -> String {
    let trimmed = raw.trim_end_matches('/');
    if raw == " " || trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn full_path(dir: &str, name: &str, extension: &str) -> String {
    if extension == " " {
        format!("{}/{}", dir, name)
    } else {
        format!("{}/{}.{}", dir, name, extension)
    }
}

fn record_ancestors(directories: &mut BTreeSet<String>, dir: &str) {
    directories.insert("/".to_string());
    let mut current = dir;
    while !current.is_empty() {
        if !directories.insert(current.to_string()) {
            // Ancestors of an already-known directory are known too
            break;
        }
        current = match current.rfind('/') {
            Some(idx) => &current[..idx],
            None => "",
        };
    }
}

/// Derive the chunk file path for an archive.
///
/// `pak01_dir.vpk` chunks live beside it as `pak01_NNN.vpk`. Any other name
/// is a single-file archive, and every chunk routes to the archive itself.
///
/// # Example
///
/// ```
/// use vpkfs::archive::chunk_path;
///
/// assert_eq!(chunk_path("/hl2/hl2_textures_dir.vpk", 7), "/hl2/hl2_textures_007.vpk");
/// assert_eq!(chunk_path("/mods/extra.vpk", 0), "/mods/extra.vpk");
/// ```
pub fn chunk_path(archive_path: &str, chunk: u16) -> String {
    let lower = archive_path.to_ascii_lowercase();
    match lower.strip_suffix("_dir.vpk") {
        Some(stem) => {
            let base = &archive_path[..stem.len()];
            format!("{}_{:03}.vpk", base, chunk)
        }
        None => archive_path.to_string(),
    }
}
