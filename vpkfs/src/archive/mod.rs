//! VPK archive reading.
//!
//! A VPK archive is a directory file (`pak01_dir.vpk`) holding a tree of
//! file records, plus numbered data chunks beside it (`pak01_000.vpk`,
//! `pak01_001.vpk`, ...). Small files or file prefixes may be stored inline
//! in the tree as preload bytes, and some data may live in the directory
//! file itself after the tree.
//!
//! ```text
//! pak01_dir.vpk ── header ── tree ── inline data
//!                             │
//!                             └─ /materials/x.vmt → chunk 2, offset 4096, len 812
//!                                                       │
//! pak01_002.vpk ────────────────────────────────────────┘
//! ```
//!
//! [`ArchiveReader`] parses the tree lazily and serves file bytes, listings
//! and metadata for the paths it owns.

mod error;
mod format;
mod reader;

pub use error::ArchiveError;
pub use format::{
    chunk_path, parse_header, parse_index, ArchiveHeader, ArchiveIndex, FileRecord, HEADER_LEN_V1,
    HEADER_LEN_V2, INLINE_CHUNK, RECORD_LEN, SIGNATURE,
};
pub use reader::ArchiveReader;

#[cfg(test)]
pub(crate) use format::test_support;
