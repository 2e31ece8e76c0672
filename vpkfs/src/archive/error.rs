//! Error types for archive parsing.

use thiserror::Error;

/// Errors that can occur while parsing a VPK directory index.
///
/// Any of these leaves the reader in a sticky failed state; nothing from a
/// partially decoded index is ever served.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    /// The directory file could not be read from the backing source.
    #[error("Archive unreadable: {0}")]
    Unreadable(String),

    /// The magic number at offset 0 is wrong.
    #[error("Bad signature: 0x{0:08x}")]
    BadSignature(u32),

    /// The header declares a version other than 1 or 2.
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u32),

    /// A tree string ran past the end of the data without a NUL terminator.
    #[error("Unterminated string at offset {offset}")]
    UnterminatedString { offset: usize },

    /// A tree string is not valid UTF-8.
    #[error("Invalid UTF-8 string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// A fixed-size field or preload payload runs past the end of the data.
    #[error("Truncated data at offset {offset}: need {needed} bytes")]
    Truncated { offset: usize, needed: usize },
}
