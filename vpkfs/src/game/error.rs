//! Error types for game filesystem initialization.

use thiserror::Error;

use crate::keyvalues::KvError;

/// Errors that make a game filesystem unusable.
///
/// These only describe the mod's own configuration. Problems with a single
/// search path or mount are logged and that entry is skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// `gameinfo.txt` is missing or unreadable.
    #[error("Game configuration unreadable: {0}")]
    Unreadable(String),

    /// `gameinfo.txt` is not valid KeyValues text.
    #[error("Malformed game configuration {path}: {source}")]
    Malformed { path: String, source: KvError },

    /// A required section is absent.
    #[error("Missing '{section}' section in {path}")]
    MissingSection { path: String, section: String },
}
