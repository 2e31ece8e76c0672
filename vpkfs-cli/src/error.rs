//! CLI error type.

use thiserror::Error;
use vpkfs::archive::ArchiveError;
use vpkfs::game::GameError;
use vpkfs::ConfigError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Game filesystem unavailable: {0}")]
    Game(#[from] GameError),

    #[error("Archive unreadable: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("Steam library unavailable under {0}")]
    NoLibrary(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound(_) => 1,
            CliError::Config(_) => 3,
            _ => 2,
        }
    }
}
