//! vpkfs - Read-only virtual filesystem for Source engine game content
//!
//! A Source engine game (or a mod built on one) scatters its content across
//! loose folders and VPK archive packs. The order in which those sources are
//! consulted is declared in the mod's `gameinfo.txt` search paths, and a game
//! may further mount another installed Steam application's content.
//!
//! This library composes all of that into one queryable filesystem:
//!
//! - [`archive`] parses VPK directory indexes and serves file bytes
//! - [`steam`] resolves installed application directories from library metadata
//! - [`game`] builds the ordered provider list and answers read/list/stat queries
//! - [`storage`] is the backend seam (local disk or in-memory)
//! - [`keyvalues`] parses the KeyValues text used by all configuration files
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vpkfs::game::GameFilesystem;
//! use vpkfs::steam::ResolverRegistry;
//! use vpkfs::storage::DiskSource;
//! use vpkfs::SteamConfig;
//!
//! let source = Arc::new(DiskSource::new());
//! let registry = Arc::new(ResolverRegistry::new());
//! let fs = GameFilesystem::new(source, "/games/Portal 2/portal2", registry, SteamConfig::default());
//!
//! if let Some(bytes) = fs.read_file("/scripts/game_sounds.txt", None, false).await {
//!     println!("{} bytes", bytes.len());
//! }
//! ```

pub mod archive;
pub mod config;
pub mod game;
pub mod keyvalues;
pub mod steam;
pub mod storage;
pub mod vpath;

pub use config::{ConfigError, ConfigFile, SteamConfig};

/// Library version, used in diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
