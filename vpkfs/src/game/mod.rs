//! Game filesystem composition.
//!
//! A mod's `gameinfo.txt` declares its search paths: an ordered list of
//! folders and VPK archives, each tagged with qualifiers such as `game`,
//! `mod` or `platform`. It may also mount other installed applications.
//!
//! ```text
//! gameinfo.txt ──► GameInfo ──► Composer ──► [SearchPathEntry] ──► validate
//!                                  │                                  │
//!                     InstallResolver (app dirs)          declared + archives-first
//! ```
//!
//! [`GameFilesystem`] owns the result and answers read, list and stat
//! queries against it.

mod error;
mod filesystem;
mod gameinfo;
mod provider;
mod search_path;

pub use error::GameError;
pub use filesystem::{GameFilesystem, SearchPaths, GAMEINFO_FILE};
pub use gameinfo::{split_qualifiers, GameInfo, MountContent, MountDecl, MountKind, SearchPathDecl};
pub use provider::{FolderProvider, Provider, ProviderKind, SearchPathEntry};
pub use search_path::{split_token, PathToken, MOUNT_QUALIFIER};
