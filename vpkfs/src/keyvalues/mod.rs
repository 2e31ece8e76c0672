//! KeyValues text parsing.
//!
//! Valve's KeyValues format is used by `gameinfo.txt`, `libraryfolders.vdf`
//! and `appmanifest_*.acf`. This module parses it into an ordered tree and
//! offers the handful of accessors the rest of the crate needs: child
//! sections, leaf values, boolean leaves and document-order iteration.
//!
//! ```text
//! "GameInfo"
//! {
//!     game        "Portal 2"
//!     FileSystem
//!     {
//!         SteamAppId  620
//!         SearchPaths
//!         {
//!             Game+Mod    |gameinfo_path|.
//!             Game        portal2
//!         }
//!     }
//! }
//! ```

mod parser;
mod tree;

pub use parser::{parse, KvError};
pub use tree::{KvSection, KvValue};
