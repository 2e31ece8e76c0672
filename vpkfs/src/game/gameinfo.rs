//! `gameinfo.txt` declarations.
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
//!             Game+Mod        |gameinfo_path|.
//!             Game            |all_source_engine_paths|portal2/pak01_dir.vpk
//!             Game            platform
//!         }
//!     }
//!     mount
//!     {
//!         440
//!         {
//!             tf      { vpk "tf2_misc" dir "custom" }
//!         }
//!     }
//! }
//! ```

use tracing::{debug, warn};

use super::error::GameError;
use crate::keyvalues::{self, KvValue};

/// What a mount entry points at inside the mounted game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MountKind {
    /// A VPK archive, named without the `.vpk` extension.
    Archive,
    /// A loose folder.
    Folder,
}

impl std::fmt::Display for MountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MountKind::Archive => write!(f, "vpk"),
            MountKind::Folder => write!(f, "dir"),
        }
    }
}

/// One `vpk` or `dir` line of a mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountContent {
    /// Folder inside the mounted game's install directory.
    pub subfolder: String,
    /// Archive or folder.
    pub kind: MountKind,
    /// Archive base name or folder name.
    pub name: String,
}

/// Another installed application whose content is mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountDecl {
    pub app_id: u32,
    pub disabled: bool,
    pub content: Vec<MountContent>,
}

/// One line of `FileSystem/SearchPaths`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPathDecl {
    /// Lowercased parts of the key, split on `+`.
    pub qualifiers: Vec<String>,
    /// Raw path expression.
    pub expression: String,
}

/// Everything the filesystem needs from `gameinfo.txt`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameInfo {
    pub name: Option<String>,
    pub app_id: Option<u32>,
    pub search_paths: Vec<SearchPathDecl>,
    pub mounts: Vec<MountDecl>,
}

/// Split a search path key into its lowercased qualifiers.
///
/// # Example
///
/// ```
/// use vpkfs::game::split_qualifiers;
///
/// assert_eq!(split_qualifiers("Game+Mod"), vec!["game", "mod"]);
/// assert_eq!(split_qualifiers("platform"), vec!["platform"]);
/// ```
pub fn split_qualifiers(key: &str) -> Vec<String> {
    key.split('+')
        .map(|q| q.trim().to_ascii_lowercase())
        .filter(|q| !q.is_empty())
        .collect()
}

impl GameInfo {
    /// Parse `gameinfo.txt` text. `path` is only used in errors.
    pub fn parse(path: &str, text: &str) -> Result<Self, GameError> {
        let root = keyvalues::parse(text).map_err(|source| GameError::Malformed {
            path: path.to_string(),
            source,
        })?;
        let game = root
            .section("GameInfo")
            .ok_or_else(|| GameError::MissingSection {
                path: path.to_string(),
                section: "GameInfo".to_string(),
            })?;
        let filesystem = game
            .section("FileSystem")
            .ok_or_else(|| GameError::MissingSection {
                path: path.to_string(),
                section: "GameInfo/FileSystem".to_string(),
            })?;

        let app_id = match filesystem.get("SteamAppId") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(file = %path, value = %raw, "Ignoring non-numeric SteamAppId");
                    None
                }
            },
            None => None,
        };

        let search_paths = filesystem
            .section_or_empty("SearchPaths")
            .entries()
            .filter_map(|(key, value)| {
                let expression = value.as_str()?;
                Some(SearchPathDecl {
                    qualifiers: split_qualifiers(key),
                    expression: expression.to_string(),
                })
            })
            .collect();

        let mounts = match game.section("mount") {
            Some(section) => parse_mounts(path, section.entries()),
            None => Vec::new(),
        };

        Ok(Self {
            name: game.get("game").map(str::to_string),
            app_id,
            search_paths,
            mounts,
        })
    }
}

fn parse_mounts<'a>(
    path: &str,
    entries: impl Iterator<Item = (&'a str, &'a KvValue)>,
) -> Vec<MountDecl> {
    let mut mounts = Vec::new();
    for (key, value) in entries {
        let KvValue::Section(mount) = value else {
            continue;
        };
        let Ok(app_id) = key.trim().parse::<u32>() else {
            warn!(file = %path, mount = %key, "Ignoring mount with non-numeric app id");
            continue;
        };

        let mut content = Vec::new();
        for (subfolder, body) in mount.entries() {
            let KvValue::Section(body) = body else {
                continue;
            };
            for (kind, name) in body.entries() {
                let Some(name) = name.as_str() else {
                    continue;
                };
                let kind = if kind.eq_ignore_ascii_case("vpk") {
                    MountKind::Archive
                } else if kind.eq_ignore_ascii_case("dir") {
                    MountKind::Folder
                } else {
                    debug!(file = %path, app_id, key = %kind, "Ignoring unknown mount key");
                    continue;
                };
                content.push(MountContent {
                    subfolder: subfolder.to_string(),
                    kind,
                    name: name.to_string(),
                });
            }
        }

        mounts.push(MountDecl {
            app_id,
            disabled: mount.get_bool("disabled").unwrap_or(false),
            content,
        });
    }
    mounts
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAMEINFO: &str = r#"
        "GameInfo"
        {
            game    "Demo Mod"
            FileSystem
            {
                SteamAppId  620
                SearchPaths
                {
                    Game+Mod    |gameinfo_path|.
                    Game        |all_source_engine_paths|portal2
                    Platform    platform/platform_pak01_dir.vpk
                    Nested      { bogus 1 }
                }
            }
            mount
            {
                440
                {
                    tf
                    {
                        vpk     "tf2_misc"
                        dir     "custom"
                        other   "x"
                    }
                }
                220
                {
                    disabled    1
                    hl2 { dir "materials" }
                }
                notanid { }
            }
        }
    "#;

    #[test]
    fn test_parse_gameinfo() {
        let info = GameInfo::parse("gameinfo.txt", GAMEINFO).unwrap();
        assert_eq!(info.name.as_deref(), Some("Demo Mod"));
        assert_eq!(info.app_id, Some(620));
        assert_eq!(info.search_paths.len(), 3);
        assert_eq!(info.search_paths[0].qualifiers, vec!["game", "mod"]);
        assert_eq!(info.search_paths[0].expression, "|gameinfo_path|.");
        assert_eq!(info.search_paths[2].qualifiers, vec!["platform"]);
    }

    #[test]
    fn test_parse_mounts() {
        let info = GameInfo::parse("gameinfo.txt", GAMEINFO).unwrap();
        assert_eq!(info.mounts.len(), 2);

        let tf = &info.mounts[0];
        assert_eq!(tf.app_id, 440);
        assert!(!tf.disabled);
        assert_eq!(
            tf.content,
            vec![
                MountContent {
                    subfolder: "tf".to_string(),
                    kind: MountKind::Archive,
                    name: "tf2_misc".to_string(),
                },
                MountContent {
                    subfolder: "tf".to_string(),
                    kind: MountKind::Folder,
                    name: "custom".to_string(),
                },
            ]
        );

        assert_eq!(info.mounts[1].app_id, 220);
        assert!(info.mounts[1].disabled);
    }

    #[test]
    fn test_missing_filesystem_section() {
        let err = GameInfo::parse("gameinfo.txt", "GameInfo { game x }").unwrap_err();
        assert!(matches!(err, GameError::MissingSection { ref section, .. } if section == "GameInfo/FileSystem"));
    }

    #[test]
    fn test_malformed_gameinfo() {
        let err = GameInfo::parse("gameinfo.txt", "GameInfo {").unwrap_err();
        assert!(matches!(err, GameError::Malformed { .. }));
    }

    #[test]
    fn test_optional_fields() {
        let info = GameInfo::parse("g", "GameInfo { FileSystem { SteamAppId abc } }").unwrap();
        assert_eq!(info.name, None);
        assert_eq!(info.app_id, None);
        assert!(info.search_paths.is_empty());
        assert!(info.mounts.is_empty());
    }

    #[test]
    fn test_split_qualifiers_drops_empty_parts() {
        assert_eq!(split_qualifiers("GAME++Mod+ "), vec!["game", "mod"]);
        assert!(split_qualifiers("").is_empty());
    }
}
