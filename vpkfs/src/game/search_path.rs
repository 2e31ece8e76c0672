//! Turning search path and mount declarations into providers.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{debug, warn};

use super::gameinfo::{GameInfo, MountDecl, MountKind};
use super::provider::{Provider, SearchPathEntry};
use crate::steam::InstallResolver;
use crate::storage::StorageSource;
use crate::vpath;

/// Qualifier given to every provider created from a mount.
pub const MOUNT_QUALIFIER: &str = "mount";

/// Leading placeholder of a path expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathToken {
    /// `|gameinfo_path|`: the mod's own directory.
    GameInfoPath,
    /// `|all_source_engine_paths|`: the directory containing the mod.
    AllSourceEnginePaths,
}

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(r"(?i)^\|(gameinfo_path|all_source_engine_paths)\|").unwrap()
    })
}

/// Split a leading placeholder from a path expression.
///
/// Only a prefix counts, matched without regard to case. A token anywhere
/// else in the expression is left alone.
///
/// # Example
///
/// ```
/// use vpkfs::game::{split_token, PathToken};
///
/// assert_eq!(split_token("|GameInfo_Path|."), (Some(PathToken::GameInfoPath), "."));
/// assert_eq!(split_token("hl2/|gameinfo_path|"), (None, "hl2/|gameinfo_path|"));
/// ```
pub fn split_token(expression: &str) -> (Option<PathToken>, &str) {
    let Some(m) = token_regex().find(expression) else {
        return (None, expression);
    };
    let token = if m.as_str().eq_ignore_ascii_case("|gameinfo_path|") {
        PathToken::GameInfoPath
    } else {
        PathToken::AllSourceEnginePaths
    };
    (Some(token), &expression[m.end()..])
}

fn has_glob_syntax(path: &str) -> bool {
    path.contains(['*', '?', '['])
}

/// Builds providers for one filesystem's declarations.
pub(crate) struct Composer<'a> {
    pub source: &'a Arc<dyn StorageSource>,
    pub mod_root: &'a str,
    pub resolver: &'a InstallResolver,
}

impl Composer<'_> {
    /// Resolve every search path and enabled mount, in declaration order.
    pub async fn compose(&self, info: &GameInfo) -> Vec<SearchPathEntry> {
        let needs_install = info
            .search_paths
            .iter()
            .any(|d| split_token(&d.expression).0.is_none());
        let install_dir = match (needs_install, info.app_id) {
            (true, Some(app_id)) => self.resolver.resolve(app_id, false).await,
            _ => None,
        };

        let mut entries = Vec::new();
        for decl in &info.search_paths {
            let Some(path) = self.expand_expression(&decl.expression, install_dir.as_deref()) else {
                warn!(
                    expression = %decl.expression,
                    app_id = ?info.app_id,
                    "Skipping search path: install directory unresolved"
                );
                continue;
            };
            for concrete in self.concrete_paths(path).await {
                let provider = Provider::for_path(Arc::clone(self.source), concrete);
                entries.push(SearchPathEntry::new(decl.qualifiers.clone(), provider));
            }
        }

        for mount in &info.mounts {
            entries.extend(self.mount_entries(mount).await);
        }
        entries
    }

    /// Substitute the leading token or anchor to the install directory.
    fn expand_expression(&self, expression: &str, install_dir: Option<&str>) -> Option<String> {
        match split_token(expression) {
            (Some(PathToken::GameInfoPath), rest) => Some(vpath::join(self.mod_root, rest)),
            (Some(PathToken::AllSourceEnginePaths), rest) => {
                let parent = vpath::parent(self.mod_root).unwrap_or_else(|| self.mod_root.to_string());
                Some(vpath::join(&parent, rest))
            }
            (None, rest) => install_dir.map(|dir| vpath::join(dir, rest)),
        }
    }

    /// Expand globs when the backend can, then settle archive names.
    async fn concrete_paths(&self, path: String) -> Vec<String> {
        let candidates = if has_glob_syntax(&path) {
            match self.source.glob(&path).await {
                Some(matches) => {
                    debug!(pattern = %path, matches = matches.len(), "Expanded search path glob");
                    matches
                }
                None => vec![path],
            }
        } else {
            vec![path]
        };

        let mut concrete = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            concrete.push(self.archive_name(candidate).await);
        }
        concrete
    }

    /// Settle `<base>.vpk` on either a single-file archive or `<base>_dir.vpk`.
    async fn archive_name(&self, path: String) -> String {
        if !vpath::ends_with_ignore_case(&path, ".vpk")
            || vpath::ends_with_ignore_case(&path, "_dir.vpk")
        {
            return path;
        }
        let single_file = self
            .source
            .stat(&path)
            .await
            .is_some_and(|s| s.kind.is_file());
        if single_file {
            return path;
        }
        let base = &path[..path.len() - ".vpk".len()];
        format!("{}_dir.vpk", base)
    }

    async fn mount_entries(&self, mount: &MountDecl) -> Vec<SearchPathEntry> {
        if mount.disabled {
            debug!(app_id = mount.app_id, "Mount disabled");
            return Vec::new();
        }
        let Some(install_dir) = self.resolver.resolve(mount.app_id, false).await else {
            warn!(app_id = mount.app_id, "Skipping mount: app not installed");
            return Vec::new();
        };

        let mut entries = Vec::new();
        for content in &mount.content {
            let base = vpath::join(&install_dir, &content.subfolder);
            let path = match content.kind {
                MountKind::Archive => {
                    self.archive_name(vpath::join(&base, &format!("{}.vpk", content.name)))
                        .await
                }
                MountKind::Folder => vpath::join(&base, &content.name),
            };
            let provider = Provider::for_path(Arc::clone(self.source), path);
            entries.push(SearchPathEntry::new(vec![MOUNT_QUALIFIER.to_string()], provider));
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySource;

    #[test]
    fn test_split_token_prefix_any_case() {
        assert_eq!(
            split_token("|ALL_SOURCE_ENGINE_PATHS|hl2"),
            (Some(PathToken::AllSourceEnginePaths), "hl2")
        );
        assert_eq!(split_token("|gameinfo_path|"), (Some(PathToken::GameInfoPath), ""));
    }

    #[test]
    fn test_split_token_match_anywhere_not_substituted() {
        let expr = "custom/|gameinfo_path|extra";
        assert_eq!(split_token(expr), (None, expr));
        let expr = " |gameinfo_path|.";
        assert_eq!(split_token(expr), (None, expr));
    }

    #[test]
    fn test_split_token_substituted_once() {
        assert_eq!(
            split_token("|gameinfo_path||gameinfo_path|"),
            (Some(PathToken::GameInfoPath), "|gameinfo_path|")
        );
    }

    fn composer_fixture() -> (Arc<dyn StorageSource>, InstallResolver) {
        let source: Arc<dyn StorageSource> = Arc::new(
            MemorySource::new()
                .with_file("/mods/demo/gameinfo.txt", "x")
                .with_file("/mods/demo/single.vpk", "x")
                .with_file("/mods/demo/pak01_dir.vpk", "x"),
        );
        let resolver = InstallResolver::new(Arc::clone(&source), "/steam");
        (source, resolver)
    }

    #[tokio::test]
    async fn test_archive_name_probes_single_file() {
        let (source, resolver) = composer_fixture();
        let composer = Composer {
            source: &source,
            mod_root: "/mods/demo",
            resolver: &resolver,
        };
        assert_eq!(
            composer.archive_name("/mods/demo/single.vpk".to_string()).await,
            "/mods/demo/single.vpk"
        );
        assert_eq!(
            composer.archive_name("/mods/demo/pak01.vpk".to_string()).await,
            "/mods/demo/pak01_dir.vpk"
        );
        assert_eq!(
            composer.archive_name("/mods/demo/pak02_dir.vpk".to_string()).await,
            "/mods/demo/pak02_dir.vpk"
        );
        assert_eq!(
            composer.archive_name("/mods/demo/folder".to_string()).await,
            "/mods/demo/folder"
        );
    }

    #[test]
    fn test_expand_expression() {
        let (source, resolver) = composer_fixture();
        let composer = Composer {
            source: &source,
            mod_root: "/mods/demo",
            resolver: &resolver,
        };
        assert_eq!(
            composer.expand_expression("|gameinfo_path|.", None).as_deref(),
            Some("/mods/demo")
        );
        assert_eq!(
            composer.expand_expression("|all_source_engine_paths|hl2", None).as_deref(),
            Some("/mods/hl2")
        );
        assert_eq!(
            composer.expand_expression("platform", Some("/steam/common/Game/")).as_deref(),
            Some("/steam/common/Game/platform")
        );
        assert_eq!(composer.expand_expression("platform", None), None);
    }

    #[test]
    fn test_glob_syntax_detection() {
        assert!(has_glob_syntax("/mods/custom/*"));
        assert!(has_glob_syntax("/mods/pak0?_dir.vpk"));
        assert!(!has_glob_syntax("/mods/demo"));
    }
}
