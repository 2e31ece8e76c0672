//! The composed game filesystem.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::error::GameError;
use super::gameinfo::GameInfo;
use super::provider::SearchPathEntry;
use super::search_path::Composer;
use crate::config::SteamConfig;
use crate::steam::ResolverRegistry;
use crate::storage::{DirEntry, Stat, StorageSource};
use crate::vpath;

/// Name of the configuration file inside a mod directory.
pub const GAMEINFO_FILE: &str = "gameinfo.txt";

/// Validated providers in both query orders.
#[derive(Debug)]
pub struct SearchPaths {
    pub name: Option<String>,
    pub app_id: Option<u32>,
    declared: Vec<SearchPathEntry>,
    archives_first: Vec<usize>,
}

impl SearchPaths {
    fn new(info: GameInfo, declared: Vec<SearchPathEntry>) -> Self {
        // Stable: relative order within each group is kept
        let mut archives_first: Vec<usize> = (0..declared.len()).collect();
        archives_first.sort_by_key(|&i| !declared[i].provider.is_archive());
        Self {
            name: info.name,
            app_id: info.app_id,
            declared,
            archives_first,
        }
    }

    /// Entries in declaration order.
    pub fn declared(&self) -> &[SearchPathEntry] {
        &self.declared
    }

    /// Entries with archives before folders.
    pub fn archives_first(&self) -> impl Iterator<Item = &SearchPathEntry> {
        self.archives_first.iter().map(|&i| &self.declared[i])
    }

    fn ordered<'a>(
        &'a self,
        prefer_archives: bool,
        qualifier: Option<&'a str>,
    ) -> Box<dyn Iterator<Item = &'a SearchPathEntry> + Send + 'a> {
        let entries: Box<dyn Iterator<Item = &'a SearchPathEntry> + Send + 'a> = if prefer_archives {
            Box::new(self.archives_first())
        } else {
            Box::new(self.declared.iter())
        };
        Box::new(entries.filter(move |e| e.matches(qualifier)))
    }
}

#[derive(Debug)]
enum FsState {
    Unparsed,
    Ready(Arc<SearchPaths>),
    Failed(GameError),
}

/// Read-only union of a game's search paths.
///
/// `gameinfo.txt` is read on the first query. From it the filesystem builds
/// an ordered list of qualifier-tagged providers (archives and folders, plus
/// the content of any mounted applications) and drops providers that fail
/// validation. The list never changes afterwards.
///
/// If the configuration itself cannot be read, the filesystem stays failed
/// and every query returns `None` until [`reload`](Self::reload).
///
/// # Query order
///
/// | Query            | Order                                   |
/// |------------------|-----------------------------------------|
/// | `read_file`      | declared, or archives first if asked    |
/// | `get_path`       | declared, or archives first if asked    |
/// | `read_directory` | declared, all providers merged          |
/// | `stat`           | archives first                          |
///
/// # Example
///
/// ```ignore
/// let fs = GameFilesystem::new(source, "/games/Portal 2/portal2", registry, SteamConfig::default());
/// let entries = fs.read_directory("/materials", Some("game")).await;
/// ```
pub struct GameFilesystem {
    source: Arc<dyn StorageSource>,
    mod_root: String,
    registry: Arc<ResolverRegistry>,
    steam: SteamConfig,
    state: RwLock<FsState>,
    parse_lock: Mutex<()>,
}

impl std::fmt::Debug for GameFilesystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameFilesystem")
            .field("mod_root", &self.mod_root)
            .field("steam", &self.steam)
            .field("state", &*self.state.read())
            .finish()
    }
}

impl GameFilesystem {
    /// Create a filesystem for the mod directory `mod_root`.
    ///
    /// Nothing is read until the first query.
    pub fn new(
        source: Arc<dyn StorageSource>,
        mod_root: impl Into<String>,
        registry: Arc<ResolverRegistry>,
        steam: SteamConfig,
    ) -> Self {
        Self {
            source,
            mod_root: mod_root.into().replace('\\', "/"),
            registry,
            steam,
            state: RwLock::new(FsState::Unparsed),
            parse_lock: Mutex::new(()),
        }
    }

    /// Mod directory this filesystem was created for.
    pub fn mod_root(&self) -> &str {
        &self.mod_root
    }

    fn settled(&self) -> Option<Result<Arc<SearchPaths>, GameError>> {
        match &*self.state.read() {
            FsState::Unparsed => None,
            FsState::Ready(paths) => Some(Ok(Arc::clone(paths))),
            FsState::Failed(e) => Some(Err(e.clone())),
        }
    }

    /// Build the search paths if that has not happened yet.
    pub async fn parse(&self) -> Result<Arc<SearchPaths>, GameError> {
        if let Some(outcome) = self.settled() {
            return outcome;
        }
        let _guard = self.parse_lock.lock().await;
        if let Some(outcome) = self.settled() {
            return outcome;
        }
        self.load().await
    }

    /// Discard the search paths and build them again.
    ///
    /// Shared install lookups are not refreshed.
    pub async fn reload(&self) -> Result<Arc<SearchPaths>, GameError> {
        let _guard = self.parse_lock.lock().await;
        *self.state.write() = FsState::Unparsed;
        self.load().await
    }

    /// Whether the search paths have been built successfully.
    pub fn is_ready(&self) -> bool {
        matches!(&*self.state.read(), FsState::Ready(_))
    }

    async fn load(&self) -> Result<Arc<SearchPaths>, GameError> {
        let outcome = self.build().await.map(Arc::new);
        let state = match &outcome {
            Ok(paths) => {
                info!(
                    mod_root = %self.mod_root,
                    name = paths.name.as_deref().unwrap_or("<unnamed>"),
                    providers = paths.declared.len(),
                    "Game filesystem ready"
                );
                FsState::Ready(Arc::clone(paths))
            }
            Err(e) => {
                warn!(mod_root = %self.mod_root, error = %e, "Game filesystem unavailable");
                FsState::Failed(e.clone())
            }
        };
        *self.state.write() = state;
        outcome
    }

    async fn build(&self) -> Result<SearchPaths, GameError> {
        let info_path = vpath::join(&self.mod_root, GAMEINFO_FILE);
        let data = self
            .source
            .read_file(&info_path)
            .await
            .ok_or_else(|| GameError::Unreadable(info_path.clone()))?;
        let info = GameInfo::parse(&info_path, &String::from_utf8_lossy(&data))?;

        let resolver = self.registry.resolver(&self.source, &self.steam.root);
        let composer = Composer {
            source: &self.source,
            mod_root: &self.mod_root,
            resolver: &resolver,
        };
        let candidates = composer.compose(&info).await;

        let checks = join_all(candidates.iter().map(|e| e.provider.validate())).await;
        let declared: Vec<SearchPathEntry> = candidates
            .into_iter()
            .zip(checks)
            .filter_map(|(entry, valid)| {
                if !valid {
                    warn!(
                        kind = %entry.provider.kind(),
                        location = %entry.provider.location(),
                        "Dropping search path that failed validation"
                    );
                }
                valid.then_some(entry)
            })
            .collect();

        Ok(SearchPaths::new(info, declared))
    }

    /// Application id from `FileSystem/SteamAppId`.
    pub async fn app_id(&self) -> Option<u32> {
        self.parse().await.ok()?.app_id
    }

    /// Display name from `GameInfo/game`.
    pub async fn name(&self) -> Option<String> {
        self.parse().await.ok()?.name.clone()
    }

    /// Validated entries in declaration order (empty if initialization failed).
    pub async fn search_paths(&self) -> Vec<SearchPathEntry> {
        match self.parse().await {
            Ok(paths) => paths.declared.clone(),
            Err(_) => Vec::new(),
        }
    }

    /// Read a file from the first provider that has it.
    ///
    /// With a qualifier only entries tagged with it are consulted.
    pub async fn read_file(
        &self,
        path: &str,
        qualifier: Option<&str>,
        prefer_archives: bool,
    ) -> Option<Bytes> {
        let paths = self.parse().await.ok()?;
        let path = vpath::normalize(path);
        for entry in paths.ordered(prefer_archives, qualifier) {
            if let Some(data) = entry.provider.read_file(&path).await {
                debug!(path = %path, from = %entry.provider.location(), "Read file");
                return Some(data);
            }
        }
        None
    }

    /// Backing path of the provider that would serve `path`.
    pub async fn get_path(
        &self,
        path: &str,
        qualifier: Option<&str>,
        prefer_archives: bool,
    ) -> Option<String> {
        let paths = self.parse().await.ok()?;
        let path = vpath::normalize(path);
        for entry in paths.ordered(prefer_archives, qualifier) {
            if entry.provider.stat(&path).await.is_some() {
                return Some(entry.provider.backing_path(&path));
            }
        }
        None
    }

    /// Merge the listings of every qualifying provider.
    ///
    /// On a name clash the entry from the earliest declared provider wins.
    pub async fn read_directory(&self, path: &str, qualifier: Option<&str>) -> Option<Vec<DirEntry>> {
        let paths = self.parse().await.ok()?;
        let path = vpath::normalize(path);

        let mut found = false;
        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for entry in paths.ordered(false, qualifier) {
            let Some(listing) = entry.provider.read_directory(&path).await else {
                continue;
            };
            found = true;
            for item in listing {
                if seen.insert(item.name.clone()) {
                    merged.push(item);
                }
            }
        }
        found.then_some(merged)
    }

    /// Metadata from the first qualifying provider, archives first.
    pub async fn stat(&self, path: &str, qualifier: Option<&str>) -> Option<Stat> {
        let paths = self.parse().await.ok()?;
        let path = vpath::normalize(path);
        for entry in paths.ordered(true, qualifier) {
            if let Some(stat) = entry.provider.stat(&path).await {
                return Some(stat);
            }
        }
        None
    }
}
