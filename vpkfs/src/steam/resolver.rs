//! Installed application lookup from Steam library metadata.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::keyvalues::{self, KvError, KvValue};
use crate::storage::StorageSource;
use crate::vpath;

/// Errors that can occur while reading Steam metadata.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A metadata file is missing or unreadable.
    #[error("Metadata file unreadable: {0}")]
    Unreadable(String),

    /// A metadata file is not valid KeyValues text.
    #[error("Malformed metadata file {path}: {source}")]
    Malformed { path: String, source: KvError },

    /// A required section or value is absent.
    #[error("Missing '{field}' in {path}")]
    MissingField { path: String, field: String },
}

#[derive(Debug)]
enum LibraryState {
    Unparsed,
    Ready(Arc<HashMap<u32, String>>),
    Failed(ResolveError),
}

/// Resolves Steam application ids to installed content directories.
///
/// The library list (`steamapps/libraryfolders.vdf`) is read at most once per
/// instance; the outcome, success or failure, is sticky. Per-application
/// results are cached indefinitely, including negative results, until a
/// caller forces re-resolution.
///
/// Instances are normally obtained from a
/// [`ResolverRegistry`](super::ResolverRegistry) so every filesystem reading
/// the same Steam root shares one.
pub struct InstallResolver {
    source: Arc<dyn StorageSource>,
    root: String,
    libraries: RwLock<LibraryState>,
    parse_lock: Mutex<()>,
    installs: DashMap<u32, Option<String>>,
}

impl std::fmt::Debug for InstallResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallResolver")
            .field("root", &self.root)
            .field("libraries", &*self.libraries.read())
            .field("cached_installs", &self.installs.len())
            .finish()
    }
}

impl InstallResolver {
    /// Create a resolver over the Steam root `root`.
    pub fn new(source: Arc<dyn StorageSource>, root: impl Into<String>) -> Self {
        Self {
            source,
            root: root.into().replace('\\', "/"),
            libraries: RwLock::new(LibraryState::Unparsed),
            parse_lock: Mutex::new(()),
            installs: DashMap::new(),
        }
    }

    /// Steam root this resolver reads from.
    pub fn root(&self) -> &str {
        &self.root
    }

    fn library_file(&self) -> String {
        vpath::join(&self.root, "steamapps/libraryfolders.vdf")
    }

    fn settled(&self) -> Option<Result<Arc<HashMap<u32, String>>, ResolveError>> {
        match &*self.libraries.read() {
            LibraryState::Unparsed => None,
            LibraryState::Ready(map) => Some(Ok(Arc::clone(map))),
            LibraryState::Failed(e) => Some(Err(e.clone())),
        }
    }

    /// Read the library list if that has not happened yet.
    pub async fn parse(&self) -> Result<Arc<HashMap<u32, String>>, ResolveError> {
        if let Some(outcome) = self.settled() {
            return outcome;
        }
        let _guard = self.parse_lock.lock().await;
        if let Some(outcome) = self.settled() {
            return outcome;
        }

        let path = self.library_file();
        let outcome = match self.source.read_file(&path).await {
            Some(data) => parse_library_folders(&path, &String::from_utf8_lossy(&data)).map(Arc::new),
            None => Err(ResolveError::Unreadable(path.clone())),
        };

        *self.libraries.write() = match &outcome {
            Ok(map) => {
                info!(root = %self.root, apps = map.len(), "Loaded Steam library folders");
                LibraryState::Ready(Arc::clone(map))
            }
            Err(e) => {
                warn!(root = %self.root, error = %e, "Steam library folders unavailable");
                LibraryState::Failed(e.clone())
            }
        };
        outcome
    }

    /// All application ids listed in any library, sorted.
    ///
    /// Independent of whether each one resolves.
    pub async fn installed(&self) -> Vec<u32> {
        let Ok(map) = self.parse().await else {
            return Vec::new();
        };
        let mut ids: Vec<u32> = map.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Library root holding `app_id`, if any library lists it.
    pub async fn library_of(&self, app_id: u32) -> Option<String> {
        self.parse().await.ok()?.get(&app_id).cloned()
    }

    /// Resolve an application's content directory (with trailing `/`).
    ///
    /// Cached results are returned as-is unless `force` is set. A manifest
    /// that cannot be read or lacks `installdir` caches a negative result.
    pub async fn resolve(&self, app_id: u32, force: bool) -> Option<String> {
        let library = self.library_of(app_id).await?;

        if !force {
            let cached = self.installs.get(&app_id).map(|e| e.value().clone());
            if let Some(cached) = cached {
                return cached;
            }
        }

        let resolved = match self.read_install_dir(app_id, &library).await {
            Ok(dir) => {
                debug!(app_id, dir = %dir, "Resolved install directory");
                Some(dir)
            }
            Err(e) => {
                warn!(app_id, error = %e, "Could not resolve install directory");
                None
            }
        };
        self.installs.insert(app_id, resolved.clone());
        resolved
    }

    async fn read_install_dir(&self, app_id: u32, library: &str) -> Result<String, ResolveError> {
        let path = vpath::join(library, &format!("steamapps/appmanifest_{}.acf", app_id));
        let data = self
            .source
            .read_file(&path)
            .await
            .ok_or_else(|| ResolveError::Unreadable(path.clone()))?;

        let root = keyvalues::parse(&String::from_utf8_lossy(&data)).map_err(|source| {
            ResolveError::Malformed {
                path: path.clone(),
                source,
            }
        })?;

        let install_dir = root
            .section("AppState")
            .and_then(|s| s.get("installdir"))
            .filter(|d| !d.is_empty())
            .ok_or_else(|| ResolveError::MissingField {
                path: path.clone(),
                field: "AppState/installdir".to_string(),
            })?;

        let dir = vpath::join(library, &format!("steamapps/common/{}", install_dir));
        Ok(format!("{}/", dir))
    }
}

/// Parse `libraryfolders.vdf` into appid → library root.
///
/// When an application appears in several libraries the first one wins.
pub fn parse_library_folders(path: &str, text: &str) -> Result<HashMap<u32, String>, ResolveError> {
    let root = keyvalues::parse(text).map_err(|source| ResolveError::Malformed {
        path: path.to_string(),
        source,
    })?;
    let folders = root
        .section("libraryfolders")
        .ok_or_else(|| ResolveError::MissingField {
            path: path.to_string(),
            field: "libraryfolders".to_string(),
        })?;

    let mut apps = HashMap::new();
    for (key, value) in folders.entries() {
        let KvValue::Section(library) = value else {
            continue;
        };
        let Some(library_path) = library.get("path") else {
            warn!(file = %path, library = %key, "Library entry has no path");
            continue;
        };
        let library_path = library_path.replace('\\', "/");

        for (app, _) in library.section_or_empty("apps").entries() {
            match app.parse::<u32>() {
                Ok(app_id) => {
                    apps.entry(app_id).or_insert_with(|| library_path.clone());
                }
                Err(_) => debug!(file = %path, app = %app, "Skipping non-numeric app id"),
            }
        }
    }
    Ok(apps)
}
