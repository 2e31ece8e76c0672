//! Configuration values and the optional INI config file.
//!
//! # Default Steam root per platform
//!
//! | Platform | Default                                   |
//! |----------|-------------------------------------------|
//! | Linux    | `$XDG_DATA_HOME/Steam` (`~/.local/share/Steam`) |
//! | macOS    | `~/Library/Application Support/Steam`     |
//! | Windows  | `C:/Program Files (x86)/Steam`            |
//!
//! Resolution code never branches on platform; it only sees the injected
//! [`SteamConfig`].
//!
//! # Config file
//!
//! ```ini
//! [steam]
//! root = /mnt/games/Steam
//!
//! [filesystem]
//! prefer_archives = true
//! ```

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

/// Errors that can occur while loading the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or parsed.
    #[error("Failed to load config {}: {reason}", .path.display())]
    Load { path: PathBuf, reason: String },

    /// A value has the wrong form.
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Where Steam keeps its library metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SteamConfig {
    /// Steam installation root (contains `steamapps/libraryfolders.vdf`).
    pub root: String,
}

impl Default for SteamConfig {
    fn default() -> Self {
        Self {
            root: default_steam_root(),
        }
    }
}

impl SteamConfig {
    /// Create a configuration with an explicit Steam root.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into().replace('\\', "/"),
        }
    }
}

/// Platform default Steam root.
#[cfg(target_os = "windows")]
pub fn default_steam_root() -> String {
    "C:/Program Files (x86)/Steam".to_string()
}

/// Platform default Steam root.
#[cfg(not(target_os = "windows"))]
pub fn default_steam_root() -> String {
    dirs::data_dir()
        .map(|d| d.join("Steam").to_string_lossy().to_string())
        .unwrap_or_else(|| "Steam".to_string())
}

/// Default location of the config file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vpkfs").join("config.ini"))
}

/// Settings loaded from the INI config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    /// Steam root override.
    pub steam_root: Option<String>,

    /// Whether queries should consult archives before folders by default.
    pub prefer_archives: bool,
}

impl ConfigFile {
    /// Load and parse a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Parse config text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Load {
            path: PathBuf::from("<string>"),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(steam) = ini.section(Some("steam")) {
            config.steam_root = steam
                .get("root")
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(|r| r.replace('\\', "/"));
        }

        if let Some(fs) = ini.section(Some("filesystem")) {
            if let Some(value) = fs.get("prefer_archives") {
                config.prefer_archives = parse_bool("filesystem.prefer_archives", value)?;
            }
        }

        Ok(config)
    }

    /// Set the Steam root (builder pattern).
    pub fn with_steam_root(mut self, root: impl Into<String>) -> Self {
        self.steam_root = Some(root.into());
        self
    }

    /// Set archive preference (builder pattern).
    pub fn with_prefer_archives(mut self, prefer: bool) -> Self {
        self.prefer_archives = prefer;
        self
    }

    /// Steam configuration, falling back to the platform default root.
    pub fn steam_config(&self) -> SteamConfig {
        match &self.steam_root {
            Some(root) => SteamConfig::new(root.clone()),
            None => SteamConfig::default(),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
