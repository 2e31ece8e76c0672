//! CLI subcommands and the settings they share.

mod archive;
mod game;
mod steam;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{ArgAction, Args, Subcommand};
use tracing::debug;
use vpkfs::archive::ArchiveReader;
use vpkfs::config::default_config_path;
use vpkfs::game::GameFilesystem;
use vpkfs::steam::ResolverRegistry;
use vpkfs::storage::{DiskSource, StorageSource};
use vpkfs::{ConfigFile, SteamConfig};

use crate::error::CliError;

/// Options accepted by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Mod directory containing gameinfo.txt (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub mod_root: Option<PathBuf>,

    /// Steam installation root (overrides the config file and platform default)
    #[arg(long, global = true, value_name = "DIR")]
    pub steam_root: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only consult search paths tagged with this qualifier
    #[arg(short, long, global = true)]
    pub qualifier: Option<String>,

    /// Consult archives before loose folders
    #[arg(long, global = true)]
    pub archives_first: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the game's name, app id and resolved search paths
    Info,
    /// List a directory across all search paths
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Write a file's contents to stdout
    Cat { path: String },
    /// Show a file's kind and size
    Stat { path: String },
    /// Show which backing file or archive serves a path
    Which { path: String },
    /// List installed Steam applications
    Apps,
    /// List the contents of a VPK archive
    VpkLs {
        /// Directory file (`*_dir.vpk`) or single-file archive
        archive: PathBuf,

        /// Check every file against its CRC32
        #[arg(long)]
        verify: bool,
    },
}

/// Settings after merging flags, the config file and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub mod_root: String,
    pub steam: SteamConfig,
    pub qualifier: Option<String>,
    pub prefer_archives: bool,
}

impl Settings {
    /// Merge flags over config values. Flags win.
    pub fn resolve(args: &GlobalArgs, config: &ConfigFile) -> Result<Self, CliError> {
        let mod_root = match &args.mod_root {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let steam = match &args.steam_root {
            Some(root) => SteamConfig::new(root.clone()),
            None => config.steam_config(),
        };
        Ok(Self {
            mod_root: slash(&mod_root),
            steam,
            qualifier: args.qualifier.as_ref().map(|q| q.to_ascii_lowercase()),
            prefer_archives: args.archives_first || config.prefer_archives,
        })
    }
}

/// Load the config file.
///
/// An explicitly named file must load; the default location is optional.
pub fn load_config(explicit: Option<&Path>) -> Result<ConfigFile, CliError> {
    if let Some(path) = explicit {
        return Ok(ConfigFile::load(path)?);
    }
    match default_config_path() {
        Some(path) if path.is_file() => {
            debug!(path = %path.display(), "Loading config");
            Ok(ConfigFile::load(&path)?)
        }
        _ => Ok(ConfigFile::default()),
    }
}

fn slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Run a subcommand, writing its output to `out`.
pub async fn run(command: Command, args: &GlobalArgs, out: &mut impl Write) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;
    let settings = Settings::resolve(args, &config)?;
    let source: Arc<dyn StorageSource> = Arc::new(DiskSource::new());
    let registry = Arc::new(ResolverRegistry::new());

    let filesystem = || {
        GameFilesystem::new(
            Arc::clone(&source),
            settings.mod_root.clone(),
            Arc::clone(&registry),
            settings.steam.clone(),
        )
    };
    let qualifier = settings.qualifier.as_deref();
    let prefer = settings.prefer_archives;

    match command {
        Command::Info => game::info(&filesystem(), out).await,
        Command::Ls { path } => game::ls(&filesystem(), &path, qualifier, out).await,
        Command::Cat { path } => game::cat(&filesystem(), &path, qualifier, prefer, out).await,
        Command::Stat { path } => game::stat(&filesystem(), &path, qualifier, out).await,
        Command::Which { path } => game::which(&filesystem(), &path, qualifier, prefer, out).await,
        Command::Apps => {
            let resolver = registry.resolver(&source, &settings.steam.root);
            steam::apps(&resolver, out).await
        }
        Command::VpkLs {
            archive: archive_path,
            verify,
        } => {
            let reader = ArchiveReader::new(Arc::clone(&source), slash(&archive_path));
            archive::list(&reader, verify, out).await
        }
    }
}
