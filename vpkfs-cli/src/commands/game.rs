//! Queries against the composed game filesystem.

use std::io::Write;
use std::time::UNIX_EPOCH;

use vpkfs::game::GameFilesystem;

use crate::error::CliError;

/// Print the game's name, app id and search paths.
pub async fn info(fs: &GameFilesystem, out: &mut impl Write) -> Result<(), CliError> {
    let paths = fs.parse().await?;

    writeln!(out, "Mod root:     {}", fs.mod_root())?;
    writeln!(out, "Name:         {}", paths.name.as_deref().unwrap_or("<unnamed>"))?;
    match paths.app_id {
        Some(id) => writeln!(out, "App ID:       {}", id)?,
        None => writeln!(out, "App ID:       -")?,
    }
    writeln!(out, "Search paths: {}", paths.declared().len())?;
    for entry in paths.declared() {
        writeln!(out, "  {}", entry)?;
    }
    Ok(())
}

/// List a directory.
pub async fn ls(
    fs: &GameFilesystem,
    path: &str,
    qualifier: Option<&str>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    fs.parse().await?;
    let entries = fs
        .read_directory(path, qualifier)
        .await
        .ok_or_else(|| CliError::NotFound(path.to_string()))?;
    for entry in entries {
        writeln!(out, "{:<4} {}", entry.kind, entry.name)?;
    }
    Ok(())
}

/// Write a file's bytes.
pub async fn cat(
    fs: &GameFilesystem,
    path: &str,
    qualifier: Option<&str>,
    prefer_archives: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    fs.parse().await?;
    let data = fs
        .read_file(path, qualifier, prefer_archives)
        .await
        .ok_or_else(|| CliError::NotFound(path.to_string()))?;
    out.write_all(&data)?;
    Ok(())
}

/// Print kind, size and modification time.
pub async fn stat(
    fs: &GameFilesystem,
    path: &str,
    qualifier: Option<&str>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    fs.parse().await?;
    let stat = fs
        .stat(path, qualifier)
        .await
        .ok_or_else(|| CliError::NotFound(path.to_string()))?;
    let mtime = stat
        .mtime
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    writeln!(out, "Path:  {}", path)?;
    writeln!(out, "Kind:  {}", stat.kind)?;
    writeln!(out, "Size:  {}", stat.size)?;
    writeln!(out, "Mtime: {}", mtime)?;
    Ok(())
}

/// Print the backing path that serves `path`.
pub async fn which(
    fs: &GameFilesystem,
    path: &str,
    qualifier: Option<&str>,
    prefer_archives: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    fs.parse().await?;
    let backing = fs
        .get_path(path, qualifier, prefer_archives)
        .await
        .ok_or_else(|| CliError::NotFound(path.to_string()))?;
    writeln!(out, "{}", backing)?;
    Ok(())
}
