//! Steam library listing.

use std::io::Write;

use vpkfs::steam::InstallResolver;

use crate::error::CliError;

/// Print every app id in the Steam libraries with its install directory.
pub async fn apps(resolver: &InstallResolver, out: &mut impl Write) -> Result<(), CliError> {
    if resolver.parse().await.is_err() {
        return Err(CliError::NoLibrary(resolver.root().to_string()));
    }
    for app_id in resolver.installed().await {
        match resolver.resolve(app_id, false).await {
            Some(dir) => writeln!(out, "{:>8}  {}", app_id, dir)?,
            None => writeln!(out, "{:>8}  <not installed>", app_id)?,
        }
    }
    Ok(())
}
