//! Direct archive inspection.

use std::io::Write;

use vpkfs::archive::ArchiveReader;

use crate::error::CliError;

/// Print the archive header and every file with its size.
///
/// With `verify`, each file's CRC32 is checked and the command fails if any
/// file is corrupt or unreadable.
pub async fn list(reader: &ArchiveReader, verify: bool, out: &mut impl Write) -> Result<(), CliError> {
    let index = reader.parse().await?;
    let header = &index.header;

    writeln!(out, "Archive:   {}", reader.path())?;
    writeln!(out, "Version:   {}", header.version)?;
    writeln!(out, "Tree size: {}", header.tree_size)?;
    writeln!(out, "Files:     {}", index.files.len())?;

    let mut bad = Vec::new();
    for (path, record) in &index.files {
        if !verify {
            writeln!(out, "{:>10}  {}", record.size(), path)?;
            continue;
        }
        let status = match reader.verify(path).await {
            Some(true) => "ok",
            Some(false) => "CRC MISMATCH",
            None => "UNREADABLE",
        };
        if status != "ok" {
            bad.push(path.clone());
        }
        writeln!(out, "{:>10}  {}  {}", record.size(), path, status)?;
    }

    if let Some(first) = bad.first() {
        return Err(CliError::Verification(format!(
            "{} of {} files failed verification (first: {})",
            bad.len(),
            index.files.len(),
            first
        )));
    }
    Ok(())
}
