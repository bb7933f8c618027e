pub(crate) mod db_dump;

use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::archive;
use crate::config::{DbParams, ShareParams};
use crate::share::ShareSession;

/// Dumps the database, gzips the dump, uploads it to the share and cleans up
/// the local staging files.
///
/// The uncompressed dump is deleted as soon as the compressed copy exists;
/// the compressed copy is only deleted after the upload has succeeded, so a
/// failed upload still leaves it on local disk.
pub fn run(db: &DbParams, share: &ShareParams) -> Result<()> {
    let base_name = db_dump::dump_file_name(&db.name, Local::now());
    let dump_path = PathBuf::from(&base_name);
    let gz_name = format!("{}.gz", base_name);
    let gz_path = PathBuf::from(&gz_name);

    db_dump::dump_database(db, &dump_path)?;

    archive::compress(&dump_path, &gz_path)
        .with_context(|| format!("Failed to compress dump {}", dump_path.display()))?;
    fs::remove_file(&dump_path)
        .with_context(|| format!("Failed to remove dump file {}", dump_path.display()))?;

    let session = ShareSession::connect(share)?;
    session.upload(&gz_path, &gz_name)?;

    fs::remove_file(&gz_path)
        .with_context(|| format!("Failed to remove local archive {}", gz_path.display()))?;

    info!("backup of {} stored on share as {}", db.name, gz_name);
    Ok(())
}
