pub(crate) mod db_restore;

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::archive;
use crate::config::{DbParams, ShareParams};
use crate::share::ShareSession;

/// Downloads the compressed backup from the share, decompresses it and feeds
/// the dump to `pg_restore`, cleaning up each local copy once consumed.
pub fn run(db: &DbParams, share: &ShareParams, restore_file: &str) -> Result<()> {
    let gz_path = PathBuf::from(restore_file);
    let dump_path = db_restore::dump_path_for(restore_file);

    let session = ShareSession::connect(share)?;
    session.download(restore_file, &gz_path)?;

    archive::decompress(&gz_path, &dump_path)
        .with_context(|| format!("Failed to decompress archive {}", gz_path.display()))?;
    fs::remove_file(&gz_path)
        .with_context(|| format!("Failed to remove local archive {}", gz_path.display()))?;

    db_restore::restore_database(db, &dump_path)?;

    fs::remove_file(&dump_path)
        .with_context(|| format!("Failed to remove dump file {}", dump_path.display()))?;

    info!("database {} restored from {}", db.name, restore_file);
    Ok(())
}
