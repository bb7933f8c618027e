// db-tools/src/restore/db_restore.rs
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::DbParams;
use crate::exec;

/// Derives the uncompressed dump path from the user-supplied compressed file
/// name by stripping its final extension.
///
/// This is a naming convention, not a validated contract: a name without the
/// expected `.gz` suffix yields a path that simply loses whatever its last
/// extension was.
pub fn dump_path_for(restore_file: &str) -> PathBuf {
    Path::new(restore_file).with_extension("")
}

/// Invokes `pg_restore` against the uncompressed dump in custom archive
/// format. The password travels via `PGPASSWORD` only.
pub fn restore_database(db: &DbParams, dump_path: &Path) -> Result<()> {
    let pg_restore = exec::locate_tool("pg_restore")?;
    info!(
        "restoring database {} from {} with {}",
        db.name,
        dump_path.display(),
        pg_restore.display()
    );

    let args = vec![
        "-U".to_string(),
        db.user.clone(),
        "-h".to_string(),
        db.host.clone(),
        "-p".to_string(),
        db.port.to_string(),
        "-F".to_string(),
        "c".to_string(),
        "-d".to_string(),
        db.name.clone(),
        dump_path.display().to_string(),
    ];

    exec::run_tool(&pg_restore, &args, &[("PGPASSWORD", &db.password)])
        .with_context(|| format!("pg_restore failed for database {}", db.name))?;

    info!("database {} restored from {}", db.name, dump_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_gz_suffix_from_backup_name() {
        assert_eq!(
            dump_path_for("appdb_backup_20240102030405.gz"),
            PathBuf::from("appdb_backup_20240102030405")
        );
    }

    #[test]
    fn name_without_suffix_is_left_unchanged() {
        assert_eq!(
            dump_path_for("appdb_backup_20240102030405"),
            PathBuf::from("appdb_backup_20240102030405")
        );
    }

    #[test]
    fn only_the_final_extension_is_stripped() {
        assert_eq!(dump_path_for("weird.tar.gz"), PathBuf::from("weird.tar"));
    }
}
