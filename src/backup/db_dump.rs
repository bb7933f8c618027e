// db-tools/src/backup/db_dump.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::Path;
use tracing::info;

use crate::config::DbParams;
use crate::exec;

/// Builds the dump file name: `<dbName>_backup_<YYYYMMDDHHMMSS>`.
///
/// Whole-second resolution; two backups of the same database within the same
/// second produce the same name.
pub fn dump_file_name(db_name: &str, at: DateTime<Local>) -> String {
    format!("{}_backup_{}", db_name, at.format("%Y%m%d%H%M%S"))
}

/// Invokes `pg_dump` in custom archive format with blobs, writing to
/// `output_path`. The password travels via `PGPASSWORD` only, never on the
/// command line.
pub fn dump_database(db: &DbParams, output_path: &Path) -> Result<()> {
    let pg_dump = exec::locate_tool("pg_dump")?;
    info!(
        "dumping database {} to {} with {}",
        db.name,
        output_path.display(),
        pg_dump.display()
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
        "-b".to_string(),
        "-v".to_string(),
        "-f".to_string(),
        output_path.display().to_string(),
        db.name.clone(),
    ];

    exec::run_tool(&pg_dump, &args, &[("PGPASSWORD", &db.password)])
        .with_context(|| format!("pg_dump failed for database {}", db.name))?;

    info!("database {} dumped to {}", db.name, output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn dump_file_name_uses_fourteen_digit_timestamp() {
        let at = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let name = dump_file_name("appdb", at);
        assert_eq!(name, "appdb_backup_20240102030405");

        let stamp = name.rsplit('_').next().unwrap();
        assert_eq!(stamp.len(), 14);
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn compressed_name_is_base_name_plus_gz() {
        let at = Local.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        let base = dump_file_name("appdb", at);
        assert_eq!(format!("{}.gz", base), "appdb_backup_20241231235959.gz");
    }
}
