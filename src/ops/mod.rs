// db-tools/src/ops/mod.rs
//
// Maintenance operations issued as SQL statements over direct connections:
// backend termination, truncate-all, drop, create and vacuum.
use anyhow::{Context, Result};
use sqlx::{Connection, Executor, PgConnection};
use tracing::info;

use crate::config::DbParams;

/// Procedural block truncating every table in the current schema, cascading
/// into referencing tables. Structure is left intact.
const TRUNCATE_ALL_TABLES: &str = r#"
DO $$
DECLARE
    tbl RECORD;
BEGIN
    FOR tbl IN
        SELECT tablename FROM pg_tables WHERE schemaname = current_schema()
    LOOP
        EXECUTE format('TRUNCATE TABLE %I CASCADE', tbl.tablename);
    END LOOP;
END
$$;
"#;

async fn connect_admin(db: &DbParams) -> Result<PgConnection> {
    PgConnection::connect_with(&db.admin_connect_options())
        .await
        .with_context(|| {
            format!(
                "Failed to connect to the administrative database on {}:{}",
                db.host, db.port
            )
        })
}

async fn connect_target(db: &DbParams) -> Result<PgConnection> {
    PgConnection::connect_with(&db.connect_options())
        .await
        .with_context(|| format!("Failed to connect to database {}", db.name))
}

/// Terminates every backend connected to the target database except our own,
/// using an admin connection. Returns that connection for follow-up
/// statements that must not run inside the target database.
async fn terminate_backends(db: &DbParams) -> Result<PgConnection> {
    let mut admin = connect_admin(db).await?;
    let killed = sqlx::query(
        "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
         WHERE datname = $1 AND pid <> pg_backend_pid()",
    )
    .bind(&db.name)
    .fetch_all(&mut admin)
    .await
    .with_context(|| format!("Failed to terminate connections to database {}", db.name))?;

    info!("terminated {} backend(s) connected to {}", killed.len(), db.name);
    Ok(admin)
}

/// Truncates every table in the target database's current schema.
pub async fn clean(db: &DbParams) -> Result<()> {
    let _admin = terminate_backends(db).await?;
    let mut conn = connect_target(db).await?;
    conn.execute(TRUNCATE_ALL_TABLES)
        .await
        .with_context(|| format!("Failed to truncate tables in database {}", db.name))?;
    info!("all tables in {} truncated", db.name);
    Ok(())
}

/// Drops the target database after kicking off its remaining backends.
pub async fn drop_database(db: &DbParams) -> Result<()> {
    if is_system_database(&db.name) {
        anyhow::bail!("Refusing to drop system database {}", db.name);
    }

    let mut admin = terminate_backends(db).await?;
    let stmt = format!("DROP DATABASE {}", quote_ident(&db.name));
    admin
        .execute(stmt.as_str())
        .await
        .with_context(|| format!("Failed to drop database {}", db.name))?;
    info!("database {} dropped", db.name);
    Ok(())
}

/// Creates the target database. No termination step: the target does not
/// exist yet, so there is nothing to disconnect.
pub async fn create_database(db: &DbParams) -> Result<()> {
    let mut admin = connect_admin(db).await?;
    let stmt = format!("CREATE DATABASE {}", quote_ident(&db.name));
    admin
        .execute(stmt.as_str())
        .await
        .with_context(|| format!("Failed to create database {}", db.name))?;
    info!("database {} created", db.name);
    Ok(())
}

/// Rewrites every relation in the target database to reclaim space.
/// Takes exclusive locks for the duration.
pub async fn vacuum(db: &DbParams) -> Result<()> {
    let _admin = terminate_backends(db).await?;
    let mut conn = connect_target(db).await?;
    conn.execute("VACUUM FULL")
        .await
        .with_context(|| format!("Failed to vacuum database {}", db.name))?;
    info!("VACUUM FULL completed on {}", db.name);
    Ok(())
}

fn is_system_database(name: &str) -> bool {
    name.eq_ignore_ascii_case("postgres") || name.starts_with("template")
}

/// Quotes an identifier for interpolation into a statement that cannot take
/// bind parameters (DROP/CREATE DATABASE), doubling embedded quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_ident_wraps_plain_names() {
        assert_eq!(quote_ident("appdb"), "\"appdb\"");
    }

    #[test]
    fn quote_ident_doubles_embedded_quotes() {
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn system_databases_are_protected() {
        assert!(is_system_database("postgres"));
        assert!(is_system_database("Postgres"));
        assert!(is_system_database("template0"));
        assert!(!is_system_database("appdb"));
    }

    #[test]
    fn truncate_block_targets_current_schema_with_cascade() {
        assert!(TRUNCATE_ALL_TABLES.contains("current_schema()"));
        assert!(TRUNCATE_ALL_TABLES.contains("TRUNCATE TABLE %I CASCADE"));
    }
}
