// db-tools/src/config/mod.rs
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sqlx::postgres::PgConnectOptions;
use std::fmt;

/// Default PostgreSQL port.
pub const DEFAULT_DB_PORT: u16 = 5432;

/// Bootstrap database used for statements that cannot target the database
/// they operate on (DROP DATABASE, CREATE DATABASE, backend termination).
pub const ADMIN_DATABASE: &str = "postgres";

/// Error reported when `restore` is invoked without `--restore_file`.
pub const RESTORE_FILE_ERROR: &str = "You must provide a --restore_file for restore operation";

#[derive(Debug, Parser)]
#[command(
    name = "db-tools",
    version,
    about = "PostgreSQL backup, restore and maintenance tool with SMB share transport"
)]
pub struct Cli {
    /// Operation to perform
    #[arg(value_enum)]
    pub operation: Operation,

    /// Database name
    #[arg(long = "db_name")]
    pub db_name: String,

    /// Database user
    #[arg(long = "db_user")]
    pub db_user: String,

    /// Database password
    #[arg(long = "db_pass")]
    pub db_pass: String,

    /// Database host
    #[arg(long = "db_host")]
    pub db_host: String,

    /// Database port
    #[arg(long = "db_port", default_value_t = DEFAULT_DB_PORT)]
    pub db_port: u16,

    /// Network share user
    #[arg(long = "share_user", env = "SHARE_USER", default_value = "SHARE_USER")]
    pub share_user: String,

    /// Network share password
    #[arg(long = "share_pass", env = "SHARE_PASS", default_value = "SHARE_PASS", hide_env_values = true)]
    pub share_pass: String,

    /// Network share host
    #[arg(long = "share_host", env = "SHARE_HOST", default_value = "SHARE_HOST")]
    pub share_host: String,

    /// Network share name
    #[arg(long = "share_name", env = "SHARE_NAME", default_value = "SHARE_NAME")]
    pub share_name: String,

    /// Compressed backup file to restore from (required for restore)
    #[arg(long = "restore_file")]
    pub restore_file: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Operation {
    Backup,
    Restore,
    Clean,
    Drop,
    Create,
    Vacuum,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Backup => "backup",
            Operation::Restore => "restore",
            Operation::Clean => "clean",
            Operation::Drop => "drop",
            Operation::Create => "create",
            Operation::Vacuum => "vacuum",
        };
        f.write_str(name)
    }
}

/// Connection parameters for the target database. Immutable for the
/// lifetime of the process.
#[derive(Debug, Clone)]
pub struct DbParams {
    pub name: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

impl DbParams {
    /// Options for connecting to the target database itself.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
    }

    /// Options for connecting to the administrative bootstrap database on
    /// the same server.
    pub fn admin_connect_options(&self) -> PgConnectOptions {
        self.connect_options().database(ADMIN_DATABASE)
    }
}

/// Credentials and addressing for the SMB share holding backup artifacts.
#[derive(Debug, Clone)]
pub struct ShareParams {
    pub host: String,
    pub user: String,
    pub password: String,
    pub share: String,
}

impl Cli {
    pub fn db_params(&self) -> DbParams {
        DbParams {
            name: self.db_name.clone(),
            user: self.db_user.clone(),
            password: self.db_pass.clone(),
            host: self.db_host.clone(),
            port: self.db_port,
        }
    }

    /// The compressed file to restore from. Must be checked before any
    /// network or database work starts.
    pub fn required_restore_file(&self) -> Result<&str> {
        self.restore_file.as_deref().context(RESTORE_FILE_ERROR)
    }

    pub fn share_params(&self) -> ShareParams {
        ShareParams {
            host: self.share_host.clone(),
            user: self.share_user.clone(),
            password: self.share_pass.clone(),
            share: self.share_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args(operation: &str) -> Vec<&str> {
        vec![
            "db-tools",
            operation,
            "--db_name",
            "appdb",
            "--db_user",
            "admin",
            "--db_pass",
            "secret",
            "--db_host",
            "db.internal",
        ]
    }

    #[test]
    fn parses_backup_with_required_flags() {
        let cli = Cli::try_parse_from(base_args("backup")).unwrap();
        assert_eq!(cli.operation, Operation::Backup);
        assert_eq!(cli.db_name, "appdb");
        assert_eq!(cli.db_port, DEFAULT_DB_PORT);
        assert!(cli.restore_file.is_none());
    }

    #[test]
    fn parses_explicit_port_and_restore_file() {
        let mut args = base_args("restore");
        args.extend(["--db_port", "5433", "--restore_file", "appdb_backup_20240102030405.gz"]);
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.operation, Operation::Restore);
        assert_eq!(cli.db_port, 5433);
        assert_eq!(
            cli.restore_file.as_deref(),
            Some("appdb_backup_20240102030405.gz")
        );
    }

    #[test]
    fn rejects_unknown_operation() {
        assert!(Cli::try_parse_from(base_args("explode")).is_err());
    }

    #[test]
    fn rejects_missing_required_flag() {
        let args = vec!["db-tools", "backup", "--db_name", "appdb"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn restore_without_file_reports_the_documented_error() {
        let cli = Cli::try_parse_from(base_args("restore")).unwrap();
        let err = cli.required_restore_file().unwrap_err();
        assert_eq!(err.to_string(), RESTORE_FILE_ERROR);
    }

    #[test]
    fn share_flags_fall_back_to_placeholders() {
        let cli = Cli::try_parse_from(base_args("clean")).unwrap();
        let share = cli.share_params();
        // Unset flags resolve to the env var of the same name, or the
        // placeholder literal when the variable is absent too.
        assert_eq!(share.host, std::env::var("SHARE_HOST").unwrap_or("SHARE_HOST".into()));
        assert_eq!(share.share, std::env::var("SHARE_NAME").unwrap_or("SHARE_NAME".into()));
    }

    #[test]
    fn admin_options_target_bootstrap_database() {
        let cli = Cli::try_parse_from(base_args("drop")).unwrap();
        let db = cli.db_params();
        let opts = db.admin_connect_options();
        assert_eq!(opts.get_database(), Some(ADMIN_DATABASE));
        assert_eq!(db.connect_options().get_database(), Some("appdb"));
    }

    #[test]
    fn operation_display_matches_cli_spelling() {
        for (op, name) in [
            (Operation::Backup, "backup"),
            (Operation::Restore, "restore"),
            (Operation::Clean, "clean"),
            (Operation::Drop, "drop"),
            (Operation::Create, "create"),
            (Operation::Vacuum, "vacuum"),
        ] {
            assert_eq!(op.to_string(), name);
        }
    }
}
