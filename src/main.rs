//! PostgreSQL lifecycle tool
//!
//! Backs up, restores and maintains PostgreSQL databases, moving backup
//! artifacts to and from an SMB network share.

mod archive;
mod backup;
mod config;
mod exec;
mod ops;
mod restore;
mod share;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Cli, Operation};
use dotenv::dotenv;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE: &str = "db_tools.log";

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // clap prints its own usage/error text; exit 1 like any other failure.
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    // Held until the end of main so the file layer is flushed on exit.
    let _guard = match init_logging() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialise logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run_operation(&cli).await {
        Ok(_) => {
            info!("{} operation completed successfully", cli.operation);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{} operation failed: {e:#}", cli.operation);
            ExitCode::FAILURE
        }
    }
}

/// Sets up a stdout layer plus an append-mode file layer for `db_tools.log`.
///
/// The returned guard owns the background file writer; dropping it flushes
/// any buffered log lines.
fn init_logging() -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::never(".", LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stdout))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(guard)
}

async fn run_operation(cli: &Cli) -> Result<()> {
    let db = cli.db_params();
    let share = cli.share_params();

    match cli.operation {
        Operation::Backup => {
            info!("starting backup of database {}", db.name);
            backup::run(&db, &share).context("backup failed")?;
        }
        Operation::Restore => {
            // Checked before any network or database work happens.
            let restore_file = cli.required_restore_file()?;
            info!(
                "starting restore of database {} from {}",
                db.name, restore_file
            );
            restore::run(&db, &share, restore_file).context("restore failed")?;
        }
        Operation::Clean => {
            info!("truncating all tables in database {}", db.name);
            ops::clean(&db).await.context("clean failed")?;
        }
        Operation::Drop => {
            info!("dropping database {}", db.name);
            ops::drop_database(&db).await.context("drop failed")?;
        }
        Operation::Create => {
            info!("creating database {}", db.name);
            ops::create_database(&db).await.context("create failed")?;
        }
        Operation::Vacuum => {
            info!("running VACUUM FULL on database {}", db.name);
            ops::vacuum(&db).await.context("vacuum failed")?;
        }
    }
    Ok(())
}
