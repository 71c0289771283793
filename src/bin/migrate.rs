use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ebookportal::{
    config::AppConfig,
    logging::init_tracing,
    migrations::{MigrationRunner, MigrationStatus, MySqlMigrationBackend},
    state::connect,
};

#[derive(Parser)]
#[command(name = "migrate")]
#[command(about = "Apply or inspect the SQL migrations", long_about = None)]
struct Cli {
    /// Directory holding the timestamped .sql files (defaults to MIGRATIONS_DIR)
    #[arg(long)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply every pending migration in order
    #[command(alias = "run")]
    Migrate,
    /// Show which migrations are applied and which are pending
    #[command(alias = "list")]
    Status,
}

async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("load configuration")?;
    let dir = cli.dir.unwrap_or_else(|| config.migrations_dir.clone());
    let db = connect(&config.database, config.request_timeout()).await?;
    let runner = MigrationRunner::new(Arc::new(MySqlMigrationBackend::new(db.clone())), dir);

    match cli.command {
        Commands::Migrate => {
            let report = runner.run().await?;
            println!(
                "applied {}, already applied {}, tolerated {} existing objects",
                report.applied.len(),
                report.skipped.len(),
                report.recovered_statements
            );
        }
        Commands::Status => {
            for (filename, status) in runner.status().await? {
                match status {
                    MigrationStatus::Applied(Some(at)) => println!("applied  {filename}  ({at})"),
                    MigrationStatus::Applied(None) => println!("applied  {filename}"),
                    MigrationStatus::Pending => println!("pending  {filename}"),
                }
            }
        }
    }

    db.close().await;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "migrate failed");
            ExitCode::FAILURE
        }
    }
}
