use std::sync::Arc;

use anyhow::Context;
use ebookportal::{
    app::{build_app, serve},
    config::AppConfig,
    logging::init_tracing,
    migrations::{MigrationRunner, MySqlMigrationBackend},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env().context("load configuration")?;
    let run_migrations = config.run_migrations;
    let migrations_dir = config.migrations_dir.clone();
    let (state, db) = AppState::init(config).await?;

    if run_migrations {
        let runner = MigrationRunner::new(Arc::new(MySqlMigrationBackend::new(db)), migrations_dir);
        let report = runner.run().await.context("apply migrations")?;
        tracing::info!(applied = report.applied.len(), "database schema up to date");
    }

    let config = state.config.clone();
    serve(build_app(state), &config).await
}
