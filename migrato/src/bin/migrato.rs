use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use migrato::{
    cli::{self, MigrateArgs},
    store::{PgConnectionPool, PgDatabase, PgProvider},
    MemoryCache, MigrationRunner, ROOT_PROJECT_ID,
};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    cli::init_tracing();

    let args = MigrateArgs::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    // No shared cache backend is wired yet: purges only reach this
    // process-local cache, so the platform cache is left untouched.
    let registry = PgDatabase::with_namespace(&pool, format!("_{ROOT_PROJECT_ID}"));
    let runner = MigrationRunner::new(
        registry,
        PgProvider::new(&pool),
        PgConnectionPool::new(&pool),
        MemoryCache::new(),
    );

    Ok(cli::run(&args, &runner).await)
}
