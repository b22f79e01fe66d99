use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::{APP_VERSION_STABLE, MAX_VERSION_LEN},
    runner::MigrationRunner,
};

#[derive(Debug, Parser)]
#[command(name = "migrato")]
#[command(about = "Migrate every project to a new version")]
#[command(after_help = "Cache purges go to an in-process cache; clear the platform cache separately.")]
pub struct MigrateArgs {
    /// Version to migrate to.
    #[arg(default_value = APP_VERSION_STABLE, value_parser = parse_version)]
    pub version: String,
}

fn parse_version(value: &str) -> Result<String, String> {
    if value.is_empty() || value.chars().count() > MAX_VERSION_LEN {
        return Err(format!(
            "version must be between 1 and {MAX_VERSION_LEN} characters"
        ));
    }

    Ok(value.to_owned())
}

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Runs the migration and maps the outcome to the process exit status.
pub async fn run(args: &MigrateArgs, runner: &MigrationRunner) -> ExitCode {
    match runner.run(&args.version).await {
        Ok(report) => {
            tracing::info!(
                "Migrated {} projects to version {}",
                report.processed,
                report.version
            );

            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::FAILURE,
    }
}
