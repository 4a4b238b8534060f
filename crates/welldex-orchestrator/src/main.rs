mod cli;
mod run;
mod scheduler;
mod state;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use welldex_common::Config;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_redacted();

    let pool = match PgPoolOptions::new().max_connections(10).connect(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to database");
            return ExitCode::FAILURE;
        }
    };

    // Re-exec entrypoint: the parent spawns one child per source so a crash
    // in one adapter cannot taint shared process state (spec.md §4.6).
    if let Some(tag) = &cli.run_source {
        let ok = run::run_single_source_in_process(tag, cli.download, &config, &pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(source = %tag, error = %e, "source run errored");
                false
            });
        return if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE };
    }

    let sources = cli.requested_sources();
    let state_path = Path::new(&cli.state_file);

    if cli.schedule {
        return match scheduler::run_scheduler(&pool, &config, &sources, state_path).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "scheduler exited with error");
                ExitCode::FAILURE
            }
        };
    }

    let mut summary = run::RunSummary::default();
    summary.source_results = run::run_sources_sequentially(&sources, cli.download, state_path).await;

    if cli.dedup {
        summary.dedup_ran = true;
        summary.dedup_ok = run::run_dedup_step(&pool, &config).await;
    }
    if cli.link {
        summary.link_ran = true;
        summary.link_ok = run::run_link_step(&pool).await;
    }

    for (tag, ok) in &summary.source_results {
        tracing::info!(source = tag, ok, "summary");
    }

    if summary.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
