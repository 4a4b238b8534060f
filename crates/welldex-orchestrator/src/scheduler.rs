//! Long-running `--schedule` mode (spec.md §4.6, §5): one cooperative cron
//! loop, blocking on signals. Each fire dispatches the full source → dedup →
//! link sequence; SIGINT/SIGTERM closes the pool and exits zero.

use std::path::Path;
use std::str::FromStr;

use chrono::Utc;
use cron::Schedule;
use sqlx::PgPool;
use tracing::{info, warn};

use welldex_common::{Config, Result, WelldexError};

use crate::run::{run_dedup_step, run_link_step, run_sources_sequentially};

pub async fn run_scheduler(pool: &PgPool, config: &Config, sources: &[&str], state_path: &Path) -> Result<()> {
    let schedule = Schedule::from_str(&config.schedule_cron)
        .map_err(|e| WelldexError::Config(format!("invalid schedule_cron {:?}: {e}", config.schedule_cron)))?;

    info!(cron = %config.schedule_cron, "scheduler started");

    loop {
        let Some(next) = schedule.upcoming(Utc).next() else {
            warn!("cron schedule has no further occurrences, stopping scheduler");
            return Ok(());
        };

        let now = Utc::now();
        let wait = (next - now).to_std().unwrap_or(std::time::Duration::ZERO);
        info!(next_run = %next, "waiting for next scheduled run");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                dispatch_full_sequence(pool, config, sources, state_path).await;
            }
            _ = wait_for_shutdown_signal() => {
                info!("shutdown signal received, closing pool and exiting");
                pool.close().await;
                return Ok(());
            }
        }
    }
}

async fn dispatch_full_sequence(pool: &PgPool, config: &Config, sources: &[&str], state_path: &Path) {
    info!("scheduled fire: running full source -> dedup -> link sequence");
    let results = run_sources_sequentially(sources, true, state_path).await;
    let any_source_failed = results.iter().any(|(_, ok)| !ok);

    let dedup_ok = run_dedup_step(pool, config).await;
    let link_ok = run_link_step(pool).await;

    info!(
        sources_ok = !any_source_failed,
        dedup_ok,
        link_ok,
        "scheduled run complete"
    );
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("install SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
