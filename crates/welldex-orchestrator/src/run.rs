//! Sequential per-source execution, dedup, and link (spec.md §4.6). Source
//! adapters run one at a time by default — bulk downloads would otherwise
//! saturate upstream rate limits — each as its own re-exec'd child process
//! so a crash in one does not taint shared process state. A 30 minute
//! timeout bounds each child.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, info, warn};

use welldex_adapters::{by_tag, RunOptions};
use welldex_common::{Config, Result, WelldexError};

use crate::state::StateFile;

const SOURCE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Outcome of one full orchestrator invocation (one-shot or one scheduler fire).
#[derive(Debug, Default)]
pub struct RunSummary {
    pub source_results: Vec<(String, bool)>,
    pub dedup_ran: bool,
    pub dedup_ok: bool,
    pub link_ran: bool,
    pub link_ok: bool,
}

impl RunSummary {
    /// Exit-code semantics (spec.md §6): success only if every requested
    /// step succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.source_results.iter().all(|(_, ok)| *ok)
            && (!self.dedup_ran || self.dedup_ok)
            && (!self.link_ran || self.link_ok)
    }
}

pub async fn run_sources_sequentially(sources: &[&str], download: bool, state_path: &Path) -> Vec<(String, bool)> {
    let mut state = StateFile::load(state_path);
    let mut results = Vec::new();

    for &tag in sources {
        info!(source = tag, "starting source run");
        let ok = match run_one_source_subprocess(tag, download).await {
            Ok(true) => true,
            Ok(false) => {
                warn!(source = tag, "source run finished with non-success status");
                false
            }
            Err(e) => {
                error!(source = tag, error = %e, "source run failed to complete");
                false
            }
        };

        state.record(tag, if ok { "success" } else { "failed" }, Utc::now());
        if let Err(e) = state.save(state_path) {
            warn!(error = %e, "failed to persist state file");
        }

        results.push((tag.to_string(), ok));
    }

    results
}

async fn run_one_source_subprocess(tag: &str, download: bool) -> Result<bool> {
    let exe = std::env::current_exe().map_err(WelldexError::Io)?;

    let mut cmd = tokio::process::Command::new(exe);
    cmd.arg("--run-source").arg(tag);
    if !download {
        cmd.arg("--no-download");
    }
    cmd.stdin(Stdio::null());

    let child = cmd.spawn().map_err(WelldexError::Io)?;

    match tokio::time::timeout(SOURCE_TIMEOUT, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output.status.success()),
        Ok(Err(e)) => Err(WelldexError::Io(e)),
        Err(_) => {
            error!(source = tag, timeout_secs = SOURCE_TIMEOUT.as_secs(), "source process timed out");
            Ok(false)
        }
    }
}

/// Entry point for the re-exec'd child: run exactly one source end to end
/// and translate its provenance status into a process exit code.
pub async fn run_single_source_in_process(tag: &str, download: bool, config: &Config, pool: &PgPool) -> Result<bool> {
    let adapter = by_tag(tag).ok_or_else(|| WelldexError::Config(format!("unknown source: {tag}")))?;

    let opts = RunOptions {
        download,
        retry_attempts: config.retry_attempts,
        retry_base_delay: Duration::from_secs(config.retry_base_delay_secs),
    };
    let batch = adapter.run(&PathBuf::from(&config.data_dir), &opts).await?;
    let result = welldex_loader::load_source_batch(pool, tag, batch).await?;

    info!(
        source = tag,
        status = ?result.status,
        assets = result.assets_upserted,
        operators = result.operators_upserted,
        production = result.production_inserted,
        errors = result.errors.len(),
        "source load complete"
    );

    Ok(matches!(result.status, welldex_schema::ProvenanceStatus::Success))
}

pub async fn run_dedup_step(pool: &PgPool, config: &Config) -> bool {
    let dedup_config = welldex_dedup::DedupConfig {
        fuzzy_threshold: config.dedup_fuzzy_threshold,
        proximity_threshold: config.dedup_proximity_threshold,
        dry_run: false,
    };
    match welldex_dedup::run_dedup(pool, &dedup_config).await {
        Ok(result) => {
            info!(
                operators_merged = result.operators_merged,
                assets_merged = result.assets_merged,
                "dedup step complete"
            );
            true
        }
        Err(e) => {
            error!(error = %e, "dedup step failed");
            false
        }
    }
}

pub async fn run_link_step(pool: &PgPool) -> bool {
    match welldex_linker::run_link(pool).await {
        Ok(result) => {
            info!(assets_linked = result.assets_linked, "link step complete");
            true
        }
        Err(e) => {
            error!(error = %e, "link step failed");
            false
        }
    }
}
