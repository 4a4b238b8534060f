//! Cross-source entity deduplication (spec.md §4.4). Runs once per
//! orchestrator invocation, after every source load has committed: merges
//! operators that represent the same legal entity, then assets that
//! represent the same well, all inside a single transaction.

mod assets;
mod operators;
mod union_find;

use sqlx::PgPool;
use tracing::info;

use welldex_common::{Result, WelldexError};

/// Fuzzy/proximity thresholds and dry-run switch for one dedup run.
#[derive(Debug, Clone)]
pub struct DedupConfig {
    pub fuzzy_threshold: usize,
    pub proximity_threshold: f64,
    pub dry_run: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self { fuzzy_threshold: 3, proximity_threshold: 0.01, dry_run: false }
    }
}

/// Outcome of one dedup run. `details` narrates every merge for the
/// post-hoc review the asset proximity rule's false positives call for
/// (spec.md §9).
#[derive(Debug, Clone, Default)]
pub struct DedupResult {
    pub operators_merged: usize,
    pub operators_deleted: usize,
    pub assets_merged: usize,
    pub assets_deleted: usize,
    pub cross_state_operator_merges: usize,
    pub details: Vec<String>,
    pub dry_run: bool,
}

pub async fn run_dedup(pool: &PgPool, config: &DedupConfig) -> Result<DedupResult> {
    let mut tx = pool.begin().await.map_err(|e| WelldexError::Database(e.to_string()))?;

    let mut result = DedupResult { dry_run: config.dry_run, ..Default::default() };

    operators::dedup_operators(&mut tx, config, &mut result).await?;
    assets::dedup_assets(&mut tx, config, &mut result).await?;

    if config.dry_run {
        tx.rollback().await.map_err(|e| WelldexError::Database(e.to_string()))?;
        info!(
            operators_merged = result.operators_merged,
            assets_merged = result.assets_merged,
            "dedup dry run rolled back"
        );
    } else {
        tx.commit().await.map_err(|e| WelldexError::Database(e.to_string()))?;
        info!(
            operators_merged = result.operators_merged,
            assets_merged = result.assets_merged,
            cross_state_operator_merges = result.cross_state_operator_merges,
            "dedup run committed"
        );
    }

    Ok(result)
}
