//! Batched upsert of one source's canonical entities into the store
//! (spec.md §4.3): operators, then assets, then production, all inside a
//! single transaction per source load, with a provenance row written
//! regardless of outcome.

mod assets;
mod operators;
mod production;
mod provenance;
mod spatial;

use std::time::{Duration, Instant};

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use welldex_adapters::SourceBatch;
use welldex_common::{Result, WelldexError};
use welldex_schema::ProvenanceStatus;

/// The outcome of loading one source's batch.
#[derive(Debug, Clone)]
pub struct LoadResult {
    pub assets_upserted: i64,
    pub operators_upserted: i64,
    pub production_inserted: i64,
    pub provenance_id: Uuid,
    pub duration: Duration,
    pub errors: Vec<String>,
    pub status: ProvenanceStatus,
}

/// Batch size for multi-row upserts (spec.md §4.3).
pub(crate) const BATCH_SIZE: usize = 1000;

/// Load `batch` for `source_name` into `pool`. One `BEGIN`/`COMMIT` wraps
/// the whole call; a fatal error (connection drop, deadlock) rolls the
/// entire transaction back and the run is recorded as `failed`. Individual
/// batch errors (FK/unique violations) are caught per-chunk via
/// `SAVEPOINT`, logged into `errors`, and do not prevent the rest of the
/// transaction from committing — that combination yields `partial`.
pub async fn load_source_batch(pool: &PgPool, source_name: &str, batch: SourceBatch) -> Result<LoadResult> {
    let start = Instant::now();
    let mut errors = Vec::new();

    let mut tx = match pool.begin().await {
        Ok(tx) => tx,
        Err(e) => {
            let provenance_id =
                provenance::write_outside_transaction(pool, source_name, &batch.source_url, 0, ProvenanceStatus::Failed, &e.to_string())
                    .await
                    .unwrap_or_else(|_| Uuid::nil());
            return Ok(LoadResult {
                assets_upserted: 0,
                operators_upserted: 0,
                production_inserted: 0,
                provenance_id,
                duration: start.elapsed(),
                errors: vec![format!("failed to open transaction: {e}")],
                status: ProvenanceStatus::Failed,
            });
        }
    };

    let operators_upserted = match operators::upsert_all(&mut tx, &batch.operators).await {
        Ok(n) => n,
        Err(e) => {
            errors.push(e.to_string());
            0
        }
    };

    let asset_list: Vec<_> = batch.assets.values().cloned().collect();
    let assets_upserted = match assets::upsert_all(&mut tx, &asset_list).await {
        Ok(n) => n,
        Err(e) => {
            errors.push(e.to_string());
            0
        }
    };

    let mut production_inserted = match production::upsert_all(&mut tx, &batch.productions).await {
        Ok(n) => n,
        Err(e) => {
            errors.push(e.to_string());
            0
        }
    };

    match spatial::resolve_and_insert(&mut tx, &batch.pending_productions).await {
        Ok(n) => production_inserted += n,
        Err(e) => errors.push(e.to_string()),
    }

    let total_upserted = operators_upserted + assets_upserted + production_inserted;
    let status = if errors.is_empty() {
        ProvenanceStatus::Success
    } else if total_upserted > 0 {
        ProvenanceStatus::Partial
    } else {
        ProvenanceStatus::Failed
    };

    let record_count = total_upserted;
    let notes = errors.join("; ");
    let provenance_id = match provenance::write(&mut tx, source_name, &batch.source_url, record_count, status, &notes).await {
        Ok(id) => id,
        Err(e) => {
            warn!(source_name, error = %e, "failed to write provenance row, rolling back");
            tx.rollback().await.map_err(|e| WelldexError::Database(e.to_string()))?;
            return Err(WelldexError::Database(e.to_string()));
        }
    };

    if let Err(e) = tx.commit().await {
        warn!(source_name, error = %e, "transaction commit failed");
        return Ok(LoadResult {
            assets_upserted: 0,
            operators_upserted: 0,
            production_inserted: 0,
            provenance_id,
            duration: start.elapsed(),
            errors: vec![format!("commit failed: {e}")],
            status: ProvenanceStatus::Failed,
        });
    }

    info!(
        source_name,
        operators_upserted, assets_upserted, production_inserted, error_count = errors.len(), "source load complete"
    );

    Ok(LoadResult {
        assets_upserted,
        operators_upserted,
        production_inserted,
        provenance_id,
        duration: start.elapsed(),
        errors,
        status,
    })
}
