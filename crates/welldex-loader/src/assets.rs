//! Asset upsert: `name`/`operator_id`/`basin`/coordinates are `COALESCE`d
//! against the existing row (a later enrichment pass can fill in what an
//! earlier one left null), `status` is hard-overwritten since the source
//! authoritatively restates it every run (spec.md §4.3). A (0,0) "unknown
//! location" update never clobbers a previously known coordinate.

use sqlx::{Postgres, Transaction};
use tracing::warn;

use welldex_common::{Result, WelldexError};
use welldex_schema::Asset;

use crate::BATCH_SIZE;

pub(crate) async fn upsert_all(tx: &mut Transaction<'_, Postgres>, assets: &[Asset]) -> Result<i64> {
    let mut upserted = 0i64;
    for (i, chunk) in assets.chunks(BATCH_SIZE).enumerate() {
        match upsert_chunk(tx, chunk, i).await {
            Ok(n) => upserted += n,
            Err(e) => {
                warn!(chunk = i, error = %e, "asset batch rolled back to savepoint");
                return Err(e);
            }
        }
    }
    Ok(upserted)
}

async fn upsert_chunk(tx: &mut Transaction<'_, Postgres>, chunk: &[Asset], chunk_idx: usize) -> Result<i64> {
    if chunk.is_empty() {
        return Ok(0);
    }

    let savepoint = format!("assets_batch_{chunk_idx}");
    sqlx::query(&format!("SAVEPOINT {savepoint}"))
        .execute(&mut **tx)
        .await
        .map_err(|e| WelldexError::Database(e.to_string()))?;

    const COLS: usize = 16;
    let mut sql = String::from(
        "INSERT INTO assets (id, asset_type, name, state, county, latitude, longitude, basin, \
         operator_id, status, spud_date, depth_ft, commodity, decline_rate, \
         estimated_remaining_life_months, created_at) VALUES ",
    );
    let placeholders: Vec<String> = (0..chunk.len())
        .map(|i| {
            let b = i * COLS;
            let cols: Vec<String> = (1..=COLS).map(|c| format!("${}", b + c)).collect();
            format!("({})", cols.join(", "))
        })
        .collect();
    sql.push_str(&placeholders.join(", "));
    sql.push_str(
        " ON CONFLICT (id) DO UPDATE SET \
            name = COALESCE(NULLIF(EXCLUDED.name, ''), assets.name), \
            county = COALESCE(EXCLUDED.county, assets.county), \
            latitude = CASE WHEN EXCLUDED.latitude = 0 AND EXCLUDED.longitude = 0 THEN assets.latitude ELSE EXCLUDED.latitude END, \
            longitude = CASE WHEN EXCLUDED.latitude = 0 AND EXCLUDED.longitude = 0 THEN assets.longitude ELSE EXCLUDED.longitude END, \
            basin = COALESCE(EXCLUDED.basin, assets.basin), \
            operator_id = COALESCE(EXCLUDED.operator_id, assets.operator_id), \
            status = EXCLUDED.status, \
            spud_date = COALESCE(EXCLUDED.spud_date, assets.spud_date), \
            depth_ft = COALESCE(EXCLUDED.depth_ft, assets.depth_ft), \
            commodity = EXCLUDED.commodity, \
            updated_at = now()",
    );

    let mut query = sqlx::query(&sql);
    for a in chunk {
        query = query
            .bind(&a.id)
            .bind(a.asset_type.to_string())
            .bind(&a.name)
            .bind(&a.state)
            .bind(&a.county)
            .bind(a.latitude)
            .bind(a.longitude)
            .bind(&a.basin)
            .bind(&a.operator_id)
            .bind(a.status.to_string())
            .bind(a.spud_date)
            .bind(a.depth_ft)
            .bind(&a.commodity)
            .bind(a.decline_rate)
            .bind(a.estimated_remaining_life_months)
            .bind(a.created_at);
    }

    match query.execute(&mut **tx).await {
        Ok(result) => {
            sqlx::query(&format!("RELEASE SAVEPOINT {savepoint}"))
                .execute(&mut **tx)
                .await
                .ok();
            Ok(result.rows_affected() as i64)
        }
        Err(e) => {
            sqlx::query(&format!("ROLLBACK TO SAVEPOINT {savepoint}"))
                .execute(&mut **tx)
                .await
                .ok();
            Err(WelldexError::Database(format!("asset batch {chunk_idx}: {e}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_count_matches_column_count() {
        let cols: Vec<String> = (1..=16).map(|c| format!("${c}")).collect();
        assert_eq!(cols.len(), 16);
        assert_eq!(cols[15], "$16");
    }
}
