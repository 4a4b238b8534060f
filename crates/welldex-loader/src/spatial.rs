//! Spatial join for production-only sources that deliver coordinates but no
//! asset key (spec.md §4.2, §9). A session-scoped temp table plus a
//! `LATERAL` nearest-point join keeps the nearest-neighbour search inside
//! the database instead of loading every asset into the application.

use sqlx::{Postgres, Transaction};

use welldex_adapters::PendingSpatialProduction;
use welldex_common::{Result, WelldexError};

use crate::BATCH_SIZE;

const STAGE_TABLE: &str = "stage_pending_production";

pub(crate) async fn resolve_and_insert(
    tx: &mut Transaction<'_, Postgres>,
    pending: &[PendingSpatialProduction],
) -> Result<i64> {
    if pending.is_empty() {
        return Ok(0);
    }

    sqlx::query(&format!(
        "CREATE TEMP TABLE IF NOT EXISTS {STAGE_TABLE} (
            latitude DOUBLE PRECISION NOT NULL,
            longitude DOUBLE PRECISION NOT NULL,
            precision_degrees DOUBLE PRECISION NOT NULL,
            month DATE NOT NULL,
            oil_volume_bbl DOUBLE PRECISION,
            gas_volume_mcf DOUBLE PRECISION,
            water_cut_pct DOUBLE PRECISION,
            downtime_days INTEGER
        ) ON COMMIT DROP"
    ))
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;

    for chunk in pending.chunks(BATCH_SIZE) {
        insert_stage_chunk(tx, chunk).await?;
    }

    // Nearest-neighbour match within the bounding box; a staged row with no
    // asset inside its window simply drops out of the lateral join.
    let result = sqlx::query(&format!(
        "INSERT INTO production_records (asset_id, month, oil_volume_bbl, gas_volume_mcf, water_cut_pct)
         SELECT nearest.id, s.month, s.oil_volume_bbl, s.gas_volume_mcf, s.water_cut_pct
         FROM {STAGE_TABLE} s
         CROSS JOIN LATERAL (
            SELECT a.id
            FROM assets a
            WHERE a.latitude BETWEEN s.latitude - s.precision_degrees AND s.latitude + s.precision_degrees
              AND a.longitude BETWEEN s.longitude - s.precision_degrees AND s.longitude + s.precision_degrees
            ORDER BY (a.latitude - s.latitude) ^ 2 + (a.longitude - s.longitude) ^ 2
            LIMIT 1
         ) AS nearest
         ON CONFLICT (asset_id, month) DO UPDATE SET
            oil_volume_bbl = COALESCE(EXCLUDED.oil_volume_bbl, production_records.oil_volume_bbl),
            gas_volume_mcf = COALESCE(EXCLUDED.gas_volume_mcf, production_records.gas_volume_mcf),
            water_cut_pct = COALESCE(EXCLUDED.water_cut_pct, production_records.water_cut_pct)"
    ))
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;

    Ok(result.rows_affected() as i64)
}

async fn insert_stage_chunk(tx: &mut Transaction<'_, Postgres>, chunk: &[PendingSpatialProduction]) -> Result<()> {
    const COLS: usize = 8;
    let mut sql = format!(
        "INSERT INTO {STAGE_TABLE} (latitude, longitude, precision_degrees, month, oil_volume_bbl, gas_volume_mcf, water_cut_pct, downtime_days) VALUES "
    );
    let placeholders: Vec<String> = (0..chunk.len())
        .map(|i| {
            let b = i * COLS;
            let cols: Vec<String> = (1..=COLS).map(|c| format!("${}", b + c)).collect();
            format!("({})", cols.join(", "))
        })
        .collect();
    sql.push_str(&placeholders.join(", "));

    let mut query = sqlx::query(&sql);
    for row in chunk {
        query = query
            .bind(row.latitude)
            .bind(row.longitude)
            .bind(row.precision_degrees)
            .bind(row.month)
            .bind(row.oil_volume_bbl)
            .bind(row.gas_volume_mcf)
            .bind(row.water_cut_pct)
            .bind(row.downtime_days);
    }

    query.execute(&mut **tx).await.map_err(db_err)?;
    Ok(())
}

fn db_err(e: sqlx::Error) -> WelldexError {
    WelldexError::Database(e.to_string())
}
