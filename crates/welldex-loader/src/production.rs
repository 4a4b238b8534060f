//! Production upsert: conflict on `(asset_id, month)`, `COALESCE`
//! non-null volume fields (spec.md §4.3). A row referencing an unknown
//! asset id fails loudly via foreign key — that failure is caught at the
//! batch level, not hidden.

use sqlx::{Postgres, Transaction};
use tracing::warn;

use welldex_common::{Result, WelldexError};
use welldex_schema::ProductionRecord;

use crate::BATCH_SIZE;

pub(crate) async fn upsert_all(tx: &mut Transaction<'_, Postgres>, records: &[ProductionRecord]) -> Result<i64> {
    let worth_inserting: Vec<&ProductionRecord> = records.iter().filter(|r| r.has_any_volume()).collect();

    let mut upserted = 0i64;
    for (i, chunk) in worth_inserting.chunks(BATCH_SIZE).enumerate() {
        match upsert_chunk(tx, chunk, i).await {
            Ok(n) => upserted += n,
            Err(e) => {
                warn!(chunk = i, error = %e, "production batch rolled back to savepoint");
                return Err(e);
            }
        }
    }
    Ok(upserted)
}

async fn upsert_chunk(tx: &mut Transaction<'_, Postgres>, chunk: &[&ProductionRecord], chunk_idx: usize) -> Result<i64> {
    if chunk.is_empty() {
        return Ok(0);
    }

    let savepoint = format!("production_batch_{chunk_idx}");
    sqlx::query(&format!("SAVEPOINT {savepoint}"))
        .execute(&mut **tx)
        .await
        .map_err(|e| WelldexError::Database(e.to_string()))?;

    const COLS: usize = 6;
    let mut sql = String::from(
        "INSERT INTO production_records (asset_id, month, oil_volume_bbl, gas_volume_mcf, ore_volume_tons, water_cut_pct) VALUES ",
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
        " ON CONFLICT (asset_id, month) DO UPDATE SET \
            oil_volume_bbl = COALESCE(EXCLUDED.oil_volume_bbl, production_records.oil_volume_bbl), \
            gas_volume_mcf = COALESCE(EXCLUDED.gas_volume_mcf, production_records.gas_volume_mcf), \
            ore_volume_tons = COALESCE(EXCLUDED.ore_volume_tons, production_records.ore_volume_tons), \
            water_cut_pct = COALESCE(EXCLUDED.water_cut_pct, production_records.water_cut_pct)",
    );

    let mut query = sqlx::query(&sql);
    for r in chunk {
        query = query
            .bind(&r.asset_id)
            .bind(r.month)
            .bind(r.oil_volume_bbl)
            .bind(r.gas_volume_mcf)
            .bind(r.ore_volume_tons)
            .bind(r.water_cut_pct);
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
            Err(WelldexError::Database(format!("production batch {chunk_idx}: {e}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn zero_volume_records_are_filtered_before_insert() {
        let records = vec![ProductionRecord {
            asset_id: "x".into(),
            month: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            oil_volume_bbl: None,
            gas_volume_mcf: None,
            ore_volume_tons: None,
            water_cut_pct: Some(5.0),
            downtime_days: None,
        }];
        let worth: Vec<_> = records.iter().filter(|r| r.has_any_volume()).collect();
        assert!(worth.is_empty());
    }
}
