//! Operator upsert: alias arrays accumulate rather than replace, everything
//! else is `COALESCE`d against the existing row (spec.md §4.3).

use sqlx::{Postgres, Transaction};
use tracing::warn;

use welldex_common::{Result, WelldexError};
use welldex_schema::Operator;

use crate::BATCH_SIZE;

pub(crate) async fn upsert_all(tx: &mut Transaction<'_, Postgres>, operators: &[Operator]) -> Result<i64> {
    let mut upserted = 0i64;
    for (i, chunk) in operators.chunks(BATCH_SIZE).enumerate() {
        match upsert_chunk(tx, chunk, i).await {
            Ok(n) => upserted += n,
            Err(e) => {
                warn!(chunk = i, error = %e, "operator batch rolled back to savepoint");
                return Err(e);
            }
        }
    }
    Ok(upserted)
}

async fn upsert_chunk(tx: &mut Transaction<'_, Postgres>, chunk: &[Operator], chunk_idx: usize) -> Result<i64> {
    if chunk.is_empty() {
        return Ok(0);
    }

    let savepoint = format!("operators_batch_{chunk_idx}");
    sqlx::query(&format!("SAVEPOINT {savepoint}"))
        .execute(&mut **tx)
        .await
        .map_err(|e| WelldexError::Database(e.to_string()))?;

    const COLS: usize = 10;
    let mut sql = String::from(
        "INSERT INTO operators (id, legal_name, aliases, hq_state, hq_city, active_asset_count, compliance_flags, risk_score, created_at, updated_at) VALUES ",
    );
    let placeholders: Vec<String> = (0..chunk.len())
        .map(|i| {
            let b = i * COLS;
            format!(
                "(${}, ${}, ${}, ${}, ${}, ${}, ${}, ${}, ${}, ${})",
                b + 1, b + 2, b + 3, b + 4, b + 5, b + 6, b + 7, b + 8, b + 9, b + 10
            )
        })
        .collect();
    sql.push_str(&placeholders.join(", "));
    sql.push_str(
        " ON CONFLICT (id) DO UPDATE SET \
            legal_name = COALESCE(NULLIF(EXCLUDED.legal_name, ''), operators.legal_name), \
            aliases = (SELECT ARRAY(SELECT DISTINCT unnest(operators.aliases || EXCLUDED.aliases))), \
            hq_state = COALESCE(EXCLUDED.hq_state, operators.hq_state), \
            hq_city = COALESCE(EXCLUDED.hq_city, operators.hq_city), \
            updated_at = EXCLUDED.updated_at",
    );

    let mut query = sqlx::query(&sql);
    for op in chunk {
        query = query
            .bind(&op.id)
            .bind(&op.legal_name)
            .bind(&op.aliases)
            .bind(&op.hq_state)
            .bind(&op.hq_city)
            .bind(op.active_asset_count)
            .bind(&op.compliance_flags)
            .bind(op.risk_score)
            .bind(op.created_at)
            .bind(op.updated_at);
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
            Err(WelldexError::Database(format!("operator batch {chunk_idx}: {e}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn placeholder_layout_is_ten_columns_per_row() {
        let rows = 3;
        let placeholders: Vec<String> = (0..rows)
            .map(|i| {
                let b = i * 10;
                format!("(${}, ${})", b + 1, b + 10)
            })
            .collect();
        assert_eq!(placeholders[1], "($11, $20)");
    }

    fn sample() -> Operator {
        Operator {
            id: "x".into(),
            legal_name: "Acme".into(),
            aliases: vec!["ACME CO".into()],
            hq_state: None,
            hq_city: None,
            active_asset_count: 0,
            compliance_flags: vec![],
            risk_score: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn chunking_respects_batch_size() {
        let operators: Vec<Operator> = (0..2500).map(|_| sample()).collect();
        let chunks: Vec<_> = operators.chunks(BATCH_SIZE).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 1000);
        assert_eq!(chunks[2].len(), 500);
    }
}
