//! Asset dedup: groups assets sharing an operator whose coordinates sit
//! within the proximity threshold on both axes (spec.md §4.4). A
//! duplicate's production rows lose to an existing canonical row for the
//! same month rather than violating the `(asset_id, month)` uniqueness
//! invariant; the rest are remapped.

use std::collections::HashMap;

use sqlx::{Postgres, Row, Transaction};
use tracing::debug;

use welldex_common::{Result, WelldexError};

use crate::union_find::UnionFind;
use crate::{DedupConfig, DedupResult};

struct AssetRow {
    id: String,
    operator_id: Option<String>,
    latitude: f64,
    longitude: f64,
}

pub(crate) async fn dedup_assets(
    tx: &mut Transaction<'_, Postgres>,
    config: &DedupConfig,
    result: &mut DedupResult,
) -> Result<()> {
    let rows = sqlx::query("SELECT id, operator_id, latitude, longitude FROM assets WHERE operator_id IS NOT NULL ORDER BY id")
        .fetch_all(&mut **tx)
        .await
        .map_err(db_err)?;

    let assets: Vec<AssetRow> = rows
        .into_iter()
        .map(|r| AssetRow {
            id: r.get("id"),
            operator_id: r.get("operator_id"),
            latitude: r.get("latitude"),
            longitude: r.get("longitude"),
        })
        .collect();

    let mut by_operator: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, a) in assets.iter().enumerate() {
        if let Some(op) = &a.operator_id {
            by_operator.entry(op.clone()).or_default().push(i);
        }
    }

    for indices in by_operator.into_values() {
        if indices.len() < 2 {
            continue;
        }

        let mut uf = UnionFind::new(indices.len());
        for a in 0..indices.len() {
            for b in (a + 1)..indices.len() {
                let lat_diff = (assets[indices[a]].latitude - assets[indices[b]].latitude).abs();
                let lon_diff = (assets[indices[a]].longitude - assets[indices[b]].longitude).abs();
                if lat_diff <= config.proximity_threshold && lon_diff <= config.proximity_threshold {
                    uf.union(a, b);
                }
            }
        }

        for group in uf.groups() {
            if group.len() < 2 {
                continue;
            }
            let mut members: Vec<&AssetRow> = group.iter().map(|&local| &assets[indices[local]]).collect();
            members.sort_by(|a, b| a.id.cmp(&b.id));
            let canonical = members[0];
            let duplicates = &members[1..];
            let dup_ids: Vec<String> = duplicates.iter().map(|d| d.id.clone()).collect();

            debug!(canonical = %canonical.id, duplicates = ?dup_ids, "merging asset group");
            result.details.push(format!("merged assets {dup_ids:?} into {}", canonical.id));

            sqlx::query(
                "DELETE FROM production_records p USING production_records c \
                 WHERE p.asset_id = ANY($1) AND c.asset_id = $2 AND p.month = c.month",
            )
            .bind(&dup_ids)
            .bind(&canonical.id)
            .execute(&mut **tx)
            .await
            .map_err(db_err)?;

            sqlx::query("UPDATE production_records SET asset_id = $1 WHERE asset_id = ANY($2)")
                .bind(&canonical.id)
                .bind(&dup_ids)
                .execute(&mut **tx)
                .await
                .map_err(db_err)?;

            sqlx::query("UPDATE financial_estimates SET asset_id = $1 WHERE asset_id = ANY($2)")
                .bind(&canonical.id)
                .bind(&dup_ids)
                .execute(&mut **tx)
                .await
                .map_err(db_err)?;

            sqlx::query("DELETE FROM assets WHERE id = ANY($1)")
                .bind(&dup_ids)
                .execute(&mut **tx)
                .await
                .map_err(db_err)?;

            result.assets_merged += 1;
            result.assets_deleted += dup_ids.len();
        }
    }

    Ok(())
}

fn db_err(e: sqlx::Error) -> WelldexError {
    WelldexError::Database(e.to_string())
}

#[cfg(test)]
mod tests {
    #[test]
    fn proximity_rule_checks_both_axes_independently() {
        let threshold = 0.01;
        let lat_diff: f64 = (32.001f64 - 32.0).abs();
        let lon_diff: f64 = (-101.999f64 - (-102.0)).abs();
        assert!(lat_diff <= threshold && lon_diff <= threshold);

        let far_lon_diff: f64 = (-101.5f64 - (-102.0)).abs();
        assert!(far_lon_diff > threshold);
    }
}
