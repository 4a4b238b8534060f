//! Post-dedup asset↔operator linking (spec.md §4.5). Runs after Dedup, in
//! its own transaction: repairs asset rows whose `operator_id` pointed at
//! an operator merged away, and links assets the source never attached an
//! operator to in the first place by matching name segments against an
//! index built from every operator's legal name and aliases.

mod name_split;

use std::collections::HashMap;

use sqlx::{PgPool, Row};
use tracing::{debug, info};

use welldex_common::{normalize_for_matching, Result, WelldexError};

/// Outcome of one linker run.
#[derive(Debug, Clone, Default)]
pub struct LinkResult {
    pub assets_linked: usize,
    pub cross_state_events: usize,
    pub details: Vec<String>,
}

struct IndexEntry {
    operator_id: String,
    hq_state: Option<String>,
}

pub async fn run_link(pool: &PgPool) -> Result<LinkResult> {
    let mut tx = pool.begin().await.map_err(db_err)?;
    let mut result = LinkResult::default();

    let operator_rows = sqlx::query("SELECT id, legal_name, aliases, hq_state FROM operators")
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;

    let mut index: HashMap<String, IndexEntry> = HashMap::new();
    for row in &operator_rows {
        let id: String = row.get("id");
        let legal_name: String = row.get("legal_name");
        let aliases: Vec<String> = row.get("aliases");
        let hq_state: Option<String> = row.get("hq_state");

        for raw in std::iter::once(&legal_name).chain(aliases.iter()) {
            let key = normalize_for_matching(raw);
            index.entry(key).or_insert_with(|| IndexEntry { operator_id: id.clone(), hq_state: hq_state.clone() });
        }
    }

    // Assets whose operator_id points at nothing (merged away by dedup)
    // are treated the same as never-linked — both need a fresh match.
    let asset_rows = sqlx::query(
        "SELECT a.id, a.name, a.state FROM assets a \
         LEFT JOIN operators o ON o.id = a.operator_id \
         WHERE a.operator_id IS NULL OR o.id IS NULL",
    )
    .fetch_all(&mut *tx)
    .await
    .map_err(db_err)?;

    for row in asset_rows {
        let asset_id: String = row.get("id");
        let name: String = row.get("name");
        let state: String = row.get("state");

        let mut matched: Option<&IndexEntry> = None;
        for segment in name_split::split_segments(&name) {
            let key = normalize_for_matching(&segment);
            if let Some(entry) = index.get(&key) {
                matched = Some(entry);
                break;
            }
        }

        let Some(entry) = matched else { continue };

        let cross_state = entry.hq_state.as_deref().is_some_and(|hq| hq != state);

        sqlx::query("UPDATE assets SET operator_id = $1, updated_at = now() WHERE id = $2")
            .bind(&entry.operator_id)
            .bind(&asset_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        debug!(asset_id, operator_id = %entry.operator_id, cross_state, "linked asset to operator");
        result.details.push(format!("linked {asset_id} to {}", entry.operator_id));
        result.assets_linked += 1;
        if cross_state {
            result.cross_state_events += 1;
        }
    }

    tx.commit().await.map_err(db_err)?;
    info!(assets_linked = result.assets_linked, cross_state_events = result.cross_state_events, "linker run committed");

    Ok(result)
}

fn db_err(e: sqlx::Error) -> WelldexError {
    WelldexError::Database(e.to_string())
}
