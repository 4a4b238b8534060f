//! Operator dedup: three grouping strategies feeding one union-find, then
//! merge-into-canonical (spec.md §4.4). Exact legal-name match and alias-set
//! overlap both collapse to "shares a normalized variant" and are handled
//! by the same pass; fuzzy match is a second pass gated by a cheap length
//! check before the Levenshtein distance is computed (spec.md §8).

use std::collections::HashMap;

use sqlx::{Postgres, Row, Transaction};
use tracing::debug;

use welldex_common::{normalize_for_matching, Result, WelldexError};

use crate::union_find::UnionFind;
use crate::{DedupConfig, DedupResult};

struct OperatorRow {
    id: String,
    legal_name: String,
    aliases: Vec<String>,
    hq_state: Option<String>,
}

impl OperatorRow {
    fn variants(&self) -> Vec<String> {
        let mut v: Vec<String> = std::iter::once(&self.legal_name)
            .chain(self.aliases.iter())
            .map(|n| normalize_for_matching(n))
            .collect();
        v.sort();
        v.dedup();
        v
    }
}

pub(crate) async fn dedup_operators(
    tx: &mut Transaction<'_, Postgres>,
    config: &DedupConfig,
    result: &mut DedupResult,
) -> Result<()> {
    let rows = sqlx::query("SELECT id, legal_name, aliases, hq_state FROM operators ORDER BY id")
        .fetch_all(&mut **tx)
        .await
        .map_err(db_err)?;

    let operators: Vec<OperatorRow> = rows
        .into_iter()
        .map(|r| OperatorRow {
            id: r.get("id"),
            legal_name: r.get("legal_name"),
            aliases: r.get("aliases"),
            hq_state: r.get("hq_state"),
        })
        .collect();

    if operators.len() < 2 {
        return Ok(());
    }

    let mut uf = UnionFind::new(operators.len());
    let variant_sets: Vec<Vec<String>> = operators.iter().map(|o| o.variants()).collect();

    let mut first_seen: HashMap<String, usize> = HashMap::new();
    for (i, variants) in variant_sets.iter().enumerate() {
        for variant in variants {
            if let Some(&first) = first_seen.get(variant) {
                uf.union(first, i);
            } else {
                first_seen.insert(variant.clone(), i);
            }
        }
    }

    for i in 0..operators.len() {
        for j in (i + 1)..operators.len() {
            if uf.find(i) == uf.find(j) {
                continue;
            }
            if fuzzy_match(&variant_sets[i], &variant_sets[j], config.fuzzy_threshold) {
                uf.union(i, j);
            }
        }
    }

    for group in uf.groups() {
        if group.len() < 2 {
            continue;
        }
        let mut members: Vec<&OperatorRow> = group.iter().map(|&i| &operators[i]).collect();
        members.sort_by(|a, b| a.legal_name.cmp(&b.legal_name));
        let canonical = members[0];
        let duplicates = &members[1..];

        let mut merged_aliases: Vec<String> = canonical.aliases.clone();
        let mut cross_state = false;
        for dup in duplicates {
            if dup.legal_name != canonical.legal_name && !merged_aliases.contains(&dup.legal_name) {
                merged_aliases.push(dup.legal_name.clone());
            }
            merged_aliases.extend(dup.aliases.iter().cloned());
            if let (Some(a), Some(b)) = (&canonical.hq_state, &dup.hq_state) {
                if a != b {
                    cross_state = true;
                }
            }
        }
        merged_aliases.sort();
        merged_aliases.dedup();

        let dup_ids: Vec<String> = duplicates.iter().map(|d| d.id.clone()).collect();

        debug!(canonical = %canonical.id, duplicates = ?dup_ids, "merging operator group");
        result
            .details
            .push(format!("merged operators {dup_ids:?} into {} ({})", canonical.id, canonical.legal_name));

        sqlx::query("UPDATE operators SET aliases = $1, updated_at = now() WHERE id = $2")
            .bind(&merged_aliases)
            .bind(&canonical.id)
            .execute(&mut **tx)
            .await
            .map_err(db_err)?;

        sqlx::query("UPDATE assets SET operator_id = $1 WHERE operator_id = ANY($2)")
            .bind(&canonical.id)
            .bind(&dup_ids)
            .execute(&mut **tx)
            .await
            .map_err(db_err)?;

        sqlx::query("DELETE FROM operators WHERE id = ANY($1)")
            .bind(&dup_ids)
            .execute(&mut **tx)
            .await
            .map_err(db_err)?;

        result.operators_merged += 1;
        result.operators_deleted += dup_ids.len();
        if cross_state {
            result.cross_state_operator_merges += 1;
        }
    }

    Ok(())
}

fn fuzzy_match(a_variants: &[String], b_variants: &[String], threshold: usize) -> bool {
    for a in a_variants {
        for b in b_variants {
            if a.len().abs_diff(b.len()) > threshold {
                continue;
            }
            if strsim::levenshtein(a, b) <= threshold {
                return true;
            }
        }
    }
    false
}

fn db_err(e: sqlx::Error) -> WelldexError {
    WelldexError::Database(e.to_string())
}
