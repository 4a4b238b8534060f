//! Canonical entity types shared by every source adapter's Mapper, the
//! Loader, the Deduplicator, and the Linker. These are the in-memory shape;
//! `migrations/0001_init.sql` defines the relational shape they're upserted
//! into.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{AssetStatus, AssetType, ProvenanceStatus};

/// A single producing or plugged well, or occasionally a lease treated as a unit.
///
/// Invariants (spec.md §3): `id` is deterministic from `(source, natural_key)`
/// and never mutates; `id` uniquely identifies one well across re-ingestion;
/// `operator_id`, if set, must resolve to an extant operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub asset_type: AssetType,
    pub name: String,
    pub state: String,
    pub county: Option<String>,
    /// WGS84 degrees. `(0.0, 0.0)` is a valid "unknown location" sentinel,
    /// never a real equatorial point.
    pub latitude: f64,
    pub longitude: f64,
    pub basin: Option<String>,
    pub operator_id: Option<String>,
    pub status: AssetStatus,
    pub spud_date: Option<NaiveDate>,
    pub depth_ft: Option<f64>,
    pub commodity: String,
    pub decline_rate: Option<f64>,
    pub estimated_remaining_life_months: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Asset {
    /// `true` when the coordinates are the "unknown location" sentinel.
    pub fn has_unknown_location(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }
}

/// The legal entity responsible for an asset's regulatory compliance.
///
/// Invariants (spec.md §3): `legal_name` is non-empty; `aliases` is a
/// superset of every legal name ever merged into this record; after dedup,
/// no two operators share any normalized-name variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    pub id: String,
    pub legal_name: String,
    pub aliases: Vec<String>,
    pub hq_state: Option<String>,
    pub hq_city: Option<String>,
    pub active_asset_count: i64,
    pub compliance_flags: Vec<String>,
    pub risk_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Operator {
    /// Every normalized-matching variant this operator can be found under:
    /// its legal name plus every alias. Used to build the Linker's name index.
    pub fn normalized_variants(&self) -> Vec<String> {
        let mut variants: Vec<String> = std::iter::once(&self.legal_name)
            .chain(self.aliases.iter())
            .map(|n| welldex_common::normalize_for_matching(n))
            .collect();
        variants.sort();
        variants.dedup();
        variants
    }
}

/// Monthly production volumes for one asset.
///
/// Invariant (spec.md §3): `(asset_id, month)` is unique; `month` is always
/// normalized to the 1st of the month; at least one volume field is
/// non-null at insert time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub asset_id: String,
    pub month: NaiveDate,
    pub oil_volume_bbl: Option<f64>,
    pub gas_volume_mcf: Option<f64>,
    pub ore_volume_tons: Option<f64>,
    pub water_cut_pct: Option<f64>,
    pub downtime_days: Option<i32>,
}

impl ProductionRecord {
    /// At least one volume field must be populated for the row to be worth inserting.
    pub fn has_any_volume(&self) -> bool {
        self.oil_volume_bbl.is_some() || self.gas_volume_mcf.is_some() || self.ore_volume_tons.is_some()
    }
}

/// One row per ingestion run, written regardless of outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataProvenance {
    pub source_name: String,
    pub source_url: String,
    pub ingested_at: DateTime<Utc>,
    pub record_count: i64,
    pub status: ProvenanceStatus,
    pub notes: String,
}
