//! The Source Adapter contract (spec.md §4.2, §9): one adapter per source,
//! each composing a Downloader, a Parser, and a Mapper behind a single
//! `run()` entry point. Adding a new source means adding one
//! `SourceAdapter` implementation and one entry in [`all_sources`] — no
//! other code changes.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use welldex_common::Result;
use welldex_schema::{Asset, Operator, ProductionRecord};

/// A production row a source delivered with coordinates but no asset key
/// (spec.md §4.2 "Spatial join"). The Loader resolves `asset_id` at load
/// time by nearest-neighbour lookup within `precision_degrees` of
/// (latitude, longitude); a row with no asset inside that window is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSpatialProduction {
    pub latitude: f64,
    pub longitude: f64,
    pub precision_degrees: f64,
    pub month: NaiveDate,
    pub oil_volume_bbl: Option<f64>,
    pub gas_volume_mcf: Option<f64>,
    pub water_cut_pct: Option<f64>,
    pub downtime_days: Option<i32>,
}

/// Runtime knobs threaded through every adapter, sourced from CLI flags /
/// `Config` rather than hidden globals.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Whether to hit the network (`--download`) or reuse the latest staged directory.
    pub download: bool,
    pub retry_attempts: u32,
    pub retry_base_delay: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            download: true,
            retry_attempts: 5,
            retry_base_delay: Duration::from_secs(2),
        }
    }
}

/// The canonical batch one source adapter run hands to the Loader.
/// Mirrors the Loader's public contract in spec.md §4.3.
#[derive(Debug, Default)]
pub struct SourceBatch {
    pub assets: HashMap<String, Asset>,
    pub operators: Vec<Operator>,
    pub productions: Vec<ProductionRecord>,
    /// Production rows that arrived with coordinates but no asset key and
    /// must be resolved by the Loader's spatial join (spec.md §4.2).
    pub pending_productions: Vec<PendingSpatialProduction>,
    pub source_url: String,
    /// Rows skipped due to parse errors (short lines, bad numbers,
    /// unparseable dates) — never fatal, always counted.
    pub parse_errors: u64,
}

/// One source's Download → Parse → Map pipeline.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// The `<source_tag>` used for staging directories and identifier prefixes.
    fn source_tag(&self) -> &'static str;

    /// Run this source end-to-end: download (unless `opts.download` is
    /// false), parse, and map into a [`SourceBatch`]. A transient failure
    /// that exhausts retries, an auth failure, or a fatal schema problem
    /// surfaces as `Err` — the orchestrator records that as a failed source
    /// and moves on to the next one.
    async fn run(&self, data_dir: &Path, opts: &RunOptions) -> Result<SourceBatch>;
}

/// Every registered source, by tag. Adding a source means adding one entry
/// here (spec.md §9's "adapter registry").
pub fn all_sources() -> Vec<Box<dyn SourceAdapter>> {
    vec![
        Box::new(crate::sources::tx_rrc::TxRrcAdapter::new()),
        Box::new(crate::sources::ok_occ::OkOccAdapter::new()),
        Box::new(crate::sources::nm_ocd::NmOcdAdapter::new()),
        Box::new(crate::sources::co_cogcc::CoCogccAdapter::new()),
        Box::new(crate::sources::la_ldnr::LaLdnrAdapter::new()),
        Box::new(crate::sources::nd_ndic::NdNdicAdapter::new()),
    ]
}

/// Look up a single source by its `<source_tag>`, for `--<source>` CLI flags.
pub fn by_tag(tag: &str) -> Option<Box<dyn SourceAdapter>> {
    all_sources().into_iter().find(|s| s.source_tag() == tag)
}
