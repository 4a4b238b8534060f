//! North Dakota Industrial Commission: fixed-width ASCII well layout, plus a
//! separate fixed-width production extract that carries lat/lon instead of
//! a well key and must be resolved by the Loader's spatial join
//! (spec.md §4.2). Direct GET, no auth.

use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use welldex_common::{
    asset_id, basin_for_latitude, operator_id, parse_flexible_date, LatitudeBand, Result, WelldexError,
};
use welldex_schema::{Asset, AssetStatus, AssetType, Operator};

use crate::http::{get_with_retry, looks_like_html_error};
use crate::parsers::fixed_width::{FieldSpec, FixedWidthRows};
use crate::staging::{latest_stage_dir, stage_dir_today};
use crate::traits::{PendingSpatialProduction, RunOptions, SourceAdapter, SourceBatch};

const SOURCE_TAG: &str = "nd_ndic";
const WELLS_URL: &str = "https://www.dmr.nd.gov/oilgas/feeservices/wells.txt";
const PRODUCTION_URL: &str = "https://www.dmr.nd.gov/oilgas/feeservices/production.txt";
const WELLS_FILE: &str = "wells.txt";
const PRODUCTION_FILE: &str = "production.txt";

/// Bakken country has no meaningfully divided oil & gas counties at the
/// source layer; basin is assigned purely by latitude band.
const LATITUDE_BANDS: &[LatitudeBand] = &[
    LatitudeBand { min_lat: 47.0, basin: "Williston" },
    LatitudeBand { min_lat: 0.0, basin: "Williston" },
];

/// Production rows are delivered with ~0.003° GPS precision.
const PRODUCTION_PRECISION_DEGREES: f64 = 0.003;

const WELL_LAYOUT: &[FieldSpec] = &[
    FieldSpec { name: "api_number", start: 0, end: 14 },
    FieldSpec { name: "well_name", start: 14, end: 54 },
    FieldSpec { name: "operator_number", start: 54, end: 64 },
    FieldSpec { name: "operator_name", start: 64, end: 104 },
    FieldSpec { name: "well_status", start: 104, end: 109 },
    FieldSpec { name: "well_type", start: 109, end: 114 },
    FieldSpec { name: "spud_date", start: 114, end: 122 },
    FieldSpec { name: "depth_ft", start: 122, end: 130 },
    FieldSpec { name: "latitude", start: 130, end: 140 },
    FieldSpec { name: "longitude", start: 140, end: 150 },
];

const PRODUCTION_LAYOUT: &[FieldSpec] = &[
    FieldSpec { name: "report_month", start: 0, end: 6 },
    FieldSpec { name: "latitude", start: 6, end: 16 },
    FieldSpec { name: "longitude", start: 16, end: 26 },
    FieldSpec { name: "oil_bbl", start: 26, end: 36 },
    FieldSpec { name: "gas_mcf", start: 36, end: 46 },
    FieldSpec { name: "water_pct", start: 46, end: 53 },
];

fn map_status(raw: &str) -> AssetStatus {
    match raw.trim().to_uppercase().as_str() {
        "A" | "AC" | "DRL" | "PER" => AssetStatus::Active,
        "SI" | "TA" => AssetStatus::ShutIn,
        _ => AssetStatus::Inactive,
    }
}

fn map_type(raw: &str) -> AssetType {
    match raw.trim().to_uppercase().as_str() {
        "GAS" | "G" => AssetType::Gas,
        _ => AssetType::Oil,
    }
}

pub struct NdNdicAdapter;

impl NdNdicAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NdNdicAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for NdNdicAdapter {
    fn source_tag(&self) -> &'static str {
        SOURCE_TAG
    }

    async fn run(&self, data_dir: &Path, opts: &RunOptions) -> Result<SourceBatch> {
        let (wells_path, production_path) = if opts.download {
            download(data_dir, opts).await?
        } else {
            let dir = latest_stage_dir(data_dir, SOURCE_TAG)
                .ok_or_else(|| WelldexError::Config(format!("no staged download for {SOURCE_TAG}")))?;
            (dir.join(WELLS_FILE), dir.join(PRODUCTION_FILE))
        };

        let mut batch = parse_wells(&wells_path)?;
        let (pending, prod_errors) = parse_production(&production_path)?;
        batch.pending_productions = pending;
        batch.parse_errors += prod_errors;
        Ok(batch)
    }
}

async fn download(data_dir: &Path, opts: &RunOptions) -> Result<(std::path::PathBuf, std::path::PathBuf)> {
    let dir = stage_dir_today(data_dir, SOURCE_TAG).map_err(WelldexError::Io)?;
    let client = reqwest::Client::new();

    let wells_path = dir.join(WELLS_FILE);
    download_one(&client, WELLS_URL, &wells_path, opts).await?;

    let production_path = dir.join(PRODUCTION_FILE);
    download_one(&client, PRODUCTION_URL, &production_path, opts).await?;

    Ok((wells_path, production_path))
}

async fn download_one(client: &reqwest::Client, url: &str, dest: &Path, opts: &RunOptions) -> Result<()> {
    let resp = get_with_retry(client, url, opts.retry_attempts, opts.retry_base_delay, Duration::from_secs(30 * 60)).await?;
    let bytes = resp.bytes().await.map_err(|e| WelldexError::Network(e.to_string()))?;
    if looks_like_html_error(&bytes) {
        return Err(WelldexError::Integrity(format!("{url} returned an HTML error page")));
    }
    std::fs::write(dest, &bytes).map_err(WelldexError::Io)?;
    info!(url, bytes = bytes.len(), "downloaded ND NDIC file");
    Ok(())
}

fn parse_wells(path: &Path) -> Result<SourceBatch> {
    let file = std::fs::File::open(path).map_err(WelldexError::Io)?;
    let reader = FixedWidthRows::new(BufReader::new(file), WELL_LAYOUT);

    let mut batch = SourceBatch {
        source_url: WELLS_URL.to_string(),
        ..Default::default()
    };
    let mut seen_operators = std::collections::HashMap::new();
    let now = Utc::now();

    for fields in reader {
        let api = fields.get("api_number").map(|s| s.as_str()).unwrap_or("");
        if api.is_empty() {
            batch.parse_errors += 1;
            continue;
        }

        let op_name_raw = fields.get("operator_name").map(|s| s.as_str()).unwrap_or("");
        let op_number = fields.get("operator_number").map(|s| s.as_str()).unwrap_or("");
        let op_id = if op_name_raw.is_empty() {
            None
        } else {
            let op_name = welldex_common::canonicalize_display_name(op_name_raw);
            let norm = welldex_common::normalize_for_matching(op_name_raw);
            let id = operator_id(SOURCE_TAG, Some(op_number).filter(|s| !s.is_empty()), &norm);
            seen_operators.entry(id.clone()).or_insert_with(|| Operator {
                id: id.clone(),
                legal_name: op_name,
                aliases: vec![op_name_raw.to_string()],
                hq_state: Some("ND".to_string()),
                hq_city: None,
                active_asset_count: 0,
                compliance_flags: vec![],
                risk_score: None,
                created_at: now,
                updated_at: now,
            });
            Some(id)
        };

        let latitude: f64 = fields.get("latitude").and_then(|s| s.parse().ok()).unwrap_or(0.0);
        let asset_type = map_type(fields.get("well_type").map(|s| s.as_str()).unwrap_or(""));

        let asset = Asset {
            id: asset_id(SOURCE_TAG, Some(api), api),
            asset_type,
            name: fields.get("well_name").cloned().unwrap_or_default(),
            state: "ND".to_string(),
            county: None,
            latitude,
            longitude: fields.get("longitude").and_then(|s| s.parse().ok()).unwrap_or(0.0),
            basin: basin_for_latitude(LATITUDE_BANDS, latitude),
            operator_id: op_id,
            status: map_status(fields.get("well_status").map(|s| s.as_str()).unwrap_or("")),
            spud_date: fields.get("spud_date").and_then(|s| parse_flexible_date(s)),
            depth_ft: fields.get("depth_ft").and_then(|s| s.parse().ok()),
            commodity: if asset_type == AssetType::Gas { "natural gas" } else { "crude oil" }.to_string(),
            decline_rate: None,
            estimated_remaining_life_months: None,
            created_at: now,
            updated_at: now,
        };
        batch.assets.insert(asset.id.clone(), asset);
    }

    batch.operators = seen_operators.into_values().collect();
    Ok(batch)
}

fn parse_production(path: &Path) -> Result<(Vec<PendingSpatialProduction>, u64)> {
    let file = std::fs::File::open(path).map_err(WelldexError::Io)?;
    let reader = FixedWidthRows::new(BufReader::new(file), PRODUCTION_LAYOUT);

    let mut pending = Vec::new();
    let mut errors = 0u64;

    for fields in reader {
        let Some(month) = fields.get("report_month").and_then(|s| parse_flexible_date(s)) else {
            errors += 1;
            continue;
        };
        let Some(latitude) = fields.get("latitude").and_then(|s| s.parse::<f64>().ok()) else {
            errors += 1;
            continue;
        };
        let Some(longitude) = fields.get("longitude").and_then(|s| s.parse::<f64>().ok()) else {
            errors += 1;
            continue;
        };

        let oil = fields.get("oil_bbl").and_then(|s| s.parse::<f64>().ok()).filter(|v| *v != 0.0);
        let gas = fields.get("gas_mcf").and_then(|s| s.parse::<f64>().ok()).filter(|v| *v != 0.0);

        // ND NDIC is a spatial-join stager: a row with oil=0 AND gas=0 is
        // dropped outright rather than inserted with NULL volumes
        // (spec.md §8 boundary behavior, documented per-source).
        if oil.is_none() && gas.is_none() {
            continue;
        }

        pending.push(PendingSpatialProduction {
            latitude,
            longitude,
            precision_degrees: PRODUCTION_PRECISION_DEGREES,
            month: welldex_common::first_of_month(month),
            oil_volume_bbl: oil,
            gas_volume_mcf: gas,
            water_cut_pct: fields.get("water_pct").and_then(|s| s.parse().ok()),
            downtime_days: None,
        });
    }

    Ok((pending, errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixed(path: &Path, lines: &[String]) {
        let mut f = std::fs::File::create(path).unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
    }

    #[test]
    fn parses_wells_with_latitude_band_basin() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("wells.txt");
        let line = format!(
            "{:<14}{:<40}{:<10}{:<40}{:<5}{:<5}{:<8}{:<8}{:<10}{:<10}",
            "33-053-12345", "Fort Berthold 1", "4021", "CONTINENTAL RESOURCES INC", "A", "OIL", "20170601", "11200", "48.100000", "-103.200000"
        );
        write_fixed(&path, &[line]);

        let batch = parse_wells(&path).unwrap();
        assert_eq!(batch.assets.len(), 1);
        let asset = batch.assets.values().next().unwrap();
        assert_eq!(asset.basin.as_deref(), Some("Williston"));
        assert_eq!(asset.status, AssetStatus::Active);
    }

    #[test]
    fn zero_zero_production_rows_are_dropped() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("production.txt");
        let line = format!(
            "{:<6}{:<10}{:<10}{:<10}{:<10}{:<7}",
            "202303", "48.100000", "-103.200000", "0", "0", "10.0"
        );
        write_fixed(&path, &[line]);

        let (pending, errors) = parse_production(&path).unwrap();
        assert_eq!(pending.len(), 0);
        assert_eq!(errors, 0);
    }

    #[test]
    fn nonzero_production_row_is_staged_for_spatial_join() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("production.txt");
        let line = format!(
            "{:<6}{:<10}{:<10}{:<10}{:<10}{:<7}",
            "202303", "48.100000", "-103.200000", "1500", "900", "10.0"
        );
        write_fixed(&path, &[line]);

        let (pending, _errors) = parse_production(&path).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].oil_volume_bbl, Some(1500.0));
        assert_eq!(pending[0].month, chrono::NaiveDate::from_ymd_opt(2023, 3, 1).unwrap());
    }
}
