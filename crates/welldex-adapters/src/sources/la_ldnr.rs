//! Louisiana Department of Natural Resources: SONRIS extract delivered
//! through a GoAnywhere MFT portal (spec.md §4.2). The staged file is
//! pipe-delimited, same shape as the bulk sources, just fetched through the
//! three-step MFT protocol instead of a direct GET.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use welldex_common::{
    asset_id, basin_for_county, county_name, operator_id, parse_flexible_date, Result, WelldexError,
};
use welldex_schema::{Asset, AssetStatus, AssetType, Operator};

use crate::goanywhere::{fetch_file, mft_client};
use crate::http::looks_like_html_error;
use crate::parsers::pipe_delimited::{open_pipe_delimited, PipeDelimitedRows};
use crate::staging::{latest_stage_dir, stage_dir_today};
use crate::traits::{RunOptions, SourceAdapter, SourceBatch};

const SOURCE_TAG: &str = "la_ldnr";
const PORTAL_URL: &str = "https://sonlite.dnr.louisiana.gov/mft/portal";
const FOLDER_PATH: &str = "/SONRIS/Extracts";
const FILE_NAME: &str = "WELL_EXTRACT.TXT";

const COUNTIES: &[(&str, &str)] = &[
    ("017", "Caddo"),
    ("031", "De Soto"),
    ("085", "Lafayette"),
    ("113", "Rapides"),
];

const BASINS: &[(&str, &str)] = &[
    ("Caddo", "Haynesville"),
    ("De Soto", "Haynesville"),
    ("Lafayette", "Gulf Coast"),
    ("Rapides", "Gulf Coast"),
];

fn map_status(raw: &str) -> AssetStatus {
    match raw.trim().to_uppercase().as_str() {
        "ACTIVE" | "A" | "DRILLING" | "PERMITTED" => AssetStatus::Active,
        "SI" | "SHUT-IN" | "TA" => AssetStatus::ShutIn,
        _ => AssetStatus::Inactive,
    }
}

fn map_type(raw: &str) -> AssetType {
    match raw.trim().to_uppercase().as_str() {
        "GAS" | "CBM" | "CONDENSATE" => AssetType::Gas,
        _ => AssetType::Oil,
    }
}

pub struct LaLdnrAdapter;

impl LaLdnrAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LaLdnrAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for LaLdnrAdapter {
    fn source_tag(&self) -> &'static str {
        SOURCE_TAG
    }

    async fn run(&self, data_dir: &Path, opts: &RunOptions) -> Result<SourceBatch> {
        let file_path = if opts.download {
            download(data_dir).await?
        } else {
            let dir = latest_stage_dir(data_dir, SOURCE_TAG)
                .ok_or_else(|| WelldexError::Config(format!("no staged download for {SOURCE_TAG}")))?;
            dir.join(FILE_NAME)
        };

        parse_and_map(&file_path)
    }
}

async fn download(data_dir: &Path) -> Result<std::path::PathBuf> {
    let dir = stage_dir_today(data_dir, SOURCE_TAG).map_err(WelldexError::Io)?;
    let client = mft_client().map_err(|e| WelldexError::Network(e.to_string()))?;

    let bytes = fetch_file(&client, PORTAL_URL, FOLDER_PATH, FILE_NAME).await?;
    if looks_like_html_error(&bytes) {
        return Err(WelldexError::Integrity(format!("{FILE_NAME} came back as an error page")));
    }

    let out_path = dir.join(FILE_NAME);
    std::fs::write(&out_path, &bytes).map_err(WelldexError::Io)?;
    info!(bytes = bytes.len(), "downloaded LA LDNR extract via GoAnywhere");
    Ok(out_path)
}

fn parse_and_map(path: &Path) -> Result<SourceBatch> {
    let reader = open_pipe_delimited(path)?;
    let headers = reader.headers().map_err(|e| WelldexError::Parse(e.to_string()))?.clone();
    let idx = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let serial_idx = idx("well_serial_number").ok_or_else(|| WelldexError::Parse("missing well_serial_number column".into()))?;
    let name_idx = idx("well_name");
    let operator_idx = idx("operator_name");
    let parish_idx = idx("parish_code");
    let status_idx = idx("status");
    let type_idx = idx("type_code");
    let spud_idx = idx("spud_date");
    let lat_idx = idx("latitude");
    let lon_idx = idx("longitude");

    let mut rows = PipeDelimitedRows::new(reader);
    let mut batch = SourceBatch {
        source_url: format!("{PORTAL_URL}{FOLDER_PATH}/{FILE_NAME}"),
        ..Default::default()
    };
    let mut seen_operators = std::collections::HashMap::new();
    let now = Utc::now();

    for record in &mut rows {
        let field = |i: Option<usize>| i.and_then(|i| record.get(i)).unwrap_or("").trim();

        let serial = field(Some(serial_idx));
        if serial.is_empty() {
            batch.parse_errors += 1;
            continue;
        }

        let op_name_raw = field(operator_idx);
        let op_id = if op_name_raw.is_empty() {
            None
        } else {
            let op_name = welldex_common::canonicalize_display_name(op_name_raw);
            let norm = welldex_common::normalize_for_matching(op_name_raw);
            let id = operator_id(SOURCE_TAG, None, &norm);
            seen_operators.entry(id.clone()).or_insert_with(|| Operator {
                id: id.clone(),
                legal_name: op_name,
                aliases: vec![op_name_raw.to_string()],
                hq_state: Some("LA".to_string()),
                hq_city: None,
                active_asset_count: 0,
                compliance_flags: vec![],
                risk_score: None,
                created_at: now,
                updated_at: now,
            });
            Some(id)
        };

        let parish_code = field(parish_idx);
        let county = if parish_code.is_empty() {
            None
        } else {
            Some(county_name(COUNTIES, parish_code))
        };
        let basin = county.as_deref().and_then(|c| basin_for_county(BASINS, c));
        let asset_type = map_type(field(type_idx));

        let asset = Asset {
            id: asset_id(SOURCE_TAG, None, serial),
            asset_type,
            name: field(name_idx).to_string(),
            state: "LA".to_string(),
            county,
            latitude: field(lat_idx).parse().unwrap_or(0.0),
            longitude: field(lon_idx).parse().unwrap_or(0.0),
            basin,
            operator_id: op_id,
            status: map_status(field(status_idx)),
            spud_date: parse_flexible_date(field(spud_idx)),
            depth_ft: None,
            commodity: if asset_type == AssetType::Gas { "natural gas" } else { "crude oil" }.to_string(),
            decline_rate: None,
            estimated_remaining_life_months: None,
            created_at: now,
            updated_at: now,
        };
        batch.assets.insert(asset.id.clone(), asset);
    }

    batch.parse_errors += rows.error_count;
    batch.operators = seen_operators.into_values().collect();
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn la_ldnr_has_no_api_number_so_uses_content_addressed_id() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("extract.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "well_serial_number|well_name|operator_name|parish_code|status|type_code|spud_date|latitude|longitude").unwrap();
        writeln!(f, "970123|Boudreaux 1|Chesapeake Louisiana LP|017|ACTIVE|GAS|20150304|32.5|-93.7").unwrap();
        drop(f);

        let batch = parse_and_map(&path).unwrap();
        assert_eq!(batch.assets.len(), 1);
        let asset = batch.assets.values().next().unwrap();
        assert!(asset.id.starts_with("la_ldnr_"));
        assert!(!asset.id.contains("970123"));
        assert_eq!(asset.basin.as_deref(), Some("Haynesville"));
    }
}
