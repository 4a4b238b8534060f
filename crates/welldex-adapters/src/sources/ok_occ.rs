//! Oklahoma Corporation Commission: ArcGIS FeatureServer. Every field name
//! is matched case-insensitively since the service's schema drifts between
//! layers (spec.md §4.2).

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::warn;

use welldex_common::{
    asset_id, basin_for_county, county_name, operator_id, parse_flexible_date, Result, WelldexError,
};
use welldex_schema::{Asset, AssetStatus, AssetType, Operator};

use crate::http::fetch_arcgis_pages;
use crate::traits::{RunOptions, SourceAdapter, SourceBatch};

const SOURCE_TAG: &str = "ok_occ";
const QUERY_URL: &str =
    "https://gisdata.occ.ok.gov/arcgis/rest/services/OilGas/Wells/FeatureServer/0/query";
const PAGE_SIZE: u32 = 2000;

const COUNTIES: &[(&str, &str)] = &[
    ("011", "Blaine"),
    ("017", "Caddo"),
    ("039", "Custer"),
    ("059", "Grady"),
    ("071", "Kingfisher"),
    ("105", "Major"),
    ("149", "Roger Mills"),
];

const BASINS: &[(&str, &str)] = &[
    ("Blaine", "Anadarko"),
    ("Caddo", "Anadarko"),
    ("Custer", "Anadarko"),
    ("Grady", "Anadarko"),
    ("Kingfisher", "Anadarko"),
    ("Major", "Anadarko"),
    ("Roger Mills", "Anadarko"),
];

fn map_status(raw: &str) -> AssetStatus {
    match raw.trim().to_uppercase().as_str() {
        "AC" | "DR" | "PR" | "PERMITTED" | "PRODUCING" | "DRILLING" => AssetStatus::Active,
        "SI" | "TA" | "SHUT-IN" | "TEMP ABANDONED" => AssetStatus::ShutIn,
        _ => AssetStatus::Inactive,
    }
}

fn map_type(raw: &str) -> AssetType {
    match raw.trim().to_uppercase().as_str() {
        "GAS" | "GAS WELL" | "CBM" => AssetType::Gas,
        _ => AssetType::Oil,
    }
}

/// Look up a JSON attribute by name, case-insensitively — ArcGIS layers
/// spell the same field differently across services.
fn attr<'a>(attrs: &'a Value, names: &[&str]) -> Option<&'a Value> {
    let obj = attrs.as_object()?;
    for name in names {
        if let Some(v) = obj.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v) {
            if !v.is_null() {
                return Some(v);
            }
        }
    }
    None
}

fn attr_str(attrs: &Value, names: &[&str]) -> String {
    attr(attrs, names)
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default()
}

fn attr_f64(attrs: &Value, names: &[&str]) -> f64 {
    attr(attrs, names).and_then(|v| v.as_f64()).unwrap_or(0.0)
}

pub struct OkOccAdapter;

impl OkOccAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OkOccAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for OkOccAdapter {
    fn source_tag(&self) -> &'static str {
        SOURCE_TAG
    }

    async fn run(&self, _data_dir: &Path, opts: &RunOptions) -> Result<SourceBatch> {
        let client = reqwest::Client::new();
        let features = fetch_arcgis_pages(
            &client,
            QUERY_URL,
            "1=1",
            "*",
            "API_NUMBER",
            PAGE_SIZE,
            opts.retry_attempts,
            opts.retry_base_delay,
        )
        .await?;

        Ok(map_features(features))
    }
}

fn map_features(features: Vec<Value>) -> SourceBatch {
    let mut batch = SourceBatch {
        source_url: QUERY_URL.to_string(),
        ..Default::default()
    };
    let mut seen_operators = std::collections::HashMap::new();
    let now = Utc::now();

    for feature in features {
        let Some(attrs) = feature.get("attributes") else {
            batch.parse_errors += 1;
            continue;
        };

        let api = attr_str(attrs, &["API_NUMBER", "ApiNumber", "api_no"]);
        if api.is_empty() {
            batch.parse_errors += 1;
            continue;
        }

        let op_name_raw = attr_str(attrs, &["OPERATOR", "OperatorName", "OPER_NAME"]);
        let op_number = attr_str(attrs, &["OPERATOR_NUMBER", "OperatorNumber"]);
        let op_id = if op_name_raw.is_empty() {
            None
        } else {
            let op_name = welldex_common::canonicalize_display_name(&op_name_raw);
            let norm = welldex_common::normalize_for_matching(&op_name_raw);
            let id = operator_id(SOURCE_TAG, Some(op_number.as_str()).filter(|s| !s.is_empty()), &norm);
            seen_operators.entry(id.clone()).or_insert_with(|| Operator {
                id: id.clone(),
                legal_name: op_name,
                aliases: vec![op_name_raw.clone()],
                hq_state: Some("OK".to_string()),
                hq_city: None,
                active_asset_count: 0,
                compliance_flags: vec![],
                risk_score: None,
                created_at: now,
                updated_at: now,
            });
            Some(id)
        };

        let county_code = attr_str(attrs, &["COUNTY_CODE", "CountyCode"]);
        let county = if county_code.is_empty() {
            None
        } else {
            Some(county_name(COUNTIES, &county_code))
        };
        let basin = county.as_deref().and_then(|c| basin_for_county(BASINS, c));
        let asset_type = map_type(&attr_str(attrs, &["WELL_TYPE", "WellType"]));

        let asset = Asset {
            id: asset_id(SOURCE_TAG, Some(&api), &api),
            asset_type,
            name: attr_str(attrs, &["WELL_NAME", "WellName"]),
            state: "OK".to_string(),
            county,
            latitude: attr_f64(attrs, &["LATITUDE", "Latitude", "LAT"]),
            longitude: attr_f64(attrs, &["LONGITUDE", "Longitude", "LON"]),
            basin,
            operator_id: op_id,
            status: map_status(&attr_str(attrs, &["WELL_STATUS", "WellStatus"])),
            spud_date: parse_flexible_date(&attr_str(attrs, &["SPUD_DATE", "SpudDate"])),
            depth_ft: attr(attrs, &["TOTAL_DEPTH", "TotalDepth"]).and_then(|v| v.as_f64()),
            commodity: if asset_type == AssetType::Gas { "natural gas" } else { "crude oil" }.to_string(),
            decline_rate: None,
            estimated_remaining_life_months: None,
            created_at: now,
            updated_at: now,
        };
        batch.assets.insert(asset.id.clone(), asset);
    }

    batch.operators = seen_operators.into_values().collect();
    warn!(assets = batch.assets.len(), "OK OCC map complete");
    batch
}
