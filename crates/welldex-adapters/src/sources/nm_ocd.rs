//! New Mexico Oil Conservation Division: JWT-authenticated JSON API
//! (spec.md §4.2, §6). Credentials come from `NM_OCD_API_EMAIL` /
//! `NM_OCD_API_PASSWORD`.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use welldex_common::{
    asset_id, basin_for_county, county_name, operator_id, parse_flexible_date, Config, Result, WelldexError,
};
use welldex_schema::{Asset, AssetStatus, AssetType, Operator};

use crate::http::fetch_json_pages_with_auth;
use crate::traits::{RunOptions, SourceAdapter, SourceBatch};

const SOURCE_TAG: &str = "nm_ocd";
const LOGIN_URL: &str = "https://ocdapi.emnrd.nm.gov/auth/login";
const LIST_URL: &str = "https://ocdapi.emnrd.nm.gov/wells";
const PAGE_SIZE: u32 = 500;

const COUNTIES: &[(&str, &str)] = &[
    ("025", "Eddy"),
    ("041", "Lea"),
    ("005", "Chaves"),
];

const BASINS: &[(&str, &str)] = &[
    ("Eddy", "Permian"),
    ("Lea", "Permian"),
    ("Chaves", "Permian"),
];

fn map_status(raw: &str) -> AssetStatus {
    match raw.trim().to_uppercase().as_str() {
        "A" | "ACTIVE" | "PERMITTED" | "DRILLING" | "INJECTING" => AssetStatus::Active,
        "SI" | "TA" | "SHUT-IN" => AssetStatus::ShutIn,
        _ => AssetStatus::Inactive,
    }
}

fn map_type(raw: &str) -> AssetType {
    match raw.trim().to_uppercase().as_str() {
        "GAS" | "CBM" | "CONDENSATE" => AssetType::Gas,
        _ => AssetType::Oil,
    }
}

#[derive(Debug, Deserialize)]
struct NmWellRecord {
    #[serde(alias = "apiNumber", alias = "api_number")]
    api_number: Option<String>,
    #[serde(alias = "wellName", alias = "well_name")]
    well_name: Option<String>,
    #[serde(alias = "operatorName", alias = "operator_name")]
    operator_name: Option<String>,
    #[serde(alias = "operatorId", alias = "operator_id")]
    operator_number: Option<String>,
    #[serde(alias = "countyCode", alias = "county_code")]
    county_code: Option<String>,
    #[serde(alias = "wellStatus", alias = "well_status")]
    well_status: Option<String>,
    #[serde(alias = "wellType", alias = "well_type")]
    well_type: Option<String>,
    #[serde(alias = "spudDate", alias = "spud_date")]
    spud_date: Option<String>,
    #[serde(alias = "totalDepth", alias = "depth_ft")]
    depth_ft: Option<f64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

pub struct NmOcdAdapter;

impl NmOcdAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NmOcdAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for NmOcdAdapter {
    fn source_tag(&self) -> &'static str {
        SOURCE_TAG
    }

    async fn run(&self, _data_dir: &Path, _opts: &RunOptions) -> Result<SourceBatch> {
        let (email, password) = Config::source_credentials(SOURCE_TAG);
        let email = email.ok_or_else(|| WelldexError::Config(format!("{SOURCE_TAG}: missing API email")))?;
        let password =
            password.ok_or_else(|| WelldexError::Config(format!("{SOURCE_TAG}: missing API password")))?;

        let client = reqwest::Client::new();
        let raw_pages = fetch_json_pages_with_auth(&client, LIST_URL, LOGIN_URL, &email, &password, PAGE_SIZE).await?;

        let mut records = Vec::with_capacity(raw_pages.len());
        let mut parse_errors = 0u64;
        for value in raw_pages {
            match serde_json::from_value::<NmWellRecord>(value) {
                Ok(r) => records.push(r),
                Err(_) => parse_errors += 1,
            }
        }

        let mut batch = map_records(records);
        batch.parse_errors += parse_errors;
        Ok(batch)
    }
}

fn map_records(records: Vec<NmWellRecord>) -> SourceBatch {
    let mut batch = SourceBatch {
        source_url: LIST_URL.to_string(),
        ..Default::default()
    };
    let mut seen_operators = std::collections::HashMap::new();
    let now = Utc::now();

    for rec in records {
        let Some(api) = rec.api_number.filter(|s| !s.trim().is_empty()) else {
            batch.parse_errors += 1;
            continue;
        };

        let op_id = rec.operator_name.as_deref().filter(|s| !s.is_empty()).map(|op_name_raw| {
            let op_name = welldex_common::canonicalize_display_name(op_name_raw);
            let norm = welldex_common::normalize_for_matching(op_name_raw);
            let id = operator_id(SOURCE_TAG, rec.operator_number.as_deref().filter(|s| !s.is_empty()), &norm);
            seen_operators.entry(id.clone()).or_insert_with(|| Operator {
                id: id.clone(),
                legal_name: op_name,
                aliases: vec![op_name_raw.to_string()],
                hq_state: Some("NM".to_string()),
                hq_city: None,
                active_asset_count: 0,
                compliance_flags: vec![],
                risk_score: None,
                created_at: now,
                updated_at: now,
            });
            id
        });

        let county = rec
            .county_code
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|code| county_name(COUNTIES, code));
        let basin = county.as_deref().and_then(|c| basin_for_county(BASINS, c));
        let asset_type = map_type(rec.well_type.as_deref().unwrap_or(""));

        let asset = Asset {
            id: asset_id(SOURCE_TAG, Some(&api), &api),
            asset_type,
            name: rec.well_name.unwrap_or_default(),
            state: "NM".to_string(),
            county,
            latitude: rec.latitude.unwrap_or(0.0),
            longitude: rec.longitude.unwrap_or(0.0),
            basin,
            operator_id: op_id,
            status: map_status(rec.well_status.as_deref().unwrap_or("")),
            spud_date: rec.spud_date.as_deref().and_then(parse_flexible_date),
            depth_ft: rec.depth_ft,
            commodity: if asset_type == AssetType::Gas { "natural gas" } else { "crude oil" }.to_string(),
            decline_rate: None,
            estimated_remaining_life_months: None,
            created_at: now,
            updated_at: now,
        };
        batch.assets.insert(asset.id.clone(), asset);
    }

    batch.operators = seen_operators.into_values().collect();
    warn!(assets = batch.assets.len(), "NM OCD map complete");
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_alternate_field_spellings() {
        let json = serde_json::json!({
            "api_number": "30-015-12345",
            "operator_name": "OXY USA INC",
            "operatorId": "99",
            "county_code": "025",
            "wellType": "GAS",
            "well_status": "ACTIVE",
            "well_name": "State Com 1",
            "latitude": 32.4,
            "longitude": -104.2,
        });
        let rec: NmWellRecord = serde_json::from_value(json).unwrap();
        let batch = map_records(vec![rec]);
        assert_eq!(batch.assets.len(), 1);
        let asset = batch.assets.values().next().unwrap();
        assert_eq!(asset.asset_type, AssetType::Gas);
        assert_eq!(asset.basin.as_deref(), Some("Permian"));
    }

    #[test]
    fn missing_api_number_is_a_parse_error() {
        let rec = NmWellRecord {
            api_number: None,
            well_name: Some("No API".into()),
            operator_name: None,
            operator_number: None,
            county_code: None,
            well_status: None,
            well_type: None,
            spud_date: None,
            depth_ft: None,
            latitude: None,
            longitude: None,
        };
        let batch = map_records(vec![rec]);
        assert_eq!(batch.parse_errors, 1);
        assert_eq!(batch.assets.len(), 0);
    }
}
