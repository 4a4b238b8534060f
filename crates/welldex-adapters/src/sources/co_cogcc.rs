//! Colorado Oil & Gas Conservation Commission: ASP.NET WebForms search page,
//! scraped via hidden-field postback replay (spec.md §4.2). The landing page
//! is GETed once per county, then replayed as a form POST carrying the
//! scraped `__VIEWSTATE`/`__EVENTVALIDATION` plus the county query param.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use reqwest::Client;
use tracing::warn;

use welldex_common::{
    asset_id, basin_for_county, operator_id, parse_flexible_date, Result, WelldexError,
};
use welldex_schema::{Asset, AssetStatus, AssetType, Operator};

use crate::http::looks_like_html_error;
use crate::traits::{RunOptions, SourceAdapter, SourceBatch};
use crate::viewstate::{build_postback_form, extract_viewstate};

const SOURCE_TAG: &str = "co_cogcc";
const SEARCH_URL: &str = "https://cogcc.state.co.us/cogis/WellSearch.asp";

/// Counties queried one at a time; the portal's search results are paged
/// implicitly by county rather than by offset. Politeness delay between
/// counties per spec.md §5 (~2s).
const COUNTIES: &[&str] = &["Weld", "Garfield", "La Plata", "Rio Blanco"];
const COUNTY_POLITENESS_DELAY: Duration = Duration::from_secs(2);

const BASINS: &[(&str, &str)] = &[
    ("Weld", "DJ Basin"),
    ("Garfield", "Piceance"),
    ("Rio Blanco", "Piceance"),
    ("La Plata", "San Juan"),
];

fn map_status(raw: &str) -> AssetStatus {
    match raw.trim().to_uppercase().as_str() {
        "PR" | "DRL" | "AP" | "PRODUCING" | "DRILLING" | "APPROVED PERMIT" => AssetStatus::Active,
        "SI" | "TA" | "SHUT IN" | "TEMP ABANDONED" => AssetStatus::ShutIn,
        _ => AssetStatus::Inactive,
    }
}

fn map_type(raw: &str) -> AssetType {
    match raw.trim().to_uppercase().as_str() {
        "GAS" | "CBM" => AssetType::Gas,
        _ => AssetType::Oil,
    }
}

/// One scraped result row. The search result table's columns are stable
/// but undocumented — scraped positionally via `<td>` cells.
struct ScrapedRow {
    api: String,
    well_name: String,
    operator: String,
    status: String,
    well_type: String,
    spud_date: String,
    latitude: f64,
    longitude: f64,
}

fn row_pattern() -> Regex {
    Regex::new(
        r"(?s)<tr[^>]*class=\x22result-row\x22[^>]*>.*?api=\x22([0-9-]+)\x22.*?<td>([^<]*)</td>\s*<td>([^<]*)</td>\s*<td>([^<]*)</td>\s*<td>([^<]*)</td>\s*<td>([^<]*)</td>\s*<td>([^<]*)</td>\s*<td>([^<]*)</td>",
    )
    .expect("valid regex")
}

fn parse_results(html: &str) -> Vec<ScrapedRow> {
    row_pattern()
        .captures_iter(html)
        .map(|c| ScrapedRow {
            api: c[1].trim().to_string(),
            well_name: c[2].trim().to_string(),
            operator: c[3].trim().to_string(),
            status: c[4].trim().to_string(),
            well_type: c[5].trim().to_string(),
            spud_date: c[6].trim().to_string(),
            latitude: c[7].trim().parse().unwrap_or(0.0),
            longitude: c[8].trim().parse().unwrap_or(0.0),
        })
        .collect()
}

pub struct CoCogccAdapter;

impl CoCogccAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CoCogccAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for CoCogccAdapter {
    fn source_tag(&self) -> &'static str {
        SOURCE_TAG
    }

    async fn run(&self, _data_dir: &Path, opts: &RunOptions) -> Result<SourceBatch> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| WelldexError::Network(e.to_string()))?;

        let mut batch = SourceBatch {
            source_url: SEARCH_URL.to_string(),
            ..Default::default()
        };
        let mut seen_operators = std::collections::HashMap::new();

        for (i, county) in COUNTIES.iter().enumerate() {
            match fetch_county(&client, county, opts).await {
                Ok(rows) => map_rows_into(rows, county, &mut batch, &mut seen_operators),
                Err(e) => {
                    warn!(county, error = %e, "co_cogcc county query failed, skipping");
                    batch.parse_errors += 1;
                }
            }
            if i + 1 < COUNTIES.len() {
                tokio::time::sleep(COUNTY_POLITENESS_DELAY).await;
            }
        }

        batch.operators = seen_operators.into_values().collect();
        Ok(batch)
    }
}

async fn fetch_county(client: &Client, county: &str, opts: &RunOptions) -> Result<Vec<ScrapedRow>> {
    let landing = client
        .get(SEARCH_URL)
        .timeout(Duration::from_secs(30))
        .send()
        .await
        .map_err(|e| WelldexError::Network(e.to_string()))?
        .text()
        .await
        .map_err(|e| WelldexError::Network(e.to_string()))?;

    let fields = extract_viewstate(&landing);
    let form = build_postback_form(&fields, &[("County", county), ("Submit", "Search")]);

    let mut last_err = None;
    for _attempt in 0..opts.retry_attempts {
        let resp = client
            .post(SEARCH_URL)
            .form(&form)
            .timeout(Duration::from_secs(60))
            .send()
            .await;
        match resp {
            Ok(r) if r.status().is_success() => {
                let bytes = r.bytes().await.map_err(|e| WelldexError::Network(e.to_string()))?;
                if looks_like_html_error(&bytes) {
                    return Err(WelldexError::Integrity(format!("{county} search returned an error page")));
                }
                let html = String::from_utf8_lossy(&bytes).into_owned();
                return Ok(parse_results(&html));
            }
            Ok(r) => last_err = Some(format!("status {}", r.status())),
            Err(e) => last_err = Some(e.to_string()),
        }
        tokio::time::sleep(opts.retry_base_delay).await;
    }

    Err(WelldexError::RetriesExhausted {
        url: SEARCH_URL.to_string(),
        attempts: opts.retry_attempts,
        message: last_err.unwrap_or_default(),
    })
}

fn map_rows_into(
    rows: Vec<ScrapedRow>,
    county: &str,
    batch: &mut SourceBatch,
    seen_operators: &mut std::collections::HashMap<String, Operator>,
) {
    let now = Utc::now();
    for row in rows {
        if row.api.is_empty() {
            batch.parse_errors += 1;
            continue;
        }

        let op_id = if row.operator.is_empty() {
            None
        } else {
            let op_name = welldex_common::canonicalize_display_name(&row.operator);
            let norm = welldex_common::normalize_for_matching(&row.operator);
            let id = operator_id(SOURCE_TAG, None, &norm);
            seen_operators.entry(id.clone()).or_insert_with(|| Operator {
                id: id.clone(),
                legal_name: op_name,
                aliases: vec![row.operator.clone()],
                hq_state: Some("CO".to_string()),
                hq_city: None,
                active_asset_count: 0,
                compliance_flags: vec![],
                risk_score: None,
                created_at: now,
                updated_at: now,
            });
            Some(id)
        };

        let basin = basin_for_county(BASINS, county);
        let asset_type = map_type(&row.well_type);

        let asset = Asset {
            id: asset_id(SOURCE_TAG, Some(&row.api), &row.api),
            asset_type,
            name: row.well_name,
            state: "CO".to_string(),
            county: Some(county.to_string()),
            latitude: row.latitude,
            longitude: row.longitude,
            basin,
            operator_id: op_id,
            status: map_status(&row.status),
            spud_date: parse_flexible_date(&row.spud_date),
            depth_ft: None,
            commodity: if asset_type == AssetType::Gas { "natural gas" } else { "crude oil" }.to_string(),
            decline_rate: None,
            estimated_remaining_life_months: None,
            created_at: now,
            updated_at: now,
        };
        batch.assets.insert(asset.id.clone(), asset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <tr class="result-row" api="05-123-12345">
            <td>Jones 1-H</td><td>OXY USA INC</td><td>PRODUCING</td><td>GAS</td><td>06/01/2018</td><td>40.1</td><td>-104.7</td>
        </tr>
    "#;

    #[test]
    fn scrapes_a_result_row() {
        let rows = parse_results(SAMPLE);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].api, "05-123-12345");
        assert_eq!(rows[0].operator, "OXY USA INC");
    }

    #[test]
    fn maps_scraped_rows_into_assets() {
        let rows = parse_results(SAMPLE);
        let mut batch = SourceBatch::default();
        let mut seen = std::collections::HashMap::new();
        map_rows_into(rows, "Weld", &mut batch, &mut seen);

        assert_eq!(batch.assets.len(), 1);
        let asset = batch.assets.values().next().unwrap();
        assert_eq!(asset.basin.as_deref(), Some("DJ Basin"));
        assert_eq!(asset.asset_type, AssetType::Gas);
        assert_eq!(seen.len(), 1);
    }
}
