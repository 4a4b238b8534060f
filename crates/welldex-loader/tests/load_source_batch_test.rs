//! Integration tests for `load_source_batch`. Requires a Postgres instance.
//! Set DATABASE_TEST_URL or these tests are skipped.

use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Row};

use welldex_adapters::{PendingSpatialProduction, SourceBatch};
use welldex_schema::{Asset, AssetStatus, AssetType, Operator, ProductionRecord, ProvenanceStatus};

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    welldex_schema::migrate(&pool).await.ok()?;
    sqlx::query("TRUNCATE production_records, financial_estimates, data_provenance, assets, operators RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .ok()?;
    Some(pool)
}

fn sample_operator(id: &str) -> Operator {
    Operator {
        id: id.into(),
        legal_name: "Acme Resources".into(),
        aliases: vec![],
        hq_state: Some("TX".into()),
        hq_city: None,
        active_asset_count: 0,
        compliance_flags: vec![],
        risk_score: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn sample_asset(id: &str, operator_id: &str, status: AssetStatus) -> Asset {
    Asset {
        id: id.into(),
        asset_type: AssetType::Oil,
        name: "Smith 1H".into(),
        state: "TX".into(),
        county: Some("Midland".into()),
        latitude: 31.9,
        longitude: -102.0,
        basin: Some("Permian".into()),
        operator_id: Some(operator_id.into()),
        status,
        spud_date: None,
        depth_ft: None,
        commodity: "crude oil".into(),
        decline_rate: None,
        estimated_remaining_life_months: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn same_id_with_differing_status_upserts_rather_than_duplicates() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let op = sample_operator("tx_rrc_OP_1");
    let asset_id = "tx_rrc_00001234560000";

    let mut batch1 = SourceBatch {
        source_url: "https://example.test/batch1".into(),
        ..Default::default()
    };
    batch1.operators.push(op.clone());
    batch1
        .assets
        .insert(asset_id.into(), sample_asset(asset_id, &op.id, AssetStatus::Active));

    let result1 = welldex_loader::load_source_batch(&pool, "tx_rrc", batch1).await.unwrap();
    assert_eq!(result1.status, ProvenanceStatus::Success);
    assert_eq!(result1.assets_upserted, 1);

    let mut batch2 = SourceBatch {
        source_url: "https://example.test/batch2".into(),
        ..Default::default()
    };
    batch2.operators.push(op.clone());
    batch2
        .assets
        .insert(asset_id.into(), sample_asset(asset_id, &op.id, AssetStatus::ShutIn));

    let result2 = welldex_loader::load_source_batch(&pool, "tx_rrc", batch2).await.unwrap();
    assert_eq!(result2.status, ProvenanceStatus::Success);

    let row = sqlx::query("SELECT status FROM assets WHERE id = $1")
        .bind(asset_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    let status: String = row.get("status");
    assert_eq!(status, "shut_in");

    let count: i64 = sqlx::query("SELECT count(*) AS c FROM assets WHERE id = $1")
        .bind(asset_id)
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("c");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn dangling_production_row_leaves_operators_and_assets_committed_with_partial_status() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let op = sample_operator("tx_rrc_OP_2");
    let asset_id = "tx_rrc_00009876540000";

    let mut batch = SourceBatch {
        source_url: "https://example.test/batch".into(),
        ..Default::default()
    };
    batch.operators.push(op.clone());
    batch
        .assets
        .insert(asset_id.into(), sample_asset(asset_id, &op.id, AssetStatus::Active));
    batch.productions.push(ProductionRecord {
        asset_id: "tx_rrc_does_not_exist".into(),
        month: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        oil_volume_bbl: Some(100.0),
        gas_volume_mcf: None,
        ore_volume_tons: None,
        water_cut_pct: None,
        downtime_days: None,
    });

    let result = welldex_loader::load_source_batch(&pool, "tx_rrc", batch).await.unwrap();

    assert_eq!(result.status, ProvenanceStatus::Partial);
    assert_eq!(result.assets_upserted, 1);
    assert_eq!(result.operators_upserted, 1);
    assert_eq!(result.production_inserted, 0);
    assert!(!result.errors.is_empty());

    let asset_count: i64 = sqlx::query("SELECT count(*) AS c FROM assets WHERE id = $1")
        .bind(asset_id)
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("c");
    assert_eq!(asset_count, 1);

    let provenance_row = sqlx::query("SELECT status FROM data_provenance WHERE id = $1")
        .bind(result.provenance_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    let status: String = provenance_row.get("status");
    assert_eq!(status, "partial");
}

#[tokio::test]
async fn every_run_writes_a_provenance_row_even_when_the_batch_is_empty() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let batch = SourceBatch {
        source_url: "https://example.test/empty".into(),
        ..Default::default()
    };
    let result = welldex_loader::load_source_batch(&pool, "ok_occ", batch).await.unwrap();

    let row = sqlx::query("SELECT source_name FROM data_provenance WHERE id = $1")
        .bind(result.provenance_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    let source_name: String = row.get("source_name");
    assert_eq!(source_name, "ok_occ");
}

#[tokio::test]
async fn spatial_join_resolves_nearest_asset_within_precision_window() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let op = sample_operator("nd_ndic_OP_1");
    let asset_id = "nd_ndic_00001111110000";

    let mut setup = SourceBatch {
        source_url: "https://example.test/setup".into(),
        ..Default::default()
    };
    setup.operators.push(op.clone());
    let mut asset = sample_asset(asset_id, &op.id, AssetStatus::Active);
    asset.latitude = 47.5;
    asset.longitude = -103.2;
    setup.assets.insert(asset_id.into(), asset);
    welldex_loader::load_source_batch(&pool, "nd_ndic", setup).await.unwrap();

    let mut prod_batch = SourceBatch {
        source_url: "https://example.test/prod".into(),
        ..Default::default()
    };
    prod_batch.pending_productions.push(PendingSpatialProduction {
        latitude: 47.5001,
        longitude: -103.2001,
        precision_degrees: 0.01,
        month: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        oil_volume_bbl: Some(42.0),
        gas_volume_mcf: None,
        water_cut_pct: None,
        downtime_days: None,
    });

    let result = welldex_loader::load_source_batch(&pool, "nd_ndic", prod_batch).await.unwrap();
    assert_eq!(result.production_inserted, 1);

    let row = sqlx::query("SELECT oil_volume_bbl FROM production_records WHERE asset_id = $1")
        .bind(asset_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    let oil: Option<f64> = row.get("oil_volume_bbl");
    assert_eq!(oil, Some(42.0));
}
