//! Integration tests for `run_link`. Requires a Postgres instance. Set
//! DATABASE_TEST_URL or these tests are skipped.

use sqlx::{PgPool, Row};

use welldex_linker::run_link;

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

async fn insert_operator(pool: &PgPool, id: &str, legal_name: &str, hq_state: Option<&str>) {
    sqlx::query("INSERT INTO operators (id, legal_name, hq_state, created_at, updated_at) VALUES ($1, $2, $3, now(), now())")
        .bind(id)
        .bind(legal_name)
        .bind(hq_state)
        .execute(pool)
        .await
        .unwrap();
}

async fn insert_unlinked_asset(pool: &PgPool, id: &str, name: &str, state: &str) {
    sqlx::query(
        "INSERT INTO assets (id, asset_type, name, state, operator_id, status, commodity, created_at, updated_at) \
         VALUES ($1, 'oil', $2, $3, NULL, 'active', 'crude oil', now(), now())",
    )
    .bind(id)
    .bind(name)
    .bind(state)
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
async fn links_asset_by_matching_a_hyphen_separated_name_segment() {
    let Some(pool) = test_pool().await else {
        return;
    };

    insert_operator(&pool, "tx_rrc_OP_1", "OXY USA", Some("TX")).await;
    insert_unlinked_asset(&pool, "tx_rrc_well_1", "OXY USA - ANDREWS UNIT #12H", "TX").await;

    let result = run_link(&pool).await.unwrap();
    assert_eq!(result.assets_linked, 1);
    assert_eq!(result.cross_state_events, 0);

    let operator_id: String = sqlx::query("SELECT operator_id FROM assets WHERE id = 'tx_rrc_well_1'")
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("operator_id");
    assert_eq!(operator_id, "tx_rrc_OP_1");
}

#[tokio::test]
async fn linking_to_an_out_of_state_operator_counts_as_a_cross_state_event() {
    let Some(pool) = test_pool().await else {
        return;
    };

    insert_operator(&pool, "ok_occ_OP_1", "Continental Resources", Some("OK")).await;
    insert_unlinked_asset(&pool, "tx_rrc_well_2", "Continental Resources - Smith 4H", "TX").await;

    let result = run_link(&pool).await.unwrap();
    assert_eq!(result.assets_linked, 1);
    assert_eq!(result.cross_state_events, 1);
}

#[tokio::test]
async fn only_unlinked_assets_are_touched() {
    let Some(pool) = test_pool().await else {
        return;
    };

    insert_operator(&pool, "la_ldnr_OP_1", "Denbury Onshore", Some("LA")).await;
    insert_operator(&pool, "la_ldnr_OP_2", "Other Operator", Some("LA")).await;
    sqlx::query(
        "INSERT INTO assets (id, asset_type, name, state, operator_id, status, commodity, created_at, updated_at) \
         VALUES ('la_ldnr_well_1', 'oil', 'Denbury Onshore - Tinsley 2', 'LA', 'la_ldnr_OP_2', 'active', 'crude oil', now(), now())",
    )
    .execute(&pool)
    .await
    .unwrap();

    let result = run_link(&pool).await.unwrap();
    assert_eq!(result.assets_linked, 0);

    let operator_id: String = sqlx::query("SELECT operator_id FROM assets WHERE id = 'la_ldnr_well_1'")
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("operator_id");
    assert_eq!(operator_id, "la_ldnr_OP_2");
}

#[tokio::test]
async fn asset_with_no_matching_segment_stays_unlinked() {
    let Some(pool) = test_pool().await else {
        return;
    };

    insert_operator(&pool, "co_cogcc_OP_1", "Kerr-McGee", Some("CO")).await;
    insert_unlinked_asset(&pool, "co_cogcc_well_1", "Unrelated Operator - Federal 7", "CO").await;

    let result = run_link(&pool).await.unwrap();
    assert_eq!(result.assets_linked, 0);

    let operator_id: Option<String> = sqlx::query("SELECT operator_id FROM assets WHERE id = 'co_cogcc_well_1'")
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("operator_id");
    assert!(operator_id.is_none());
}
