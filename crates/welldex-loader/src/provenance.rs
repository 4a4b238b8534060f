//! Provenance row: written once per source run, success or failure alike
//! (spec.md §4.3, §6). `write` participates in the caller's transaction so
//! it commits or rolls back with everything else; `write_outside_transaction`
//! covers the case where the transaction itself never opened.

use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use welldex_common::{Result, WelldexError};
use welldex_schema::ProvenanceStatus;

pub(crate) async fn write(
    tx: &mut Transaction<'_, Postgres>,
    source_name: &str,
    source_url: &str,
    record_count: i64,
    status: ProvenanceStatus,
    notes: &str,
) -> Result<Uuid> {
    let row = sqlx::query(
        "INSERT INTO data_provenance (source_name, source_url, record_count, status, notes) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(source_name)
    .bind(source_url)
    .bind(record_count)
    .bind(status.to_string())
    .bind(notes)
    .fetch_one(&mut **tx)
    .await
    .map_err(db_err)?;

    Ok(row.get::<Uuid, _>("id"))
}

pub(crate) async fn write_outside_transaction(
    pool: &PgPool,
    source_name: &str,
    source_url: &str,
    record_count: i64,
    status: ProvenanceStatus,
    notes: &str,
) -> Result<Uuid> {
    let row = sqlx::query(
        "INSERT INTO data_provenance (source_name, source_url, record_count, status, notes) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(source_name)
    .bind(source_url)
    .bind(record_count)
    .bind(status.to_string())
    .bind(notes)
    .fetch_one(pool)
    .await
    .map_err(db_err)?;

    Ok(row.get::<Uuid, _>("id"))
}

fn db_err(e: sqlx::Error) -> WelldexError {
    WelldexError::Database(e.to_string())
}
