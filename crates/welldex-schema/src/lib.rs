//! The relational schema contract shared by the loader, deduplicator, and
//! linker: canonical entity types, their enum fields, and the embedded SQL
//! migrations that create the tables they're upserted into.

pub mod entities;
pub mod enums;

pub use entities::{Asset, DataProvenance, Operator, ProductionRecord};
pub use enums::{AssetStatus, AssetType, ProvenanceStatus, UnknownVariant};

/// Run the embedded migrations against `pool`. Idempotent — safe to call
/// on every process start, the way `ArchiveStore::migrate` does.
pub async fn migrate(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
