#![cfg(test)]
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;

use models::db::{connect_with_config, DatabaseConfig};
use models::{tenant, TenantId};

/// Fresh in-memory database with every migration applied.
///
/// SQLite keeps an in-memory database per connection, so the pool is pinned
/// to a single connection for the lifetime of the test.
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    common::utils::logging::init_test_logging();
    let cfg = DatabaseConfig {
        url: "sqlite::memory:".into(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let db = connect_with_config(&cfg).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub async fn seed_tenant(db: &DatabaseConnection, name: &str) -> Result<TenantId, anyhow::Error> {
    Ok(tenant::create(db, name).await?.tenant_id())
}
