
/// Composite keys, per-tenant uniqueness and cascades
pub mod schema_tests;

use anyhow::Result;
use chrono::Utc;
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use uuid::Uuid;

use crate::db::{connect_with_config, DatabaseConfig};
use crate::user;

/// Fresh in-memory database with the schema applied. One pooled connection
/// keeps the in-memory database alive for the whole test.
pub(crate) async fn setup_test_db() -> Result<DatabaseConnection> {
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

pub(crate) async fn insert_user(db: &DatabaseConnection, tenant_id: Uuid, user_name: &str) -> Result<user::Model> {
    let now = Utc::now();
    let am = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        user_name: Set(user_name.to_string()),
        email: Set(Some(format!("{user_name}@example.com"))),
        email_confirmed: Set(false),
        security_stamp: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    Ok(am.insert(db).await?)
}
