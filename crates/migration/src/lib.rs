//! Migrator for the tenant-scoped identity schema.
//! Tables are created parent-first; secondary indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_tenant;
mod m20240301_000002_create_user;
mod m20240301_000003_create_user_login;
mod m20240301_000004_create_role;
mod m20240301_000005_create_user_role;
mod m20240301_000006_create_user_claim;
mod m20240301_000007_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_tenant::Migration),
            Box::new(m20240301_000002_create_user::Migration),
            Box::new(m20240301_000003_create_user_login::Migration),
            Box::new(m20240301_000004_create_role::Migration),
            Box::new(m20240301_000005_create_user_role::Migration),
            Box::new(m20240301_000006_create_user_claim::Migration),
            // Indexes should always be applied last
            Box::new(m20240301_000007_add_indexes::Migration),
        ]
    }
}
