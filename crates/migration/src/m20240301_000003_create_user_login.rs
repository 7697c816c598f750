//! Create `user_login` table.
//!
//! An external login is keyed by (tenant_id, login_provider, provider_key, user_id):
//! the same provider key may be bound in several tenants, never twice for the
//! same user inside one tenant.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserLogin::Table)
                    .if_not_exists()
                    .col(uuid(UserLogin::TenantId))
                    .col(string_len(UserLogin::LoginProvider, 128))
                    .col(string_len(UserLogin::ProviderKey, 128))
                    .col(uuid(UserLogin::UserId))
                    .col(timestamp_with_time_zone(UserLogin::CreatedAt))
                    .primary_key(
                        Index::create()
                            .name("pk_user_login")
                            .col(UserLogin::TenantId)
                            .col(UserLogin::LoginProvider)
                            .col(UserLogin::ProviderKey)
                            .col(UserLogin::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_login_user")
                            .from(UserLogin::Table, UserLogin::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_login_tenant")
                            .from(UserLogin::Table, UserLogin::TenantId)
                            .to(Tenant::Table, Tenant::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(UserLogin::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum UserLogin { Table, TenantId, LoginProvider, ProviderKey, UserId, CreatedAt }

#[derive(DeriveIden)]
enum User { Table, Id }

#[derive(DeriveIden)]
enum Tenant { Table, Id }
