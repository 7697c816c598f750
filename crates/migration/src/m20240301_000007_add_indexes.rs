use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Users: one user name per tenant
        manager
            .create_index(
                Index::create()
                    .name("uniq_user_tenant_user_name")
                    .table(User::Table)
                    .col(User::TenantId)
                    .col(User::UserName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Users: email lookups always carry the tenant
        manager
            .create_index(
                Index::create()
                    .name("idx_user_tenant_email")
                    .table(User::Table)
                    .col(User::TenantId)
                    .col(User::Email)
                    .to_owned(),
            )
            .await?;

        // UserLogin: aggregate loads by user
        manager
            .create_index(
                Index::create()
                    .name("idx_user_login_user")
                    .table(UserLogin::Table)
                    .col(UserLogin::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_claim_user")
                    .table(UserClaim::Table)
                    .col(UserClaim::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("uniq_user_tenant_user_name").table(User::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_user_tenant_email").table(User::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_user_login_user").table(UserLogin::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_user_claim_user").table(UserClaim::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum User { Table, TenantId, UserName, Email }

#[derive(DeriveIden)]
enum UserLogin { Table, UserId }

#[derive(DeriveIden)]
enum UserClaim { Table, UserId }
