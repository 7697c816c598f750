//! Create `user_claim` table with FK to `user`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserClaim::Table)
                    .if_not_exists()
                    .col(uuid(UserClaim::Id).primary_key())
                    .col(uuid(UserClaim::UserId))
                    .col(string_len(UserClaim::ClaimType, 256))
                    .col(text_null(UserClaim::ClaimValue))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_claim_user")
                            .from(UserClaim::Table, UserClaim::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(UserClaim::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum UserClaim { Table, Id, UserId, ClaimType, ClaimValue }

#[derive(DeriveIden)]
enum User { Table, Id }
