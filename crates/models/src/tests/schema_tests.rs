use anyhow::Result;
use chrono::Utc;
use sea_orm::{EntityTrait, ModelTrait, ColumnTrait, QueryFilter, Set};
use uuid::Uuid;

use super::{insert_user, setup_test_db};
use crate::errors::ModelError;
use crate::{role, tenant, user, user_login, user_role, TenantId, TenantScoped};

fn login(tenant_id: Uuid, user_id: Uuid, provider: &str, key: &str) -> user_login::ActiveModel {
    user_login::ActiveModel {
        tenant_id: Set(tenant_id),
        login_provider: Set(provider.to_string()),
        provider_key: Set(key.to_string()),
        user_id: Set(user_id),
        created_at: Set(Utc::now().into()),
    }
}

#[tokio::test]
async fn duplicate_login_key_is_rejected() -> Result<()> {
    let db = setup_test_db().await?;
    let t = tenant::create(&db, "t1").await?;
    let alice = insert_user(&db, t.id, "alice").await?;

    user_login::Entity::insert(login(t.id, alice.id, "google", "g123"))
        .exec_without_returning(&db)
        .await?;
    let second = user_login::Entity::insert(login(t.id, alice.id, "google", "g123"))
        .exec_without_returning(&db)
        .await
        .map_err(ModelError::from);
    assert!(matches!(second, Err(ModelError::Conflict(_))), "got {second:?}");
    Ok(())
}

#[tokio::test]
async fn same_provider_key_may_exist_in_two_tenants() -> Result<()> {
    let db = setup_test_db().await?;
    let t1 = tenant::create(&db, "t1").await?;
    let t2 = tenant::create(&db, "t2").await?;
    let a1 = insert_user(&db, t1.id, "alice").await?;
    let a2 = insert_user(&db, t2.id, "alice").await?;

    user_login::Entity::insert(login(t1.id, a1.id, "google", "g123")).exec_without_returning(&db).await?;
    user_login::Entity::insert(login(t2.id, a2.id, "google", "g123")).exec_without_returning(&db).await?;

    let in_t1 = user_login::Entity::find()
        .filter(user_login::Column::TenantId.eq(t1.tenant_id()))
        .all(&db)
        .await?;
    assert_eq!(in_t1.len(), 1);
    assert_eq!(in_t1[0].user_id, a1.id);
    assert_eq!(in_t1[0].tenant_id(), TenantId::new(t1.id));
    Ok(())
}

#[tokio::test]
async fn user_name_is_unique_per_tenant_only() -> Result<()> {
    let db = setup_test_db().await?;
    let t1 = tenant::create(&db, "t1").await?;
    let t2 = tenant::create(&db, "t2").await?;

    insert_user(&db, t1.id, "bob").await?;
    insert_user(&db, t2.id, "bob").await?;
    let dup = insert_user(&db, t1.id, "bob").await;
    let err = dup.expect_err("second bob in t1 must fail");
    let model_err = err.downcast::<sea_orm::DbErr>().map(ModelError::from)?;
    assert!(matches!(model_err, ModelError::Conflict(_)));
    Ok(())
}

#[tokio::test]
async fn deleting_user_cascades_to_logins_and_roles() -> Result<()> {
    let db = setup_test_db().await?;
    let t = tenant::create(&db, "t1").await?;
    let carol = insert_user(&db, t.id, "carol").await?;
    let admin = role::create(&db, "admin").await?;

    user_login::Entity::insert(login(t.id, carol.id, "github", "c1")).exec_without_returning(&db).await?;
    user_role::Entity::insert(user_role::ActiveModel { user_id: Set(carol.id), role_id: Set(admin.id) })
        .exec_without_returning(&db)
        .await?;

    let roles = carol.find_related(role::Entity).all(&db).await?;
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].name, "admin");

    user::Entity::delete_by_id(carol.id).exec(&db).await?;
    assert!(user_login::Entity::find().all(&db).await?.is_empty());
    assert!(user_role::Entity::find().all(&db).await?.is_empty());
    assert!(role::find_by_name(&db, "admin").await?.is_some());
    Ok(())
}

#[tokio::test]
async fn login_for_unknown_tenant_violates_foreign_key() -> Result<()> {
    let db = setup_test_db().await?;
    let t = tenant::create(&db, "t1").await?;
    let dave = insert_user(&db, t.id, "dave").await?;

    let res = user_login::Entity::insert(login(Uuid::new_v4(), dave.id, "google", "d1"))
        .exec_without_returning(&db)
        .await
        .map_err(ModelError::from);
    assert!(matches!(res, Err(ModelError::Validation(_))), "got {res:?}");
    Ok(())
}

#[test]
fn tenant_name_validation() {
    assert!(tenant::validate_name("acme").is_ok());
    assert!(tenant::validate_name("   ").is_err());
    assert!(tenant::validate_name(&"x".repeat(129)).is_err());
}
