//! Tenant-aware persistence context.
//!
//! Owns the database connection and the identity options, validates entities
//! before they are written, and provides the load/insert/save primitives the
//! store delegates to. The composite login key itself lives in the schema
//! (`user_login` migration and entity).

use std::fmt;

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use crate::domain::IdentityUser;
use crate::errors::StoreError;
use crate::pagination::Pagination;
use models::{role, user, user_claim, user_login, user_role, Identifiable, Loginable, TenantId, TenantScoped};

/// Options controlling validation in [`IdentityContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityOptions {
    /// Newly added users are written without entity validation. Existing
    /// users are always validated on save.
    pub skip_validation_for_new_principals: bool,
    /// Email must be unique inside a tenant (checked case-insensitively).
    pub require_unique_email: bool,
}

impl Default for IdentityOptions {
    fn default() -> Self {
        Self { skip_validation_for_new_principals: true, require_unique_email: false }
    }
}

impl From<&configs::IdentityConfig> for IdentityOptions {
    fn from(cfg: &configs::IdentityConfig) -> Self {
        Self {
            skip_validation_for_new_principals: cfg.skip_validation_for_new_principals,
            require_unique_email: cfg.require_unique_email,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Added,
    Modified,
    Unchanged,
}

/// An entity about to be written, together with its change state.
#[derive(Debug, Clone, Copy)]
pub enum EntityEntry<'a> {
    User { state: EntityState, user: &'a IdentityUser },
    Login { state: EntityState, login: &'a user_login::Model },
}

impl EntityEntry<'_> {
    pub fn state(&self) -> EntityState {
        match self {
            EntityEntry::User { state, .. } | EntityEntry::Login { state, .. } => *state,
        }
    }
}

/// Collected validation messages for one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn single(msg: impl Into<String>) -> Self { Self(vec![msg.into()]) }

    pub fn push(&mut self, msg: impl Into<String>) { self.0.push(msg.into()); }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn messages(&self) -> &[String] { &self.0 }

    fn into_result(self) -> Result<(), StoreError> {
        if self.is_empty() { Ok(()) } else { Err(StoreError::Validation(self)) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("; "))
    }
}

const MAX_USER_NAME: usize = 256;

fn email_is_well_formed(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Field checks that need no database access.
fn check_user_fields(u: &IdentityUser) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    if u.tenant_id().is_unset() {
        errors.push("tenant is not set");
    }
    if u.user_name.trim().is_empty() {
        errors.push("user name is required");
    } else if u.user_name.chars().count() > MAX_USER_NAME {
        errors.push(format!("user name exceeds {MAX_USER_NAME} characters"));
    }
    if let Some(email) = u.email.as_deref() {
        if !email_is_well_formed(email) {
            errors.push(format!("email '{email}' is invalid"));
        }
    }
    errors
}

fn check_login_fields(l: &user_login::Model) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    if l.tenant_id().is_unset() {
        errors.push("login tenant is not set");
    }
    if l.login_provider.trim().is_empty() {
        errors.push("login provider is required");
    }
    if l.provider_key.trim().is_empty() {
        errors.push("provider key is required");
    }
    if l.user_id.is_nil() {
        errors.push("login user key is required");
    }
    errors
}

/// Case-insensitive email predicate. Both sides go through the database's
/// `UPPER`, so stored and supplied values are folded by the same rules.
pub(crate) fn email_matches(email: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::upper(Expr::col((user::Entity, user::Column::Email)))).eq(Func::upper(Expr::val(email)))
}

pub struct IdentityContext {
    db: DatabaseConnection,
    options: IdentityOptions,
}

impl IdentityContext {
    pub fn new(db: DatabaseConnection, options: IdentityOptions) -> Self { Self { db, options } }

    /// Validate an entity about to be written. Unchanged entries pass; a newly
    /// added user passes untouched when `skip_validation_for_new_principals` is on.
    pub async fn validate_entity(&self, entry: EntityEntry<'_>) -> Result<(), StoreError> {
        match entry {
            _ if entry.state() == EntityState::Unchanged => Ok(()),
            EntityEntry::User { state: EntityState::Added, .. } if self.options.skip_validation_for_new_principals => {
                debug!("validation skipped for new principal");
                Ok(())
            }
            EntityEntry::User { user, .. } => self.validate_user(user).await,
            EntityEntry::Login { login, .. } => check_login_fields(login).into_result(),
        }
    }

    async fn validate_user(&self, u: &IdentityUser) -> Result<(), StoreError> {
        let mut errors = check_user_fields(u);
        if !u.user_name.trim().is_empty() && !u.tenant_id().is_unset() {
            let taken = user::Entity::find()
                .filter(user::Column::TenantId.eq(u.tenant_id()))
                .filter(user::Column::UserName.eq(u.user_name.as_str()))
                .filter(user::Column::Id.ne(u.id))
                .count(&self.db)
                .await?;
            if taken > 0 {
                errors.push(format!("user name '{}' is already taken", u.user_name));
            }
        }
        if self.options.require_unique_email {
            match u.email.as_deref() {
                Some(email) => {
                    let taken = user::Entity::find()
                        .filter(user::Column::TenantId.eq(u.tenant_id()))
                        .filter(email_matches(email))
                        .filter(user::Column::Id.ne(u.id))
                        .count(&self.db)
                        .await?;
                    if taken > 0 {
                        errors.push(format!("email '{email}' is already taken"));
                    }
                }
                None => errors.push("email is required"),
            }
        }
        errors.into_result()
    }

    async fn validate_pending(&self, u: &IdentityUser) -> Result<(), StoreError> {
        for login in u.pending_logins() {
            self.validate_entity(EntityEntry::Login { state: EntityState::Added, login }).await?;
        }
        Ok(())
    }

    /// Insert a new user together with its queued logins, roles and claims.
    pub async fn insert_user(&self, u: &mut IdentityUser) -> Result<(), StoreError> {
        self.validate_entity(EntityEntry::User { state: EntityState::Added, user: u }).await?;
        self.validate_pending(u).await?;

        let row = u.to_row();
        let created_at = row.created_at;
        let txn = self.db.begin().await?;
        row.into_active_model().reset_all().insert(&txn).await?;
        write_pending(&txn, u).await?;
        txn.commit().await?;

        u.mark_saved(created_at);
        Ok(())
    }

    /// Save user fields and queued changes of an existing user. The tenant
    /// column is never written, and the update only matches the user's own
    /// tenant, so a user cannot be moved between tenants.
    pub async fn save_user(&self, u: &mut IdentityUser) -> Result<(), StoreError> {
        self.validate_entity(EntityEntry::User { state: EntityState::Modified, user: u }).await?;
        self.validate_pending(u).await?;

        let mut am = u.to_row().into_active_model().reset_all();
        am.tenant_id = NotSet;
        am.created_at = NotSet;
        let txn = self.db.begin().await?;
        user::Entity::update(am)
            .filter(user::Column::TenantId.eq(u.tenant_id()))
            .exec(&txn)
            .await?;
        for login in u.removed_logins() {
            login.clone().delete(&txn).await?;
        }
        write_pending(&txn, u).await?;
        txn.commit().await?;

        u.mark_saved(Utc::now().into());
        Ok(())
    }

    /// Load the first user matching `condition` as a full aggregate.
    pub async fn find_user(&self, condition: Condition) -> Result<Option<IdentityUser>, StoreError> {
        let row = user::Entity::find()
            .filter(condition)
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .one(&self.db)
            .await?;
        match row {
            Some(row) => Ok(Some(self.load_aggregate(row).await?)),
            None => Ok(None),
        }
    }

    async fn load_aggregate(&self, row: user::Model) -> Result<IdentityUser, StoreError> {
        let logins = row
            .find_related(user_login::Entity)
            .filter(user_login::Column::TenantId.eq(row.tenant()))
            .all(&self.db)
            .await?;
        let roles = row.find_related(role::Entity).order_by_asc(role::Column::Name).all(&self.db).await?;
        let claims = row.find_related(user_claim::Entity).all(&self.db).await?;
        Ok(IdentityUser::from_parts(row, logins, roles, claims))
    }

    /// Keys of the users bound to `login` inside `tenant_id`.
    pub async fn find_login_owners(&self, tenant_id: TenantId, login: &dyn Loginable) -> Result<Vec<Uuid>, StoreError> {
        let owners = user_login::Entity::find()
            .select_only()
            .column(user_login::Column::UserId)
            .filter(user_login::Column::LoginProvider.eq(login.login_provider()))
            .filter(user_login::Column::ProviderKey.eq(login.provider_key()))
            .filter(user_login::Column::TenantId.eq(tenant_id))
            .limit(2)
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await?;
        Ok(owners)
    }

    /// One page of a tenant's users ordered by user name.
    pub async fn list_users(&self, tenant_id: TenantId, opts: Pagination) -> Result<Vec<user::Model>, StoreError> {
        let (page_idx, per_page) = opts.normalize();
        let users = user::Entity::find()
            .filter(user::Column::TenantId.eq(tenant_id))
            .order_by_asc(user::Column::UserName)
            .paginate(&self.db, per_page)
            .fetch_page(page_idx)
            .await?;
        Ok(users)
    }

    pub async fn find_role(&self, name: &str) -> Result<Option<role::Model>, StoreError> {
        Ok(role::find_by_name(&self.db, name).await?)
    }
}

async fn write_pending(txn: &DatabaseTransaction, u: &IdentityUser) -> Result<(), StoreError> {
    if !u.pending_logins().is_empty() {
        let logins = u.pending_logins().iter().map(|l| l.clone().into_active_model().reset_all());
        user_login::Entity::insert_many(logins).exec_without_returning(txn).await?;
    }
    if !u.pending_roles().is_empty() {
        let links = u
            .pending_roles()
            .iter()
            .map(|r| user_role::ActiveModel { user_id: Set(u.id()), role_id: Set(r.id) });
        user_role::Entity::insert_many(links).exec_without_returning(txn).await?;
    }
    if !u.pending_claims().is_empty() {
        let claims = u.pending_claims().iter().map(|c| c.clone().into_active_model().reset_all());
        user_claim::Entity::insert_many(claims).exec_without_returning(txn).await?;
    }
    Ok(())
}
