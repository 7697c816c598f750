use chrono::Utc;
use sea_orm::{ColumnTrait, Condition};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::context::{email_matches, IdentityContext};
use crate::domain::{IdentityUser, TenantScope, UserClaim, UserLoginInfo};
use crate::errors::StoreError;
use crate::pagination::Pagination;
use models::{user, user_login, Identifiable, Loginable, TenantId, TenantScoped};

const STORE_NAME: &str = "TenantUserStore";

/// User store bound to one tenant at a time.
///
/// Every scoped operation checks its arguments, then verifies the store is
/// live and a tenant is set, and only then touches the database. Queries
/// always carry the active tenant as a predicate; reaching across tenants
/// requires [`TenantScope::AllTenants`].
///
/// Changes to an existing user (logins, roles, claims) are recorded on the
/// aggregate and written by [`TenantUserStore::update_user`].
pub struct TenantUserStore {
    context: Option<IdentityContext>,
    tenant_id: TenantId,
}

impl TenantUserStore {
    pub fn new(context: IdentityContext) -> Self {
        Self { context: Some(context), tenant_id: TenantId::UNSET }
    }

    pub fn tenant_id(&self) -> TenantId { self.tenant_id }

    pub fn set_tenant_id(&mut self, tenant_id: TenantId) {
        debug!(%tenant_id, "active tenant set");
        self.tenant_id = tenant_id;
    }

    pub fn clear_tenant(&mut self) { self.tenant_id = TenantId::UNSET; }

    pub fn is_disposed(&self) -> bool { self.context.is_none() }

    /// Release the context. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.context.take().is_some() {
            debug!("store disposed");
        }
    }

    fn live(&self) -> Result<&IdentityContext, StoreError> {
        self.context.as_ref().ok_or(StoreError::Disposed(STORE_NAME))
    }

    fn guard(&self) -> Result<(&IdentityContext, TenantId), StoreError> {
        let ctx = self.live()?;
        if self.tenant_id.is_unset() {
            return Err(StoreError::TenantNotSet);
        }
        Ok((ctx, self.tenant_id))
    }

    /// A persisted user may only be handled by a store bound to its tenant.
    fn check_owner(user: &IdentityUser, tenant_id: TenantId) -> Result<(), StoreError> {
        if user.is_new() || user.belongs_to(tenant_id) {
            Ok(())
        } else {
            Err(StoreError::TenantMismatch { user_id: user.id })
        }
    }

    /// Persist a new user under the active tenant, together with any logins,
    /// roles and claims queued on it. The user's tenant is overwritten with the
    /// active one.
    #[instrument(skip(self, user), fields(tenant_id = %self.tenant_id, user_id = %user.id))]
    pub async fn create_user(&self, user: &mut IdentityUser) -> Result<(), StoreError> {
        if !user.has_key() {
            return Err(StoreError::InvalidArgument("user"));
        }
        if !user.is_new() {
            return Err(StoreError::InvalidArgument("user is already persisted"));
        }
        let (ctx, tenant_id) = self.guard()?;

        user.stamp_tenant(tenant_id);
        ctx.insert_user(user).await?;
        info!(user_name = %user.user_name, logins = user.logins().count(), "user_created");
        Ok(())
    }

    /// Save an existing user's fields and queued changes in one transaction.
    #[instrument(skip(self, user), fields(tenant_id = %self.tenant_id, user_id = %user.id))]
    pub async fn update_user(&self, user: &mut IdentityUser) -> Result<(), StoreError> {
        if !user.has_key() {
            return Err(StoreError::InvalidArgument("user"));
        }
        if user.is_new() {
            return Err(StoreError::InvalidArgument("user has not been created"));
        }
        let (ctx, tenant_id) = self.guard()?;
        Self::check_owner(user, tenant_id)?;

        ctx.save_user(user).await?;
        info!("user_updated");
        Ok(())
    }

    #[instrument(skip(self), fields(tenant_id = %self.tenant_id))]
    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<IdentityUser>, StoreError> {
        if user_id.is_nil() {
            return Err(StoreError::InvalidArgument("user_id"));
        }
        let (ctx, tenant_id) = self.guard()?;
        let found = ctx
            .find_user(
                Condition::all()
                    .add(user::Column::Id.eq(user_id))
                    .add(user::Column::TenantId.eq(tenant_id)),
            )
            .await?;
        debug!(found = found.is_some(), "find_by_id");
        Ok(found)
    }

    /// Look a user up by exact user name, either inside the active tenant or,
    /// when asked for explicitly, across every tenant (oldest match wins).
    #[instrument(skip(self), fields(tenant_id = %self.tenant_id))]
    pub async fn find_by_user_name(&self, user_name: &str, scope: TenantScope) -> Result<Option<IdentityUser>, StoreError> {
        if user_name.trim().is_empty() {
            return Err(StoreError::InvalidArgument("user_name"));
        }
        let (ctx, condition) = self.scoped(scope, Condition::all().add(user::Column::UserName.eq(user_name)))?;
        let found = ctx.find_user(condition).await?;
        debug!(found = found.is_some(), "find_by_user_name");
        Ok(found)
    }

    /// Case-insensitive email lookup.
    #[instrument(skip(self), fields(tenant_id = %self.tenant_id))]
    pub async fn find_by_email(&self, email: &str, scope: TenantScope) -> Result<Option<IdentityUser>, StoreError> {
        if email.trim().is_empty() {
            return Err(StoreError::InvalidArgument("email"));
        }
        let (ctx, condition) = self.scoped(scope, Condition::all().add(email_matches(email)))?;
        let found = ctx.find_user(condition).await?;
        debug!(found = found.is_some(), "find_by_email");
        Ok(found)
    }

    fn scoped(&self, scope: TenantScope, condition: Condition) -> Result<(&IdentityContext, Condition), StoreError> {
        match scope {
            TenantScope::Active => {
                let (ctx, tenant_id) = self.guard()?;
                Ok((ctx, condition.add(user::Column::TenantId.eq(tenant_id))))
            }
            TenantScope::AllTenants => Ok((self.live()?, condition)),
        }
    }

    /// Queue an external login on the user. Nothing is written until the user
    /// is created or updated.
    #[instrument(skip(self, user, login), fields(tenant_id = %self.tenant_id, user_id = %user.id, provider = %login.login_provider()))]
    pub fn add_login(&self, user: &mut IdentityUser, login: &impl Loginable) -> Result<(), StoreError> {
        if !user.has_key() {
            return Err(StoreError::InvalidArgument("user"));
        }
        check_login_arg(login)?;
        let (_, tenant_id) = self.guard()?;
        Self::check_owner(user, tenant_id)?;

        user.queue_login(user_login::Model {
            tenant_id: tenant_id.as_uuid(),
            login_provider: login.login_provider().to_string(),
            provider_key: login.provider_key().to_string(),
            user_id: user.id,
            created_at: Utc::now().into(),
        });
        info!("login_added");
        Ok(())
    }

    /// Find the user bound to an external login inside the active tenant.
    #[instrument(skip(self, login), fields(tenant_id = %self.tenant_id, provider = %login.login_provider()))]
    pub async fn find_by_login(&self, login: &impl Loginable) -> Result<Option<IdentityUser>, StoreError> {
        check_login_arg(login)?;
        let (ctx, tenant_id) = self.guard()?;

        let owners = ctx.find_login_owners(tenant_id, login).await?;
        let user_id = match owners.as_slice() {
            [] => {
                debug!("no login match");
                return Ok(None);
            }
            [only] => *only,
            _ => {
                return Err(StoreError::AmbiguousLogin {
                    provider: login.login_provider().to_string(),
                    key: login.provider_key().to_string(),
                })
            }
        };
        ctx.find_user(
            Condition::all()
                .add(user::Column::Id.eq(user_id))
                .add(user::Column::TenantId.eq(tenant_id)),
        )
        .await
    }

    /// Drop a login from the user. A queued login is discarded; a persisted
    /// one is deleted on the next update. Unknown logins are ignored.
    #[instrument(skip(self, user, login), fields(tenant_id = %self.tenant_id, user_id = %user.id, provider = %login.login_provider()))]
    pub fn remove_login(&self, user: &mut IdentityUser, login: &impl Loginable) -> Result<(), StoreError> {
        if !user.has_key() {
            return Err(StoreError::InvalidArgument("user"));
        }
        check_login_arg(login)?;
        let (_, tenant_id) = self.guard()?;
        Self::check_owner(user, tenant_id)?;

        if user.dequeue_login(login) {
            info!("login_removed");
        } else {
            debug!("login not bound to user");
        }
        Ok(())
    }

    /// Persisted and queued logins of the user.
    pub fn get_logins(&self, user: &IdentityUser) -> Result<Vec<UserLoginInfo>, StoreError> {
        let (_, tenant_id) = self.guard()?;
        Self::check_owner(user, tenant_id)?;
        Ok(user.logins().map(UserLoginInfo::from).collect())
    }

    /// One page of the active tenant's users, ordered by user name.
    #[instrument(skip(self), fields(tenant_id = %self.tenant_id))]
    pub async fn list_users(&self, page: Pagination) -> Result<Vec<user::Model>, StoreError> {
        let (ctx, tenant_id) = self.guard()?;
        ctx.list_users(tenant_id, page).await
    }

    /// Queue membership in an existing role. Already-held roles are left alone.
    #[instrument(skip(self, user), fields(tenant_id = %self.tenant_id, user_id = %user.id))]
    pub async fn add_to_role(&self, user: &mut IdentityUser, role_name: &str) -> Result<(), StoreError> {
        if !user.has_key() {
            return Err(StoreError::InvalidArgument("user"));
        }
        if role_name.trim().is_empty() {
            return Err(StoreError::InvalidArgument("role_name"));
        }
        let (ctx, tenant_id) = self.guard()?;
        Self::check_owner(user, tenant_id)?;

        if user.role_names().any(|r| r == role_name) {
            return Ok(());
        }
        let role = ctx
            .find_role(role_name)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("role '{role_name}' not found")))?;
        user.queue_role(role);
        info!("role_added");
        Ok(())
    }

    pub fn get_roles(&self, user: &IdentityUser) -> Result<Vec<String>, StoreError> {
        let (_, tenant_id) = self.guard()?;
        Self::check_owner(user, tenant_id)?;
        Ok(user.role_names().map(str::to_string).collect())
    }

    pub fn is_in_role(&self, user: &IdentityUser, role_name: &str) -> Result<bool, StoreError> {
        if role_name.trim().is_empty() {
            return Err(StoreError::InvalidArgument("role_name"));
        }
        Ok(self.get_roles(user)?.iter().any(|r| r == role_name))
    }

    #[instrument(skip(self, user, claim_value), fields(tenant_id = %self.tenant_id, user_id = %user.id))]
    pub fn add_claim(&self, user: &mut IdentityUser, claim_type: &str, claim_value: Option<&str>) -> Result<(), StoreError> {
        if !user.has_key() {
            return Err(StoreError::InvalidArgument("user"));
        }
        if claim_type.trim().is_empty() {
            return Err(StoreError::InvalidArgument("claim_type"));
        }
        let (_, tenant_id) = self.guard()?;
        Self::check_owner(user, tenant_id)?;

        user.queue_claim(claim_type, claim_value);
        info!("claim_added");
        Ok(())
    }

    pub fn get_claims(&self, user: &IdentityUser) -> Result<Vec<UserClaim>, StoreError> {
        let (_, tenant_id) = self.guard()?;
        Self::check_owner(user, tenant_id)?;
        Ok(user
            .claims()
            .map(|c| UserClaim { claim_type: c.claim_type.clone(), claim_value: c.claim_value.clone() })
            .collect())
    }
}

fn check_login_arg(login: &impl Loginable) -> Result<(), StoreError> {
    if login.login_provider().trim().is_empty() {
        return Err(StoreError::InvalidArgument("login_provider"));
    }
    if login.provider_key().trim().is_empty() {
        return Err(StoreError::InvalidArgument("provider_key"));
    }
    Ok(())
}
