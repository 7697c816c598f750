use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::{role, user, user_claim, user_login, Identifiable, Loginable, TenantId, TenantScoped};

/// External login descriptor handed over by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLoginInfo {
    pub login_provider: String,
    pub provider_key: String,
}

impl UserLoginInfo {
    pub fn new(login_provider: impl Into<String>, provider_key: impl Into<String>) -> Self {
        Self { login_provider: login_provider.into(), provider_key: provider_key.into() }
    }
}

impl Loginable for UserLoginInfo {
    fn login_provider(&self) -> &str { &self.login_provider }
    fn provider_key(&self) -> &str { &self.provider_key }
}

impl From<&user_login::Model> for UserLoginInfo {
    fn from(l: &user_login::Model) -> Self {
        Self::new(l.login_provider.clone(), l.provider_key.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaim {
    pub claim_type: String,
    pub claim_value: Option<String>,
}

/// Which users a lookup may see.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TenantScope {
    /// Only the store's active tenant; fails when no tenant is bound.
    #[default]
    Active,
    /// Every tenant. Must be asked for explicitly.
    AllTenants,
}

/// Changes recorded on an aggregate and written by the next save.
#[derive(Debug, Clone, Default)]
struct PendingChanges {
    logins: Vec<user_login::Model>,
    removed_logins: Vec<user_login::Model>,
    roles: Vec<role::Model>,
    claims: Vec<user_claim::Model>,
}

impl PendingChanges {
    fn is_empty(&self) -> bool {
        self.logins.is_empty() && self.removed_logins.is_empty() && self.roles.is_empty() && self.claims.is_empty()
    }
}

/// User aggregate: the user row plus its logins, roles and claims.
#[derive(Debug, Clone)]
pub struct IdentityUser {
    pub id: Uuid,
    tenant_id: TenantId,
    pub user_name: String,
    pub email: Option<String>,
    pub email_confirmed: bool,
    pub security_stamp: Option<String>,
    created_at: Option<DateTimeWithTimeZone>,
    logins: Vec<user_login::Model>,
    roles: Vec<role::Model>,
    claims: Vec<user_claim::Model>,
    pending: PendingChanges,
}

impl IdentityUser {
    /// A new, unsaved user with a fresh key and no tenant yet.
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: TenantId::UNSET,
            user_name: user_name.into(),
            email: None,
            email_confirmed: false,
            security_stamp: Some(Uuid::new_v4().simple().to_string()),
            created_at: None,
            logins: Vec::new(),
            roles: Vec::new(),
            claims: Vec::new(),
            pending: PendingChanges::default(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub(crate) fn from_parts(
        row: user::Model,
        logins: Vec<user_login::Model>,
        roles: Vec<role::Model>,
        claims: Vec<user_claim::Model>,
    ) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant(),
            user_name: row.user_name,
            email: row.email,
            email_confirmed: row.email_confirmed,
            security_stamp: row.security_stamp,
            created_at: Some(row.created_at),
            logins,
            roles,
            claims,
            pending: PendingChanges::default(),
        }
    }

    /// Not yet written to the database.
    pub fn is_new(&self) -> bool { self.created_at.is_none() }

    pub fn created_at(&self) -> Option<DateTimeWithTimeZone> { self.created_at }

    pub fn has_pending_changes(&self) -> bool { !self.pending.is_empty() }

    /// Persisted logins that are not scheduled for removal, followed by pending ones.
    pub fn logins(&self) -> impl Iterator<Item = &user_login::Model> {
        self.logins
            .iter()
            .filter(|l| !self.pending.removed_logins.contains(l))
            .chain(self.pending.logins.iter())
    }

    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().chain(self.pending.roles.iter()).map(|r| r.name.as_str())
    }

    pub fn claims(&self) -> impl Iterator<Item = &user_claim::Model> {
        self.claims.iter().chain(self.pending.claims.iter())
    }

    pub(crate) fn pending_logins(&self) -> &[user_login::Model] { &self.pending.logins }

    pub(crate) fn removed_logins(&self) -> &[user_login::Model] { &self.pending.removed_logins }

    pub(crate) fn pending_roles(&self) -> &[role::Model] { &self.pending.roles }

    pub(crate) fn pending_claims(&self) -> &[user_claim::Model] { &self.pending.claims }

    /// Stamp the tenant on the user and on every login queued before creation.
    pub(crate) fn stamp_tenant(&mut self, tenant_id: TenantId) {
        self.tenant_id = tenant_id;
        for login in &mut self.pending.logins {
            login.set_tenant_id(tenant_id);
        }
    }

    pub(crate) fn queue_login(&mut self, login: user_login::Model) {
        self.pending.logins.push(login);
    }

    /// Drop a queued login, or schedule a persisted one for deletion.
    /// Returns false when the user has no such login.
    pub(crate) fn dequeue_login(&mut self, login: &dyn Loginable) -> bool {
        if let Some(pos) = self.pending.logins.iter().position(|l| l.same_login(login)) {
            self.pending.logins.remove(pos);
            return true;
        }
        let persisted = self
            .logins
            .iter()
            .find(|l| l.same_login(login) && !self.pending.removed_logins.contains(l))
            .cloned();
        match persisted {
            Some(l) => {
                self.pending.removed_logins.push(l);
                true
            }
            None => false,
        }
    }

    pub(crate) fn queue_role(&mut self, role: role::Model) {
        self.pending.roles.push(role);
    }

    pub(crate) fn queue_claim(&mut self, claim_type: &str, claim_value: Option<&str>) {
        self.pending.claims.push(user_claim::Model {
            id: Uuid::new_v4(),
            user_id: self.id,
            claim_type: claim_type.to_string(),
            claim_value: claim_value.map(str::to_string),
        });
    }

    /// Fold pending changes into the persisted view after a successful save.
    pub(crate) fn mark_saved(&mut self, created_at: DateTimeWithTimeZone) {
        if self.created_at.is_none() {
            self.created_at = Some(created_at);
        }
        let pending = std::mem::take(&mut self.pending);
        self.logins.retain(|l| !pending.removed_logins.contains(l));
        self.logins.extend(pending.logins);
        self.roles.extend(pending.roles);
        self.claims.extend(pending.claims);
    }

    pub(crate) fn to_row(&self) -> user::Model {
        let now: DateTimeWithTimeZone = Utc::now().into();
        user::Model {
            id: self.id,
            tenant_id: self.tenant_id.as_uuid(),
            user_name: self.user_name.clone(),
            email: self.email.clone(),
            email_confirmed: self.email_confirmed,
            security_stamp: self.security_stamp.clone(),
            created_at: self.created_at.unwrap_or(now),
            updated_at: now,
        }
    }
}

impl TenantScoped for IdentityUser {
    fn tenant_id(&self) -> TenantId { self.tenant_id }
    fn set_tenant_id(&mut self, tenant_id: TenantId) { self.stamp_tenant(tenant_id); }
}

impl Identifiable for IdentityUser {
    fn id(&self) -> Uuid { self.id }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_for(user: &IdentityUser, provider: &str, key: &str) -> user_login::Model {
        user_login::Model {
            tenant_id: user.tenant_id().as_uuid(),
            login_provider: provider.into(),
            provider_key: key.into(),
            user_id: user.id,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn new_user_is_unsaved_and_unscoped() {
        let u = IdentityUser::new("alice").with_email("alice@example.com");
        assert!(u.is_new());
        assert!(u.has_key());
        assert!(u.tenant_id().is_unset());
        assert!(!u.has_pending_changes());
        assert_eq!(u.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn stamping_tenant_restamps_queued_logins() {
        let mut u = IdentityUser::new("alice");
        u.queue_login(login_for(&u, "google", "g123"));
        let t = TenantId::new(Uuid::new_v4());
        u.stamp_tenant(t);
        assert_eq!(u.tenant_id(), t);
        assert!(u.logins().all(|l| l.tenant_id() == t));
    }

    #[test]
    fn dequeue_then_save_drops_persisted_login() {
        let mut u = IdentityUser::new("bob");
        u.stamp_tenant(TenantId::new(Uuid::new_v4()));
        u.queue_login(login_for(&u, "google", "g1"));
        u.queue_login(login_for(&u, "github", "h1"));
        u.mark_saved(Utc::now().into());
        assert!(!u.is_new());
        assert_eq!(u.logins().count(), 2);

        assert!(u.dequeue_login(&UserLoginInfo::new("google", "g1")));
        assert_eq!(u.logins().count(), 1);
        assert_eq!(u.removed_logins().len(), 1);
        assert!(!u.dequeue_login(&UserLoginInfo::new("google", "g1")));

        u.mark_saved(Utc::now().into());
        assert!(!u.has_pending_changes());
        let left: Vec<UserLoginInfo> = u.logins().map(UserLoginInfo::from).collect();
        assert_eq!(left, vec![UserLoginInfo::new("github", "h1")]);
    }

    #[test]
    fn claims_and_roles_include_pending_entries() {
        let mut u = IdentityUser::new("carol");
        u.queue_claim("department", Some("finance"));
        u.queue_role(role::Model { id: Uuid::new_v4(), name: "admin".into() });
        assert_eq!(u.claims().count(), 1);
        assert_eq!(u.role_names().collect::<Vec<_>>(), vec!["admin"]);
        assert!(u.has_pending_changes());
    }
}
