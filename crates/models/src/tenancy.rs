//! Tenant identity and the capabilities records expose to the store.
//!
//! Records implement small traits instead of being threaded through the
//! store as type parameters: anything carrying a tenant is [`TenantScoped`],
//! anything with a primary user key is [`Identifiable`], and anything naming
//! an external provider binding is [`Loginable`].

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque tenant key. The nil UUID (`TenantId::default()`) means "no tenant bound".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(Uuid);

impl TenantId {
    pub const UNSET: TenantId = TenantId(Uuid::nil());

    pub fn new(id: Uuid) -> Self { Self(id) }

    pub fn is_unset(&self) -> bool { self.0.is_nil() }

    pub fn as_uuid(&self) -> Uuid { self.0 }
}

impl From<Uuid> for TenantId {
    fn from(id: Uuid) -> Self { Self(id) }
}

impl From<TenantId> for Uuid {
    fn from(t: TenantId) -> Self { t.0 }
}

impl From<TenantId> for sea_orm::Value {
    fn from(t: TenantId) -> Self { t.0.into() }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unset() { f.write_str("<unset>") } else { self.0.fmt(f) }
    }
}

/// A record that belongs to exactly one tenant.
pub trait TenantScoped {
    fn tenant_id(&self) -> TenantId;
    fn set_tenant_id(&mut self, tenant_id: TenantId);

    fn belongs_to(&self, tenant_id: TenantId) -> bool {
        !tenant_id.is_unset() && self.tenant_id() == tenant_id
    }
}

/// A record keyed by a user/role UUID.
pub trait Identifiable {
    fn id(&self) -> Uuid;

    fn has_key(&self) -> bool { !self.id().is_nil() }
}

/// A binding to an external authentication provider.
pub trait Loginable {
    fn login_provider(&self) -> &str;
    fn provider_key(&self) -> &str;

    fn same_login(&self, other: &dyn Loginable) -> bool {
        self.login_provider() == other.login_provider() && self.provider_key() == other.provider_key()
    }
}
