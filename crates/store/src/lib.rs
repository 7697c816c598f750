//! Tenant-scoped identity store.
//!
//! - [`user_store::TenantUserStore`] binds user lookup, login association and
//!   account creation to one active tenant.
//! - [`context::IdentityContext`] owns the connection, validates entities and
//!   performs the transactional writes.
//! - [`domain::IdentityUser`] is the user aggregate; changes queued on it are
//!   written by the next create or update.

pub mod context;
pub mod domain;
pub mod errors;
pub mod pagination;
#[cfg(test)]
pub mod test_support;
pub mod user_store;

pub use context::{IdentityContext, IdentityOptions};
pub use domain::{IdentityUser, TenantScope, UserClaim, UserLoginInfo};
pub use errors::StoreError;
pub use models::TenantId;
pub use pagination::Pagination;
pub use user_store::TenantUserStore;
