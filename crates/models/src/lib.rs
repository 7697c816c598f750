//! SeaORM entities for the tenant-scoped identity schema, plus the tenancy
//! primitives (`TenantId` and the capability traits) shared by every layer.

pub mod errors;
pub mod db;
pub mod tenancy;
pub mod tenant;
pub mod user;
pub mod user_login;
pub mod role;
pub mod user_role;
pub mod user_claim;

pub use tenancy::{Identifiable, Loginable, TenantId, TenantScoped};

#[cfg(test)]
mod tests;
