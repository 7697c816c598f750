use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::context::ValidationErrors;
use models::errors::ModelError;

/// Failures surfaced by the tenant-scoped store.
///
/// Argument and guard failures (`InvalidArgument`, `TenantNotSet`, `Disposed`,
/// `TenantMismatch`) are raised before any database round-trip. A lookup
/// that finds nothing is `Ok(None)`, never an error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("tenant id must be set before using the store")]
    TenantNotSet,
    #[error("{0} has been disposed")]
    Disposed(&'static str),
    #[error("user {user_id} does not belong to the active tenant")]
    TenantMismatch { user_id: Uuid },
    #[error("login {provider}/{key} is bound to more than one user")]
    AmbiguousLogin { provider: String, key: String },
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("constraint violation: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Db(String),
}

impl StoreError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    /// True for the conditions a caller fixes by binding the store correctly
    /// (set the tenant, use a live store, stay inside one tenant).
    pub fn is_invalid_operation(&self) -> bool {
        matches!(
            self,
            StoreError::TenantNotSet
                | StoreError::Disposed(_)
                | StoreError::TenantMismatch { .. }
                | StoreError::AmbiguousLogin { .. }
        )
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            StoreError::InvalidArgument(_) => 2001,
            StoreError::TenantNotSet => 2002,
            StoreError::Disposed(_) => 2003,
            StoreError::TenantMismatch { .. } => 2004,
            StoreError::AmbiguousLogin { .. } => 2005,
            StoreError::Validation(_) => 2101,
            StoreError::Conflict(_) => 2102,
            StoreError::NotFound(_) => 2103,
            StoreError::Db(_) => 2200,
        }
    }
}

impl From<ModelError> for StoreError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => StoreError::Validation(ValidationErrors::single(msg)),
            ModelError::Conflict(msg) => StoreError::Conflict(msg),
            ModelError::Db(msg) => StoreError::Db(msg),
        }
    }
}

impl From<DbErr> for StoreError {
    fn from(e: DbErr) -> Self {
        match e {
            DbErr::RecordNotUpdated => StoreError::not_found("user"),
            other => ModelError::from(other).into(),
        }
    }
}
