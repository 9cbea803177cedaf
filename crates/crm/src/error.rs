//! # CRM Errors
//!
//! One error type for the whole application layer. Every service operation
//! returns `Result<_, CrmError>`; store failures are folded in through
//! `From<StoreError>` so `?` carries them through a transaction unchanged.

use entity_store::StoreError;

use crate::authz::{Action, ResourceType};
use crate::model::Role;

/// Errors surfaced to callers of the service layer.
#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    /// Malformed input, rejected before any database call.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not authenticated: {0}")]
    Unauthenticated(String),

    #[error("permission denied: {role} may not {action} {resource_type}")]
    PermissionDenied {
        action: Action,
        resource_type: ResourceType,
        role: Role,
    },

    #[error("workflow violation: {0}")]
    WorkflowViolation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("uniqueness violation: {0}")]
    UniquenessViolation(String),

    #[error("referential integrity violation: {0}")]
    ReferentialIntegrityViolation(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Coarse classification of [`CrmError`], for presentation layers that map
/// errors to messages or exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Unauthenticated,
    PermissionDenied,
    WorkflowViolation,
    NotFound,
    UniquenessViolation,
    ReferentialIntegrityViolation,
    Storage,
}

impl CrmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CrmError::Validation(_) => ErrorKind::Validation,
            CrmError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            CrmError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            CrmError::WorkflowViolation(_) => ErrorKind::WorkflowViolation,
            CrmError::NotFound { .. } => ErrorKind::NotFound,
            CrmError::UniquenessViolation(_) => ErrorKind::UniquenessViolation,
            CrmError::ReferentialIntegrityViolation(_) => ErrorKind::ReferentialIntegrityViolation,
            CrmError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        CrmError::Validation(msg.into())
    }

    pub(crate) fn workflow(msg: impl Into<String>) -> Self {
        CrmError::WorkflowViolation(msg.into())
    }
}

impl From<StoreError> for CrmError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => CrmError::NotFound { entity, id },
            StoreError::UniquenessViolation { entity, detail } => {
                CrmError::UniquenessViolation(format!("{entity}: {detail}"))
            }
            StoreError::ReferentialIntegrityViolation { entity, detail } => {
                CrmError::ReferentialIntegrityViolation(format!("{entity}: {detail}"))
            }
            other => CrmError::Storage(other.to_string()),
        }
    }
}
