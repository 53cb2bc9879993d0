//! Error types for block-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    /// Malformed or missing input. Recoverable by correcting the input.
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A tenant-scoped operation was invoked without a tenant.
    /// Indicates mis-wired calling code, never a user error.
    #[error("Tenant isolation violation: {operation} requires a tenant id")]
    TenantIsolation { operation: &'static str },

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Stable classification of a [`BlockError`] for boundary layers that map
/// errors onto status codes or exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    TenantIsolation,
    Storage,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::TenantIsolation => "tenant_isolation",
            ErrorKind::Storage => "storage",
        }
    }
}

impl BlockError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        BlockError::Validation {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn block_not_found(id: impl ToString) -> Self {
        BlockError::NotFound {
            entity: "block",
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BlockError::Validation { .. } => ErrorKind::Validation,
            BlockError::NotFound { .. } => ErrorKind::NotFound,
            BlockError::TenantIsolation { .. } => ErrorKind::TenantIsolation,
            BlockError::Storage(_) => ErrorKind::Storage,
        }
    }
}

pub type Result<T> = std::result::Result<T, BlockError>;
