//! Domain-level error types.

use thiserror::Error;
use uuid::Uuid;

use crate::validation::ValidationErrors;

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: Uuid },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("You are not authorized to {action} this {entity_type}.")]
    Forbidden {
        entity_type: &'static str,
        action: &'static str,
    },

    #[error("Logout failed: {0}")]
    Logout(String),

    #[error("Refresh failed: {0}")]
    Refresh(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        DomainError::Validation(errors)
    }
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        DomainError::Internal(err.to_string())
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}
