//! Domain-level error types.

use thiserror::Error;

/// Domain errors - business rule failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: i32 },

    #[error("Validation failed: {0}")]
    Validation(String),
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

/// Failures while resolving database credentials at startup.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Missing credential value: {0}")]
    Missing(String),

    #[error("Malformed credential value: {0}")]
    Malformed(String),

    #[error("Identity provider rejected the request: {0}")]
    Identity(String),

    #[error("Secret vault request failed: {0}")]
    Vault(String),
}
