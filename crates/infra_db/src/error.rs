//! Database error types and mapping to port errors

use core_kernel::PortError;
use thiserror::Error;

/// Errors raised by the database layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Could not establish a connection or pool
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    /// A constraint was violated
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// PostgreSQL error code for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

/// Maps a sqlx error to the shared `PortError`
///
/// Unique violations become `Conflict` so the stores surface duplicate
/// cedulas, contracts, and payment references uniformly; `RowNotFound`
/// becomes `NotFound` with the entity name supplied by the caller.
pub fn map_sqlx_error(err: sqlx::Error, entity: &str, id: impl std::fmt::Display) -> PortError {
    match &err {
        sqlx::Error::RowNotFound => PortError::not_found(entity, id),
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            PortError::conflict(format!("{entity} uniqueness violated: {}", db.message()))
        }
        _ => PortError::Connection {
            message: format!("{entity} query failed"),
            source: Some(Box::new(err)),
        },
    }
}
