//! Customer domain errors

use core_kernel::MoneyError;
use thiserror::Error;

/// Errors that can occur in the customer domain
#[derive(Debug, Error)]
pub enum CustomerError {
    /// Customer not found
    #[error("Customer not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint was violated
    #[error("Duplicate customer: {0}")]
    Duplicate(String),

    /// Validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown role string
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    /// Money arithmetic failed
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),
}
