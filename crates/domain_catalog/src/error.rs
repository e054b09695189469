//! Catalog domain errors

use thiserror::Error;

/// Errors that can occur in the catalog domain
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Plan not found
    #[error("Plan not found: {0}")]
    PlanNotFound(String),

    /// Contract not found
    #[error("Contract not found: {0}")]
    ContractNotFound(String),

    /// The customer already has an open contract
    #[error("Customer already has an open contract: {0}")]
    DuplicateContract(String),

    /// Validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Illegal state transition
    #[error("Invalid contract transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}
