//! Billing domain errors

use core_kernel::{MoneyError, PortError};
use domain_catalog::CatalogError;
use thiserror::Error;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Malformed or missing input; user-correctable
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced entity absent
    #[error("Not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// Uniqueness violation, e.g. a duplicate payment reference
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Illegal invoice state transition
    #[error("Invalid invoice transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// The exchange rate could not be obtained and no cached rate exists
    #[error("Exchange rate unavailable: {0}")]
    RateUnavailable(String),

    /// Money arithmetic failed
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// Contract state machine rejected a transition
    #[error("Contract error: {0}")]
    Contract(#[from] CatalogError),

    /// Storage failure not covered by the variants above
    #[error("Store error: {0}")]
    Store(PortError),
}

impl BillingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }

    pub fn not_found(entity: impl Into<String>, id: impl std::fmt::Display) -> Self {
        BillingError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

impl From<PortError> for BillingError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, id } => BillingError::NotFound {
                entity: entity_type,
                id,
            },
            PortError::Conflict { message } => BillingError::Conflict(message),
            PortError::Validation { message } => BillingError::Validation(message),
            other => BillingError::Store(other),
        }
    }
}
