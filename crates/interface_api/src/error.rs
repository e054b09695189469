//! API error handling
//!
//! Maps domain and port errors onto the HTTP taxonomy: validation 422,
//! not-found 404, forbidden 403, conflict 409, everything unexpected 500
//! with the detail logged and a generic message returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use core_kernel::PortError;
use domain_billing::BillingError;
use domain_catalog::CatalogError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream dependency failed: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Unauthorized".to_string(),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                msg.clone(),
            ),
            ApiError::Upstream(msg) => {
                error!(detail = %msg, "upstream dependency failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "An upstream dependency failed".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                // Log the detail, return a generic message
                error!(detail = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::Validation(msg) => ApiError::Validation(msg),
            BillingError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{entity} {id} not found"))
            }
            BillingError::Conflict(msg) => ApiError::Conflict(msg),
            BillingError::InvalidTransition { from, to } => {
                ApiError::Validation(format!("invalid transition: {from} -> {to}"))
            }
            BillingError::RateUnavailable(msg) => ApiError::Upstream(msg),
            BillingError::Money(e) => ApiError::Validation(e.to_string()),
            BillingError::Contract(e) => ApiError::from(e),
            BillingError::Store(e) => ApiError::from(e),
        }
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, id } => {
                ApiError::NotFound(format!("{entity_type} {id} not found"))
            }
            PortError::Validation { message } => ApiError::Validation(message),
            PortError::Conflict { message } => ApiError::Conflict(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::PlanNotFound(id) => ApiError::NotFound(format!("Plan {id} not found")),
            CatalogError::ContractNotFound(id) => {
                ApiError::NotFound(format!("Contract {id} not found"))
            }
            CatalogError::DuplicateContract(msg) => ApiError::Conflict(msg),
            CatalogError::Validation(msg) => ApiError::Validation(msg),
            CatalogError::InvalidTransition { from, to } => {
                ApiError::Validation(format!("invalid contract transition: {from} -> {to}"))
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}
