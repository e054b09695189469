//! Registration and login handlers

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use domain_customer::{Customer, CustomerStore, CustomerValidator};

use crate::auth::{create_token, password};
use crate::dto::auth::{AuthResponse, LoginRequest, RegisterRequest};
use crate::error::ApiError;
use crate::AppState;

/// Registers a new customer account and issues a token
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    request.validate()?;

    let password_hash = password::hash(&request.password)
        .map_err(|_| ApiError::Internal("credential hashing failed".to_string()))?;

    let mut customer = Customer::new(
        request.cedula,
        request.email,
        password_hash,
        request.first_name,
        request.last_name,
    );
    if let Some(phone) = request.phone {
        customer = customer.with_phone(phone);
    }
    if let Some(address) = request.address {
        customer = customer.with_address(address.into());
    }

    // Business-rule validation beyond DTO shape (digit-only cedula/phone)
    let validation = CustomerValidator::validate(&customer);
    if !validation.is_valid {
        return Err(ApiError::Validation(validation.errors.join("; ")));
    }

    // The store's unique indexes back these checks; pre-checking gives a
    // friendlier message than a raw conflict
    if state
        .customers
        .find_by_cedula(&customer.cedula)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("cedula already registered".to_string()));
    }
    if state
        .customers
        .find_by_email(&customer.email)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("email already registered".to_string()));
    }

    state.customers.create(&customer).await?;

    let token = create_token(
        customer.id,
        customer.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration_secs,
    )
    .map_err(|_| ApiError::Internal("token issuance failed".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            customer: customer.into(),
        }),
    ))
}

/// Verifies credentials and issues a token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    request.validate()?;

    let customer = state
        .customers
        .find_by_email(&request.email)
        .await?
        .filter(|c| !c.deleted)
        .ok_or(ApiError::Unauthorized)?;

    if !password::verify(&request.password, &customer.password_hash) {
        return Err(ApiError::Unauthorized);
    }

    let token = create_token(
        customer.id,
        customer.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration_secs,
    )
    .map_err(|_| ApiError::Internal("token issuance failed".to_string()))?;

    Ok(Json(AuthResponse {
        token,
        customer: customer.into(),
    }))
}
