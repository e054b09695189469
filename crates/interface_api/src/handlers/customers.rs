//! Customer handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::CustomerId;
use domain_billing::BillingStore;
use domain_customer::CustomerStore;

use crate::auth::Principal;
use crate::dto::billing::{InvoiceResponse, LedgerEntryResponse};
use crate::dto::customer::{CustomerResponse, UpdateCustomerRequest};
use crate::error::ApiError;
use crate::AppState;

/// Lists all customers (administrators)
pub async fn list_customers(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<CustomerResponse>>, ApiError> {
    principal.require_admin()?;

    let customers = state.customers.list().await?;
    Ok(Json(customers.into_iter().map(Into::into).collect()))
}

/// Gets one customer (the customer themself or an administrator)
pub async fn get_customer(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let customer_id = CustomerId::from_uuid(id);
    principal.require_self_or_admin(customer_id)?;

    let customer = state.customers.get(customer_id).await?;
    Ok(Json(customer.into()))
}

/// Updates contact data (the customer themself or an administrator)
pub async fn update_customer(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCustomerRequest>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let customer_id = CustomerId::from_uuid(id);
    principal.require_self_or_admin(customer_id)?;
    request.validate()?;

    let mut customer = state.customers.get(customer_id).await?;
    if let Some(first_name) = request.first_name {
        customer.first_name = first_name;
    }
    if let Some(last_name) = request.last_name {
        customer.last_name = last_name;
    }
    if let Some(phone) = request.phone {
        customer.phone = Some(phone);
    }
    if let Some(address) = request.address {
        customer.address = Some(address.into());
    }

    state.customers.update(&customer).await?;
    Ok(Json(customer.into()))
}

/// Soft-deletes an account (administrators); financial history remains
pub async fn delete_customer(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    principal.require_admin()?;

    state.customers.soft_delete(CustomerId::from_uuid(id)).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Lists a customer's invoices (the customer themself or an administrator)
pub async fn list_customer_invoices(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<InvoiceResponse>>, ApiError> {
    let customer_id = CustomerId::from_uuid(id);
    principal.require_self_or_admin(customer_id)?;

    let invoices = state
        .billing_store
        .list_invoices_for_customer(customer_id)
        .await?;
    Ok(Json(invoices.into_iter().map(Into::into).collect()))
}

/// Lists a customer's balance ledger (the customer themself or an administrator)
pub async fn list_customer_ledger(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<LedgerEntryResponse>>, ApiError> {
    let customer_id = CustomerId::from_uuid(id);
    principal.require_self_or_admin(customer_id)?;

    let entries = state.billing_store.list_ledger_entries(customer_id).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
