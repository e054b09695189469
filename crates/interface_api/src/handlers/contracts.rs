//! Contract handlers
//!
//! Contracting a plan creates the contract and issues the first invoice
//! in one request. If issuance fails (rate source down with no cached
//! rate), the contract stands and the error is surfaced so an
//! administrator can issue the invoice once the upstream recovers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::{ContractId, CustomerId, PlanId};
use domain_catalog::{Contract, ContractStore, PlanStore};
use domain_customer::CustomerStore;

use crate::auth::Principal;
use crate::dto::catalog::{ContractCreatedResponse, ContractResponse, CreateContractRequest};
use crate::error::ApiError;
use crate::AppState;

/// Contracts a plan for a customer and issues the first invoice
///
/// Customer callers always contract for themselves; only administrators
/// may name another customer.
pub async fn create_contract(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateContractRequest>,
) -> Result<(StatusCode, Json<ContractCreatedResponse>), ApiError> {
    let customer_id = match request.customer_id {
        Some(id) => {
            let target = CustomerId::from_uuid(id);
            principal.require_self_or_admin(target)?;
            target
        }
        None => principal.customer_id,
    };

    let customer = state.customers.get(customer_id).await?;
    if customer.deleted {
        return Err(ApiError::NotFound(format!("Customer {customer_id} not found")));
    }

    let plan = state.plans.get(PlanId::from_uuid(request.plan_id)).await?;
    if !plan.active {
        return Err(ApiError::Validation(format!(
            "plan {} is not on offer",
            plan.name
        )));
    }

    let contract = Contract::new(customer_id, plan.id);
    state.contracts.create(&contract).await?;

    let invoice = state.billing.issue_invoice(contract.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ContractCreatedResponse {
            contract: contract.into(),
            invoice: invoice.into(),
        }),
    ))
}

/// Lists all contracts (administrators)
pub async fn list_contracts(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<ContractResponse>>, ApiError> {
    principal.require_admin()?;

    let contracts = state.contracts.list().await?;
    Ok(Json(contracts.into_iter().map(Into::into).collect()))
}

/// Gets one contract (the owning customer or an administrator)
pub async fn get_contract(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContractResponse>, ApiError> {
    let contract = state.contracts.get(ContractId::from_uuid(id)).await?;
    principal.require_self_or_admin(contract.customer_id)?;
    Ok(Json(contract.into()))
}

/// Suspends a contract (administrators)
pub async fn suspend_contract(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContractResponse>, ApiError> {
    principal.require_admin()?;

    let mut contract = state.contracts.get(ContractId::from_uuid(id)).await?;
    contract.suspend()?;
    state.contracts.update(&contract).await?;
    Ok(Json(contract.into()))
}

/// Ends a contract permanently (administrators)
pub async fn finalize_contract(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContractResponse>, ApiError> {
    principal.require_admin()?;

    let mut contract = state.contracts.get(ContractId::from_uuid(id)).await?;
    contract.finalize()?;
    state.contracts.update(&contract).await?;
    Ok(Json(contract.into()))
}
