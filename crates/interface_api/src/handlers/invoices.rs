//! Invoice handlers
//!
//! Authorization contract: only administrators issue invoices or mark
//! them overdue; the owning customer or an administrator marks them paid.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::{ContractId, InvoiceId};
use domain_billing::BillingStore;

use crate::auth::Principal;
use crate::dto::billing::{InvoiceResponse, IssueInvoiceRequest, MarkPaidRequest};
use crate::error::ApiError;
use crate::AppState;

/// Issues an invoice for a contract (administrators)
pub async fn issue_invoice(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<IssueInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), ApiError> {
    principal.require_admin()?;

    let invoice = state
        .billing
        .issue_invoice(ContractId::from_uuid(request.contract_id))
        .await?;
    Ok((StatusCode::CREATED, Json(invoice.into())))
}

/// Lists all invoices (administrators)
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<InvoiceResponse>>, ApiError> {
    principal.require_admin()?;

    let invoices = state.billing_store.list_invoices().await?;
    Ok(Json(invoices.into_iter().map(Into::into).collect()))
}

/// Gets one invoice (the owning customer or an administrator)
pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state
        .billing_store
        .get_invoice(InvoiceId::from_uuid(id))
        .await?;
    principal.require_self_or_admin(invoice.customer_id)?;
    Ok(Json(invoice.into()))
}

/// Settles an invoice administratively (owning customer or administrator)
pub async fn mark_invoice_paid(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(request): Json<MarkPaidRequest>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice_id = InvoiceId::from_uuid(id);

    let invoice = state.billing_store.get_invoice(invoice_id).await?;
    principal.require_self_or_admin(invoice.customer_id)?;

    let settled = state
        .billing
        .mark_invoice_paid(invoice_id, request.reference)
        .await?;
    Ok(Json(settled.into()))
}

/// Marks an invoice overdue (administrators)
pub async fn mark_invoice_overdue(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    principal.require_admin()?;

    let invoice = state
        .billing
        .mark_invoice_overdue(InvoiceId::from_uuid(id))
        .await?;
    Ok(Json(invoice.into()))
}
