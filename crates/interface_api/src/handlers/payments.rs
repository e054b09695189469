//! Payment handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{Currency, InvoiceId, PaymentId};
use domain_billing::{BillingStore, ReportPaymentRequest};

use crate::auth::Principal;
use crate::dto::billing::{PaymentReceiptResponse, PaymentResponse, ReportPaymentDto};
use crate::error::ApiError;
use crate::AppState;

/// Reports a payment against an invoice (owning customer or administrator)
pub async fn report_payment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReportPaymentDto>,
) -> Result<(StatusCode, Json<PaymentReceiptResponse>), ApiError> {
    request.validate()?;

    let invoice_id = InvoiceId::from_uuid(id);
    let invoice = state.billing_store.get_invoice(invoice_id).await?;
    principal.require_self_or_admin(invoice.customer_id)?;

    let currency: Currency = request
        .currency
        .parse()
        .map_err(|e: core_kernel::MoneyError| ApiError::Validation(e.to_string()))?;

    let receipt = state
        .billing
        .report_payment(ReportPaymentRequest {
            customer_id: invoice.customer_id,
            invoice_id,
            amount: request.amount,
            currency,
            bank_origin: request.bank_origin,
            destination_account: request.destination_account,
            reference: request.reference,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PaymentReceiptResponse {
            payment: receipt.payment.into(),
            invoice: receipt.invoice.into(),
            balance_usd: receipt.balance_usd.amount(),
        }),
    ))
}

/// Lists the payments reported against an invoice (owner or administrator)
pub async fn list_invoice_payments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PaymentResponse>>, ApiError> {
    let invoice_id = InvoiceId::from_uuid(id);
    let invoice = state.billing_store.get_invoice(invoice_id).await?;
    principal.require_self_or_admin(invoice.customer_id)?;

    let payments = state
        .billing_store
        .list_payments_for_invoice(invoice_id)
        .await?;
    Ok(Json(payments.into_iter().map(Into::into).collect()))
}

/// Confirms a reported payment (administrators)
pub async fn verify_payment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentResponse>, ApiError> {
    principal.require_admin()?;

    let payment = state
        .billing
        .verify_payment(PaymentId::from_uuid(id))
        .await?;
    Ok(Json(payment.into()))
}

/// Rejects a reported payment (administrators)
pub async fn reject_payment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentResponse>, ApiError> {
    principal.require_admin()?;

    let payment = state
        .billing
        .reject_payment(PaymentId::from_uuid(id))
        .await?;
    Ok(Json(payment.into()))
}
