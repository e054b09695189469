//! Invoice, payment, and ledger DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_billing::ledger::BalanceEntry;
use domain_billing::{Invoice, Payment};

/// Invoice issuance request (administrators)
#[derive(Debug, Deserialize)]
pub struct IssueInvoiceRequest {
    pub contract_id: Uuid,
}

/// Administrative settlement request
#[derive(Debug, Deserialize)]
pub struct MarkPaidRequest {
    pub reference: Option<String>,
}

/// Payment report request
#[derive(Debug, Deserialize, Validate)]
pub struct ReportPaymentDto {
    pub amount: Decimal,
    /// "USD" or "VED"
    pub currency: String,
    pub bank_origin: Option<String>,
    pub destination_account: Option<String>,
    /// Transfer reference, typically the last digits
    #[validate(length(min = 4, max = 20))]
    pub reference: String,
}

/// Invoice representation
#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub plan_id: Uuid,
    pub contract_id: Uuid,
    pub period: String,
    pub detail: String,
    pub amount_usd: Decimal,
    pub amount_paid_usd: Decimal,
    pub amount_pending_usd: Decimal,
    /// Face amount in VED at the issuance snapshot
    pub amount_ved: Decimal,
    pub rate_ved_per_usd: Decimal,
    pub status: String,
    pub issued_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_reference: Option<String>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        let amount_ved = invoice
            .rate_snapshot
            .to_ved(invoice.amount)
            .map(|m| m.rounded().amount())
            .unwrap_or_default();

        InvoiceResponse {
            id: *invoice.id.as_uuid(),
            customer_id: *invoice.customer_id.as_uuid(),
            plan_id: *invoice.plan_id.as_uuid(),
            contract_id: *invoice.contract_id.as_uuid(),
            period: invoice.period,
            detail: invoice.detail,
            amount_usd: invoice.amount.amount(),
            amount_paid_usd: invoice.amount_paid.amount(),
            amount_pending_usd: (invoice.amount - invoice.amount_paid).amount(),
            amount_ved,
            rate_ved_per_usd: invoice.rate_snapshot.ved_per_usd(),
            status: invoice.status.to_string(),
            issued_at: invoice.issued_at,
            due_date: invoice.due_date,
            paid_at: invoice.paid_at,
            payment_reference: invoice.payment_reference,
        }
    }
}

/// Payment representation
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub invoice_id: Uuid,
    pub currency: String,
    pub amount: Decimal,
    pub usd_equivalent: Decimal,
    pub rate_ved_per_usd: Option<Decimal>,
    pub bank_origin: Option<String>,
    pub destination_account: Option<String>,
    pub reference: String,
    pub status: String,
    pub reported_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        PaymentResponse {
            id: *payment.id.as_uuid(),
            customer_id: *payment.customer_id.as_uuid(),
            invoice_id: *payment.invoice_id.as_uuid(),
            currency: payment.amount.currency().code().to_string(),
            amount: payment.amount.amount(),
            usd_equivalent: payment.usd_equivalent.amount(),
            rate_ved_per_usd: payment.rate_snapshot.map(|r| r.ved_per_usd()),
            bank_origin: payment.bank_origin,
            destination_account: payment.destination_account,
            reference: payment.reference,
            status: payment.status.to_string(),
            reported_at: payment.reported_at,
        }
    }
}

/// Applied-payment response: the payment, the invoice after it, and the
/// customer balance after the credit
#[derive(Debug, Serialize)]
pub struct PaymentReceiptResponse {
    pub payment: PaymentResponse,
    pub invoice: InvoiceResponse,
    pub balance_usd: Decimal,
}

/// Balance ledger entry representation
#[derive(Debug, Serialize)]
pub struct LedgerEntryResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub delta_usd: Decimal,
    pub kind: String,
    pub invoice_id: Uuid,
    pub payment_id: Option<Uuid>,
    pub recorded_at: DateTime<Utc>,
}

impl From<BalanceEntry> for LedgerEntryResponse {
    fn from(entry: BalanceEntry) -> Self {
        use domain_billing::BalanceEntryKind;

        let (kind, invoice_id, payment_id) = match entry.kind {
            BalanceEntryKind::InvoiceIssued { invoice_id } => {
                ("invoice_issued", invoice_id, None)
            }
            BalanceEntryKind::PaymentApplied {
                payment_id,
                invoice_id,
            } => ("payment_applied", invoice_id, Some(payment_id)),
        };

        LedgerEntryResponse {
            id: *entry.id.as_uuid(),
            customer_id: *entry.customer_id.as_uuid(),
            delta_usd: entry.delta.amount(),
            kind: kind.to_string(),
            invoice_id: *invoice_id.as_uuid(),
            payment_id: payment_id.map(|p| *p.as_uuid()),
            recorded_at: entry.recorded_at,
        }
    }
}
