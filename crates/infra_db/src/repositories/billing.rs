//! Billing repository
//!
//! Invoices, payments, and balance ledger entries. The unique index on
//! (invoice_id, reference) turns a double-reported payment into a
//! `Conflict` at the database boundary as well as in the service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{
    ContractId, Currency, CustomerId, ExchangeRate, InvoiceId, LedgerEntryId, Money, PaymentId,
    PlanId, PortError,
};
use domain_billing::ledger::{BalanceEntry, BalanceEntryKind};
use domain_billing::{BillingStore, Invoice, InvoiceStatus, Payment, PaymentStatus};

use crate::error::map_sqlx_error;

/// PostgreSQL adapter for `BillingStore`
#[derive(Debug, Clone)]
pub struct PgBillingStore {
    pool: PgPool,
}

impl PgBillingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct InvoiceRow {
    id: Uuid,
    customer_id: Uuid,
    plan_id: Uuid,
    contract_id: Uuid,
    period: String,
    detail: String,
    amount_usd: Decimal,
    amount_paid_usd: Decimal,
    rate_snapshot: Decimal,
    status: String,
    issued_at: DateTime<Utc>,
    due_date: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    payment_reference: Option<String>,
    reminder_sent: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_entity(self) -> Result<Invoice, PortError> {
        let status: InvoiceStatus = self
            .status
            .parse()
            .map_err(|_| PortError::internal(format!("unknown invoice status: {}", self.status)))?;
        let rate_snapshot = ExchangeRate::new(self.rate_snapshot)
            .map_err(|e| PortError::internal(format!("bad rate snapshot in row: {e}")))?;

        Ok(Invoice {
            id: InvoiceId::from_uuid(self.id),
            customer_id: CustomerId::from_uuid(self.customer_id),
            plan_id: PlanId::from_uuid(self.plan_id),
            contract_id: ContractId::from_uuid(self.contract_id),
            period: self.period,
            detail: self.detail,
            amount: Money::usd(self.amount_usd),
            amount_paid: Money::usd(self.amount_paid_usd),
            rate_snapshot,
            status,
            issued_at: self.issued_at,
            due_date: self.due_date,
            paid_at: self.paid_at,
            payment_reference: self.payment_reference,
            reminder_sent: self.reminder_sent,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PaymentRow {
    id: Uuid,
    customer_id: Uuid,
    invoice_id: Uuid,
    currency: String,
    amount: Decimal,
    usd_equivalent: Decimal,
    rate_snapshot: Option<Decimal>,
    bank_origin: Option<String>,
    destination_account: Option<String>,
    reference: String,
    status: String,
    reported_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_entity(self) -> Result<Payment, PortError> {
        let currency: Currency = self
            .currency
            .parse()
            .map_err(|_| PortError::internal(format!("unknown currency: {}", self.currency)))?;
        let status: PaymentStatus = self
            .status
            .parse()
            .map_err(|_| PortError::internal(format!("unknown payment status: {}", self.status)))?;
        let rate_snapshot = self
            .rate_snapshot
            .map(ExchangeRate::new)
            .transpose()
            .map_err(|e| PortError::internal(format!("bad rate snapshot in row: {e}")))?;

        Ok(Payment {
            id: PaymentId::from_uuid(self.id),
            customer_id: CustomerId::from_uuid(self.customer_id),
            invoice_id: InvoiceId::from_uuid(self.invoice_id),
            amount: Money::new(self.amount, currency),
            usd_equivalent: Money::usd(self.usd_equivalent),
            rate_snapshot,
            bank_origin: self.bank_origin,
            destination_account: self.destination_account,
            reference: self.reference,
            status,
            reported_at: self.reported_at,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct BalanceEntryRow {
    id: Uuid,
    customer_id: Uuid,
    delta_usd: Decimal,
    invoice_id: Option<Uuid>,
    payment_id: Option<Uuid>,
    recorded_at: DateTime<Utc>,
}

impl BalanceEntryRow {
    fn into_entity(self) -> Result<BalanceEntry, PortError> {
        let invoice_id = self
            .invoice_id
            .map(InvoiceId::from_uuid)
            .ok_or_else(|| PortError::internal("balance entry without invoice reference"))?;
        let kind = match self.payment_id {
            Some(payment_id) => BalanceEntryKind::PaymentApplied {
                payment_id: PaymentId::from_uuid(payment_id),
                invoice_id,
            },
            None => BalanceEntryKind::InvoiceIssued { invoice_id },
        };

        Ok(BalanceEntry {
            id: LedgerEntryId::from_uuid(self.id),
            customer_id: CustomerId::from_uuid(self.customer_id),
            delta: Money::usd(self.delta_usd),
            kind,
            recorded_at: self.recorded_at,
        })
    }
}

const SELECT_INVOICE: &str = r#"
    SELECT id, customer_id, plan_id, contract_id, period, detail,
           amount_usd, amount_paid_usd, rate_snapshot, status,
           issued_at, due_date, paid_at, payment_reference, reminder_sent,
           created_at, updated_at
    FROM invoices
"#;

const SELECT_PAYMENT: &str = r#"
    SELECT id, customer_id, invoice_id, currency, amount, usd_equivalent,
           rate_snapshot, bank_origin, destination_account, reference,
           status, reported_at, created_at
    FROM payments
"#;

impl core_kernel::DomainPort for PgBillingStore {}

#[async_trait]
impl BillingStore for PgBillingStore {
    async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError> {
        let row: InvoiceRow = sqlx::query_as(&format!("{SELECT_INVOICE} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Invoice", id))?;
        row.into_entity()
    }

    async fn list_invoices(&self) -> Result<Vec<Invoice>, PortError> {
        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!("{SELECT_INVOICE} ORDER BY issued_at"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Invoice", "all"))?;
        rows.into_iter().map(InvoiceRow::into_entity).collect()
    }

    async fn list_invoices_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Invoice>, PortError> {
        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!(
            "{SELECT_INVOICE} WHERE customer_id = $1 ORDER BY issued_at"
        ))
        .bind(customer_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Invoice", customer_id))?;
        rows.into_iter().map(InvoiceRow::into_entity).collect()
    }

    async fn list_invoices_by_status(
        &self,
        status: InvoiceStatus,
    ) -> Result<Vec<Invoice>, PortError> {
        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!(
            "{SELECT_INVOICE} WHERE status = $1 ORDER BY issued_at"
        ))
        .bind(status.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Invoice", status))?;
        rows.into_iter().map(InvoiceRow::into_entity).collect()
    }

    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, customer_id, plan_id, contract_id, period, detail,
                amount_usd, amount_paid_usd, rate_snapshot, status,
                issued_at, due_date, paid_at, payment_reference, reminder_sent,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(invoice.customer_id.as_uuid())
        .bind(invoice.plan_id.as_uuid())
        .bind(invoice.contract_id.as_uuid())
        .bind(&invoice.period)
        .bind(&invoice.detail)
        .bind(invoice.amount.amount())
        .bind(invoice.amount_paid.amount())
        .bind(invoice.rate_snapshot.ved_per_usd())
        .bind(invoice.status.to_string())
        .bind(invoice.issued_at)
        .bind(invoice.due_date)
        .bind(invoice.paid_at)
        .bind(&invoice.payment_reference)
        .bind(invoice.reminder_sent)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Invoice", invoice.id))?;

        Ok(())
    }

    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            UPDATE invoices SET
                amount_paid_usd = $2, status = $3, paid_at = $4,
                payment_reference = $5, reminder_sent = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(invoice.amount_paid.amount())
        .bind(invoice.status.to_string())
        .bind(invoice.paid_at)
        .bind(&invoice.payment_reference)
        .bind(invoice.reminder_sent)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Invoice", invoice.id))?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Invoice", invoice.id));
        }
        Ok(())
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError> {
        let row: PaymentRow = sqlx::query_as(&format!("{SELECT_PAYMENT} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Payment", id))?;
        row.into_entity()
    }

    async fn insert_payment(&self, payment: &Payment) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, customer_id, invoice_id, currency, amount, usd_equivalent,
                rate_snapshot, bank_origin, destination_account, reference,
                status, reported_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.customer_id.as_uuid())
        .bind(payment.invoice_id.as_uuid())
        .bind(payment.amount.currency().code())
        .bind(payment.amount.amount())
        .bind(payment.usd_equivalent.amount())
        .bind(payment.rate_snapshot.map(|r| r.ved_per_usd()))
        .bind(&payment.bank_origin)
        .bind(&payment.destination_account)
        .bind(&payment.reference)
        .bind(payment.status.to_string())
        .bind(payment.reported_at)
        .bind(payment.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Payment", payment.id))?;

        Ok(())
    }

    async fn update_payment(&self, payment: &Payment) -> Result<(), PortError> {
        let result = sqlx::query("UPDATE payments SET status = $2 WHERE id = $1")
            .bind(payment.id.as_uuid())
            .bind(payment.status.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Payment", payment.id))?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Payment", payment.id));
        }
        Ok(())
    }

    async fn list_payments_for_invoice(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Vec<Payment>, PortError> {
        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            "{SELECT_PAYMENT} WHERE invoice_id = $1 ORDER BY reported_at"
        ))
        .bind(invoice_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Payment", invoice_id))?;
        rows.into_iter().map(PaymentRow::into_entity).collect()
    }

    async fn append_ledger_entry(&self, entry: &BalanceEntry) -> Result<(), PortError> {
        let (invoice_id, payment_id) = match entry.kind {
            BalanceEntryKind::InvoiceIssued { invoice_id } => (invoice_id, None),
            BalanceEntryKind::PaymentApplied {
                payment_id,
                invoice_id,
            } => (invoice_id, Some(payment_id)),
        };

        sqlx::query(
            r#"
            INSERT INTO balance_entries (id, customer_id, delta_usd, invoice_id, payment_id, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.customer_id.as_uuid())
        .bind(entry.delta.amount())
        .bind(invoice_id.as_uuid())
        .bind(payment_id.map(|p| *p.as_uuid()))
        .bind(entry.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "BalanceEntry", entry.id))?;

        Ok(())
    }

    async fn list_ledger_entries(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<BalanceEntry>, PortError> {
        let rows: Vec<BalanceEntryRow> = sqlx::query_as(
            r#"
            SELECT id, customer_id, delta_usd, invoice_id, payment_id, recorded_at
            FROM balance_entries
            WHERE customer_id = $1
            ORDER BY recorded_at
            "#,
        )
        .bind(customer_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "BalanceEntry", customer_id))?;
        rows.into_iter().map(BalanceEntryRow::into_entity).collect()
    }
}
