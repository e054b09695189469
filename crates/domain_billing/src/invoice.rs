//! Invoice entity and its state machine
//!
//! # Invariants
//!
//! - `amount_paid` is monotonically non-decreasing
//! - Transitions are `pending -> paid`, `pending -> overdue`,
//!   `overdue -> paid`; a paid invoice never changes state again
//! - The exchange-rate snapshot is captured once at issuance

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ContractId, Currency, CustomerId, ExchangeRate, InvoiceId, Money, PlanId};
use domain_catalog::{Contract, Plan};

use crate::error::BillingError;

/// Days between issuance and the payment deadline
pub const PAYMENT_TERM_DAYS: i64 = 30;

/// Invoice lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Issued, awaiting payment
    Pending,
    /// Fully paid
    Paid,
    /// Past the due date without full payment
    Overdue,
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Pending => write!(f, "pending"),
            InvoiceStatus::Paid => write!(f, "paid"),
            InvoiceStatus::Overdue => write!(f, "overdue"),
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            other => Err(BillingError::validation(format!(
                "unknown invoice status: {other}"
            ))),
        }
    }
}

/// A billing document for one service period
///
/// The face amount is the plan's USD price at issuance. `amount_paid`
/// accumulates USD-equivalent payments; once it reaches the face amount
/// the invoice flips to paid. Invoices are financial records and are
/// never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// The billed customer
    pub customer_id: CustomerId,
    /// The contracted plan the price was taken from
    pub plan_id: PlanId,
    /// The contract this invoice bills
    pub contract_id: ContractId,
    /// Billing period label, e.g. "11-2025"
    pub period: String,
    /// Human-readable detail line, e.g. "BASIC 100 MBPS 11-2025"
    pub detail: String,
    /// Face amount in USD
    pub amount: Money,
    /// USD-equivalent paid to date; never decreases
    pub amount_paid: Money,
    /// VED-per-USD rate captured at issuance
    pub rate_snapshot: ExchangeRate,
    /// Lifecycle state
    pub status: InvoiceStatus,
    /// Issue timestamp
    pub issued_at: DateTime<Utc>,
    /// Payment deadline (issue + 30 days)
    pub due_date: DateTime<Utc>,
    /// Set when the invoice transitions to paid
    pub paid_at: Option<DateTime<Utc>>,
    /// Reference reported with the settling payment
    pub payment_reference: Option<String>,
    /// Whether the due-date reminder has been sent
    pub reminder_sent: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Issues a new pending invoice for a contract
    ///
    /// The face amount is the plan's current USD price and the due date is
    /// fixed at issue + 30 days. The exchange rate is captured here and
    /// not re-queried.
    pub fn issue(contract: &Contract, plan: &Plan, rate: ExchangeRate) -> Self {
        let now = Utc::now();
        let period = format!("{:02}-{}", now.month(), now.year());
        let detail = format!("{} {}", plan.name.to_uppercase(), period);

        Self {
            id: InvoiceId::new_v7(),
            customer_id: contract.customer_id,
            plan_id: plan.id,
            contract_id: contract.id,
            period,
            detail,
            amount: plan.price_usd,
            amount_paid: Money::zero(Currency::USD),
            rate_snapshot: rate,
            status: InvoiceStatus::Pending,
            issued_at: now,
            due_date: now + chrono::Duration::days(PAYMENT_TERM_DAYS),
            paid_at: None,
            payment_reference: None,
            reminder_sent: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Accumulates a USD-equivalent payment on the invoice
    ///
    /// Returns true when this payment pushed the invoice over its face
    /// amount and it transitioned to paid.
    pub fn record_payment(&mut self, usd_amount: Money) -> Result<bool, BillingError> {
        if usd_amount.currency() != Currency::USD || !usd_amount.is_positive() {
            return Err(BillingError::validation(format!(
                "payment must be a positive USD amount, got {usd_amount}"
            )));
        }
        if self.status == InvoiceStatus::Paid {
            return Err(BillingError::validation(format!(
                "invoice {} is already paid",
                self.id
            )));
        }

        self.amount_paid = self.amount_paid.checked_add(&usd_amount)?;
        self.updated_at = Utc::now();

        if self.amount_paid.amount() >= self.amount.amount() {
            self.status = InvoiceStatus::Paid;
            self.paid_at = Some(Utc::now());
            return Ok(true);
        }

        Ok(false)
    }

    /// Marks the invoice paid outside of payment application
    ///
    /// Administrative settlement: allowed from pending or overdue.
    pub fn mark_paid(&mut self, reference: Option<String>) -> Result<(), BillingError> {
        match self.status {
            InvoiceStatus::Pending | InvoiceStatus::Overdue => {
                self.status = InvoiceStatus::Paid;
                self.paid_at = Some(Utc::now());
                if reference.is_some() {
                    self.payment_reference = reference;
                }
                self.updated_at = Utc::now();
                Ok(())
            }
            from => Err(BillingError::InvalidTransition {
                from: from.to_string(),
                to: InvoiceStatus::Paid.to_string(),
            }),
        }
    }

    /// Moves a pending invoice past its due date
    pub fn mark_overdue(&mut self) -> Result<(), BillingError> {
        match self.status {
            InvoiceStatus::Pending => {
                self.status = InvoiceStatus::Overdue;
                self.updated_at = Utc::now();
                Ok(())
            }
            from => Err(BillingError::InvalidTransition {
                from: from.to_string(),
                to: InvoiceStatus::Overdue.to_string(),
            }),
        }
    }

    /// Records that the due-date reminder went out
    pub fn mark_reminder_sent(&mut self) {
        self.reminder_sent = true;
        self.updated_at = Utc::now();
    }

    /// Whole days remaining until the due date, rounded up
    ///
    /// 1 means the invoice is due tomorrow; 0 or negative means it is due
    /// today or already past due.
    pub fn days_until_due(&self, now: DateTime<Utc>) -> i64 {
        let secs = (self.due_date - now).num_seconds();
        secs.div_euclid(86_400) + i64::from(secs.rem_euclid(86_400) > 0)
    }

    /// Outstanding USD amount
    pub fn balance_due(&self) -> Money {
        self.amount - self.amount_paid
    }

    /// Face amount expressed in VED at the issuance snapshot
    pub fn amount_ved(&self) -> Result<Money, BillingError> {
        Ok(self.rate_snapshot.to_ved(self.amount)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{CustomerId, ExchangeRate};
    use domain_catalog::{Contract, Plan, PlanCategory};
    use rust_decimal_macros::dec;

    fn issue_test_invoice(price: rust_decimal::Decimal) -> Invoice {
        let plan = Plan::new("Basic 100 Mbps", 100, Money::usd(price), PlanCategory::Home);
        let contract = Contract::new(CustomerId::new_v7(), plan.id);
        let rate = ExchangeRate::new(dec!(100)).unwrap();
        Invoice::issue(&contract, &plan, rate)
    }

    #[test]
    fn test_issue_defaults() {
        let invoice = issue_test_invoice(dec!(25));

        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.amount, Money::usd(dec!(25)));
        assert!(invoice.amount_paid.is_zero());
        assert!(!invoice.reminder_sent);
        assert!(invoice.paid_at.is_none());
        assert_eq!(
            (invoice.due_date - invoice.issued_at).num_days(),
            PAYMENT_TERM_DAYS
        );
        assert!(invoice.detail.starts_with("BASIC 100 MBPS"));
    }

    #[test]
    fn test_partial_payment_keeps_pending() {
        let mut invoice = issue_test_invoice(dec!(25));
        let became_paid = invoice.record_payment(Money::usd(dec!(10))).unwrap();

        assert!(!became_paid);
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.amount_paid.amount(), dec!(10));
        assert_eq!(invoice.balance_due().amount(), dec!(15));
    }

    #[test]
    fn test_full_payment_transitions_to_paid() {
        let mut invoice = issue_test_invoice(dec!(25));
        let became_paid = invoice.record_payment(Money::usd(dec!(25))).unwrap();

        assert!(became_paid);
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert!(invoice.paid_at.is_some());
    }

    #[test]
    fn test_overpayment_is_not_clamped() {
        let mut invoice = issue_test_invoice(dec!(25));
        invoice.record_payment(Money::usd(dec!(40))).unwrap();
        assert_eq!(invoice.amount_paid.amount(), dec!(40));
        assert_eq!(invoice.status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_payment_against_paid_invoice_rejected() {
        let mut invoice = issue_test_invoice(dec!(25));
        invoice.record_payment(Money::usd(dec!(25))).unwrap();
        assert!(invoice.record_payment(Money::usd(dec!(5))).is_err());
    }

    #[test]
    fn test_non_positive_payment_rejected() {
        let mut invoice = issue_test_invoice(dec!(25));
        assert!(invoice.record_payment(Money::usd(dec!(0))).is_err());
        assert!(invoice.record_payment(Money::usd(dec!(-5))).is_err());
    }

    #[test]
    fn test_ved_payment_amount_rejected() {
        let mut invoice = issue_test_invoice(dec!(25));
        assert!(invoice.record_payment(Money::ved(dec!(2500))).is_err());
    }

    #[test]
    fn test_overdue_then_paid() {
        let mut invoice = issue_test_invoice(dec!(25));
        invoice.mark_overdue().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Overdue);

        // An overdue invoice settles directly to paid, never back to pending
        invoice.record_payment(Money::usd(dec!(25))).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_paid_is_terminal() {
        let mut invoice = issue_test_invoice(dec!(25));
        invoice.mark_paid(Some("REF123".to_string())).unwrap();

        assert!(invoice.mark_overdue().is_err());
        assert!(invoice.mark_paid(None).is_err());
    }

    #[test]
    fn test_overdue_from_overdue_rejected() {
        let mut invoice = issue_test_invoice(dec!(25));
        invoice.mark_overdue().unwrap();
        assert!(invoice.mark_overdue().is_err());
    }

    #[test]
    fn test_days_until_due() {
        let invoice = issue_test_invoice(dec!(25));
        let now = invoice.issued_at;

        assert_eq!(invoice.days_until_due(now), PAYMENT_TERM_DAYS);
        assert_eq!(
            invoice.days_until_due(invoice.due_date - chrono::Duration::hours(20)),
            1
        );
        assert_eq!(invoice.days_until_due(invoice.due_date), 0);
        assert_eq!(
            invoice.days_until_due(invoice.due_date + chrono::Duration::days(2)),
            -2
        );
    }

    #[test]
    fn test_amount_ved_uses_snapshot() {
        let invoice = issue_test_invoice(dec!(25));
        assert_eq!(invoice.amount_ved().unwrap().amount(), dec!(2500));
    }
}
