//! Balance ledger entries
//!
//! Every mutation of a customer's favor balance is paired with an
//! append-only entry recording the signed delta and its cause. The entries
//! are the audit trail behind the cached `balance_usd` on the customer:
//! summing a customer's entries must always reproduce their balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, CustomerId, InvoiceId, LedgerEntryId, Money, PaymentId};

/// What caused a balance mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BalanceEntryKind {
    /// An invoice was issued; the customer was debited its face amount
    InvoiceIssued { invoice_id: InvoiceId },
    /// A payment was applied; the customer was credited its USD equivalent
    PaymentApplied {
        payment_id: PaymentId,
        invoice_id: InvoiceId,
    },
}

/// One append-only mutation of a customer's favor balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceEntry {
    /// Unique identifier
    pub id: LedgerEntryId,
    /// The affected customer
    pub customer_id: CustomerId,
    /// Signed USD delta applied to the balance
    pub delta: Money,
    /// The cause of the mutation
    pub kind: BalanceEntryKind,
    /// When the mutation was applied
    pub recorded_at: DateTime<Utc>,
}

impl BalanceEntry {
    /// Entry for an invoice issuance: debits the face amount
    pub fn invoice_issued(customer_id: CustomerId, invoice_id: InvoiceId, amount: Money) -> Self {
        Self {
            id: LedgerEntryId::new_v7(),
            customer_id,
            delta: -amount,
            kind: BalanceEntryKind::InvoiceIssued { invoice_id },
            recorded_at: Utc::now(),
        }
    }

    /// Entry for an applied payment: credits the USD equivalent
    pub fn payment_applied(
        customer_id: CustomerId,
        payment_id: PaymentId,
        invoice_id: InvoiceId,
        usd_equivalent: Money,
    ) -> Self {
        Self {
            id: LedgerEntryId::new_v7(),
            customer_id,
            delta: usd_equivalent,
            kind: BalanceEntryKind::PaymentApplied {
                payment_id,
                invoice_id,
            },
            recorded_at: Utc::now(),
        }
    }

    /// Returns true if this entry debits the customer
    pub fn is_debit(&self) -> bool {
        self.delta.is_negative()
    }
}

/// Sums a slice of entries into a net USD delta
pub fn net_delta(entries: &[BalanceEntry]) -> Money {
    entries
        .iter()
        .fold(Money::zero(Currency::USD), |acc, e| acc + e.delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_issuance_debits() {
        let entry = BalanceEntry::invoice_issued(
            CustomerId::new_v7(),
            InvoiceId::new_v7(),
            Money::usd(dec!(25)),
        );
        assert!(entry.is_debit());
        assert_eq!(entry.delta.amount(), dec!(-25));
    }

    #[test]
    fn test_payment_credits() {
        let entry = BalanceEntry::payment_applied(
            CustomerId::new_v7(),
            PaymentId::new_v7(),
            InvoiceId::new_v7(),
            Money::usd(dec!(25)),
        );
        assert!(!entry.is_debit());
        assert_eq!(entry.delta.amount(), dec!(25));
    }

    #[test]
    fn test_net_delta_balances_out() {
        let customer_id = CustomerId::new_v7();
        let invoice_id = InvoiceId::new_v7();
        let entries = vec![
            BalanceEntry::invoice_issued(customer_id, invoice_id, Money::usd(dec!(25))),
            BalanceEntry::payment_applied(
                customer_id,
                PaymentId::new_v7(),
                invoice_id,
                Money::usd(dec!(25)),
            ),
        ];
        assert!(net_delta(&entries).is_zero());
    }
}
