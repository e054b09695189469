//! Payment records
//!
//! A payment is an immutable report of funds a customer says they sent
//! against an invoice. Once created, only the verification status may
//! change (an administrator confirming or rejecting the bank movement).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, CustomerId, ExchangeRate, InvoiceId, Money, PaymentId};

use crate::error::BillingError;

/// Verification states of a reported payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Reported by the customer, not yet checked against the bank
    Reported,
    /// Confirmed by an administrator
    Verified,
    /// Rejected by an administrator
    Rejected,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Reported => write!(f, "reported"),
            PaymentStatus::Verified => write!(f, "verified"),
            PaymentStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reported" => Ok(PaymentStatus::Reported),
            "verified" => Ok(PaymentStatus::Verified),
            "rejected" => Ok(PaymentStatus::Rejected),
            other => Err(BillingError::validation(format!(
                "unknown payment status: {other}"
            ))),
        }
    }
}

/// An immutable report of funds received against an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    /// The paying customer
    pub customer_id: CustomerId,
    /// The invoice being paid
    pub invoice_id: InvoiceId,
    /// Amount in the reported currency
    pub amount: Money,
    /// USD-equivalent credited to the ledger
    pub usd_equivalent: Money,
    /// Rate applied when the report was in VED
    pub rate_snapshot: Option<ExchangeRate>,
    /// Bank the transfer originated from
    pub bank_origin: Option<String>,
    /// Account the transfer arrived at
    pub destination_account: Option<String>,
    /// Transfer reference (typically the last digits); unique per invoice
    pub reference: String,
    /// Verification state
    pub status: PaymentStatus,
    /// When the customer reported the payment
    pub reported_at: DateTime<Utc>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a new reported payment
    pub fn new(
        customer_id: CustomerId,
        invoice_id: InvoiceId,
        amount: Money,
        usd_equivalent: Money,
        rate_snapshot: Option<ExchangeRate>,
        reference: impl Into<String>,
    ) -> Result<Self, BillingError> {
        if !amount.is_positive() {
            return Err(BillingError::validation(format!(
                "payment amount must be positive, got {amount}"
            )));
        }
        if usd_equivalent.currency() != Currency::USD {
            return Err(BillingError::validation(
                "usd_equivalent must be denominated in USD",
            ));
        }
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err(BillingError::validation("payment reference is required"));
        }

        let now = Utc::now();
        Ok(Self {
            id: PaymentId::new_v7(),
            customer_id,
            invoice_id,
            amount,
            usd_equivalent,
            rate_snapshot,
            bank_origin: None,
            destination_account: None,
            reference,
            status: PaymentStatus::Reported,
            reported_at: now,
            created_at: now,
        })
    }

    /// Sets the originating bank
    pub fn with_bank_origin(mut self, bank: impl Into<String>) -> Self {
        self.bank_origin = Some(bank.into());
        self
    }

    /// Sets the destination account
    pub fn with_destination_account(mut self, account: impl Into<String>) -> Self {
        self.destination_account = Some(account.into());
        self
    }

    /// Confirms the payment against the bank statement
    pub fn verify(&mut self) -> Result<(), BillingError> {
        match self.status {
            PaymentStatus::Reported => {
                self.status = PaymentStatus::Verified;
                Ok(())
            }
            from => Err(BillingError::InvalidTransition {
                from: from.to_string(),
                to: PaymentStatus::Verified.to_string(),
            }),
        }
    }

    /// Rejects the report
    pub fn reject(&mut self) -> Result<(), BillingError> {
        match self.status {
            PaymentStatus::Reported => {
                self.status = PaymentStatus::Rejected;
                Ok(())
            }
            from => Err(BillingError::InvalidTransition {
                from: from.to_string(),
                to: PaymentStatus::Rejected.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn reported_payment() -> Payment {
        let rate = ExchangeRate::new(dec!(100)).unwrap();
        Payment::new(
            CustomerId::new_v7(),
            InvoiceId::new_v7(),
            Money::ved(dec!(2500)),
            Money::usd(dec!(25)),
            Some(rate),
            "123456",
        )
        .unwrap()
    }

    #[test]
    fn test_new_payment_is_reported() {
        let payment = reported_payment();
        assert_eq!(payment.status, PaymentStatus::Reported);
        assert_eq!(payment.usd_equivalent.amount(), dec!(25));
    }

    #[test]
    fn test_zero_amount_rejected() {
        let result = Payment::new(
            CustomerId::new_v7(),
            InvoiceId::new_v7(),
            Money::usd(dec!(0)),
            Money::usd(dec!(0)),
            None,
            "123456",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_reference_rejected() {
        let result = Payment::new(
            CustomerId::new_v7(),
            InvoiceId::new_v7(),
            Money::usd(dec!(10)),
            Money::usd(dec!(10)),
            None,
            "  ",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_verify_transition() {
        let mut payment = reported_payment();
        payment.verify().unwrap();
        assert_eq!(payment.status, PaymentStatus::Verified);
        // Terminal: cannot reject a verified payment
        assert!(payment.reject().is_err());
    }

    #[test]
    fn test_reject_transition() {
        let mut payment = reported_payment();
        payment.reject().unwrap();
        assert_eq!(payment.status, PaymentStatus::Rejected);
        assert!(payment.verify().is_err());
    }
}
