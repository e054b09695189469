//! Billing Domain - Invoice Lifecycle and Payment Ledger
//!
//! This crate governs the life of invoices and payments against a
//! customer's contract:
//!
//! - **Invoice lifecycle**: invoices are issued against a contract at the
//!   plan's USD price with a 30-day due date and a one-time exchange-rate
//!   snapshot. States move `pending -> paid`, `pending -> overdue`, and
//!   `overdue -> paid`; never backwards.
//! - **Payment application**: customers report payments in USD or VED.
//!   VED amounts are converted at the current rate, credited to the
//!   customer's USD favor balance, and accumulated on the invoice until it
//!   reaches its face value and flips to paid.
//! - **Balance ledger**: every balance mutation is paired with an
//!   append-only [`ledger::BalanceEntry`], so the favor balance can always
//!   be audited.
//! - **Overdue sweep**: a scheduled scan that reminds customers one day
//!   before the due date, marks past-due invoices overdue, and suspends
//!   the associated contract.
//!
//! Mutations are serialized per invoice and per customer by
//! [`service::BillingService`]; two concurrent payment reports against the
//! same invoice cannot lose an update.

pub mod invoice;
pub mod payment;
pub mod ledger;
pub mod rates;
pub mod notify;
pub mod service;
pub mod sweep;
pub mod ports;
pub mod error;

pub use error::BillingError;
pub use invoice::{Invoice, InvoiceStatus};
pub use ledger::{BalanceEntry, BalanceEntryKind};
pub use notify::{LogNotifier, Notifier};
pub use payment::{Payment, PaymentStatus};
pub use ports::BillingStore;
pub use rates::{FixedRateProvider, HttpRateProvider, RateProvider};
pub use service::{BillingService, ReportPaymentRequest};
pub use sweep::{OverdueSweep, SweepReport};
