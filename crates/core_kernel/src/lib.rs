//! Core Kernel - Foundational types for the billing system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic (USD and VED)
//! - Exchange-rate value type for VED/USD conversion
//! - Strongly-typed identifiers
//! - The shared `PortError` used by all store and provider ports

pub mod money;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::{Money, Currency, ExchangeRate, MoneyError};
pub use identifiers::{
    CustomerId, PlanId, ContractId, InvoiceId, PaymentId, LedgerEntryId,
};
pub use error::CoreError;
pub use ports::{PortError, DomainPort};
