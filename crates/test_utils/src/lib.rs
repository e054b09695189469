//! Shared test utilities for the billing system
//!
//! Builders for domain entities and a harness that assembles the billing
//! service over the in-memory store adapters.

pub mod builders;
pub mod harness;

pub use builders::{ContractBuilder, CustomerBuilder, PlanBuilder};
pub use harness::BillingHarness;
