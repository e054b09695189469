//! Customer Domain
//!
//! This crate models the customers of the internet service provider:
//! identity data (cedula, email), access credentials, the embedded service
//! address, the role used for authorization decisions, and the running
//! USD-equivalent favor balance mutated by the billing ledger.
//!
//! Customers are never hard-deleted; removal is a soft-delete flag so that
//! invoices and payments keep resolving their references.

pub mod customer;
pub mod validation;
pub mod ports;
pub mod error;

pub use customer::{Address, Customer, Role};
pub use error::CustomerError;
pub use ports::CustomerStore;
pub use validation::{CustomerValidator, ValidationResult};
