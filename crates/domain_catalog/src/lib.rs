//! Catalog Domain
//!
//! Service plans offered to subscribers and the contracts that bind a
//! customer to a plan. The contract carries the suspension state: the
//! overdue sweep suspends it, and a paid invoice reactivates it. Plan
//! deactivation only removes the plan from the offer; it never alters
//! contracts or invoices that already reference it.

pub mod plan;
pub mod contract;
pub mod ports;
pub mod error;

pub use contract::{Contract, ContractStatus};
pub use error::CatalogError;
pub use plan::{Plan, PlanCategory};
pub use ports::{ContractStore, PlanStore};
