//! Database Infrastructure
//!
//! PostgreSQL adapters for the domain store ports using SQLx. Queries are
//! bound at runtime (no compile-time verification), so the workspace
//! builds without a live database; the schema lives in `migrations/`.

pub mod pool;
pub mod error;
pub mod repositories;

pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
pub use repositories::billing::PgBillingStore;
pub use repositories::catalog::{PgContractStore, PgPlanStore};
pub use repositories::customer::PgCustomerStore;
