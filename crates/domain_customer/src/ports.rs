//! Customer domain port
//!
//! The `CustomerStore` trait defines what the customer domain needs from a
//! data source. Two adapters implement it: the PostgreSQL repository in
//! `infra_db` and the in-memory store in this module, used by tests and
//! by local runs without a database.

use async_trait::async_trait;

use core_kernel::{CustomerId, DomainPort, Money, PortError};

use crate::customer::Customer;

/// Storage port for customer accounts
///
/// Uniqueness of cedula and email is enforced at creation time: `create`
/// returns `PortError::Conflict` when either is already registered.
/// `adjust_balance` must be atomic with respect to concurrent adjustments
/// of the same customer.
#[async_trait]
pub trait CustomerStore: DomainPort {
    /// Retrieves a customer by ID
    async fn get(&self, id: CustomerId) -> Result<Customer, PortError>;

    /// Finds a customer by email, if registered
    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, PortError>;

    /// Finds a customer by cedula, if registered
    async fn find_by_cedula(&self, cedula: &str) -> Result<Option<Customer>, PortError>;

    /// Lists all customers, including soft-deleted ones
    async fn list(&self) -> Result<Vec<Customer>, PortError>;

    /// Creates a new customer account
    async fn create(&self, customer: &Customer) -> Result<(), PortError>;

    /// Replaces the stored record for an existing customer
    async fn update(&self, customer: &Customer) -> Result<(), PortError>;

    /// Applies a signed USD delta to the customer's favor balance
    ///
    /// Returns the balance after the adjustment.
    async fn adjust_balance(&self, id: CustomerId, delta: Money) -> Result<Money, PortError>;

    /// Soft-deletes the account; the record and its history remain
    async fn soft_delete(&self, id: CustomerId) -> Result<(), PortError>;
}

/// In-memory implementation of `CustomerStore`
///
/// Mutations take the write lock for their full duration, so balance
/// adjustments are serialized the same way the database adapter serializes
/// them with an atomic UPDATE.
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    /// In-memory customer store
    #[derive(Debug, Default)]
    pub struct MemoryCustomerStore {
        customers: RwLock<HashMap<CustomerId, Customer>>,
    }

    impl MemoryCustomerStore {
        /// Creates an empty store
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates the store for tests
        pub async fn with_customers(customers: Vec<Customer>) -> Self {
            let store = Self::new();
            {
                let mut map = store.customers.write().await;
                for customer in customers {
                    map.insert(customer.id, customer);
                }
            }
            store
        }
    }

    impl DomainPort for MemoryCustomerStore {}

    #[async_trait]
    impl CustomerStore for MemoryCustomerStore {
        async fn get(&self, id: CustomerId) -> Result<Customer, PortError> {
            self.customers
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Customer", id))
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, PortError> {
            Ok(self
                .customers
                .read()
                .await
                .values()
                .find(|c| c.email == email)
                .cloned())
        }

        async fn find_by_cedula(&self, cedula: &str) -> Result<Option<Customer>, PortError> {
            Ok(self
                .customers
                .read()
                .await
                .values()
                .find(|c| c.cedula == cedula)
                .cloned())
        }

        async fn list(&self) -> Result<Vec<Customer>, PortError> {
            let mut customers: Vec<_> = self.customers.read().await.values().cloned().collect();
            customers.sort_by_key(|c| c.created_at);
            Ok(customers)
        }

        async fn create(&self, customer: &Customer) -> Result<(), PortError> {
            let mut customers = self.customers.write().await;
            if customers.values().any(|c| c.cedula == customer.cedula) {
                return Err(PortError::conflict(format!(
                    "cedula already registered: {}",
                    customer.cedula
                )));
            }
            if customers.values().any(|c| c.email == customer.email) {
                return Err(PortError::conflict(format!(
                    "email already registered: {}",
                    customer.email
                )));
            }
            customers.insert(customer.id, customer.clone());
            Ok(())
        }

        async fn update(&self, customer: &Customer) -> Result<(), PortError> {
            let mut customers = self.customers.write().await;
            if !customers.contains_key(&customer.id) {
                return Err(PortError::not_found("Customer", customer.id));
            }
            customers.insert(customer.id, customer.clone());
            Ok(())
        }

        async fn adjust_balance(&self, id: CustomerId, delta: Money) -> Result<Money, PortError> {
            let mut customers = self.customers.write().await;
            let customer = customers
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Customer", id))?;

            customer
                .apply_balance_delta(delta)
                .map_err(|e| PortError::validation(e.to_string()))?;

            Ok(customer.balance_usd)
        }

        async fn soft_delete(&self, id: CustomerId) -> Result<(), PortError> {
            let mut customers = self.customers.write().await;
            let customer = customers
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Customer", id))?;
            customer.soft_delete();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryCustomerStore;
    use super::*;
    use rust_decimal_macros::dec;

    fn test_customer(cedula: &str, email: &str) -> Customer {
        Customer::new(cedula, email, "hash", "Ana", "Moreno")
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryCustomerStore::new();
        let customer = test_customer("12345678", "ana@example.com");

        store.create(&customer).await.unwrap();
        let found = store.get(customer.id).await.unwrap();
        assert_eq!(found.email, "ana@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_cedula_conflicts() {
        let store = MemoryCustomerStore::new();
        store
            .create(&test_customer("12345678", "ana@example.com"))
            .await
            .unwrap();

        let result = store
            .create(&test_customer("12345678", "other@example.com"))
            .await;
        assert!(matches!(result, Err(PortError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryCustomerStore::new();
        store
            .create(&test_customer("12345678", "ana@example.com"))
            .await
            .unwrap();

        let result = store
            .create(&test_customer("87654321", "ana@example.com"))
            .await;
        assert!(matches!(result, Err(PortError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_adjust_balance() {
        let store = MemoryCustomerStore::new();
        let customer = test_customer("12345678", "ana@example.com");
        store.create(&customer).await.unwrap();

        let balance = store
            .adjust_balance(customer.id, Money::usd(dec!(-25)))
            .await
            .unwrap();
        assert_eq!(balance.amount(), dec!(-25));

        let balance = store
            .adjust_balance(customer.id, Money::usd(dec!(25)))
            .await
            .unwrap();
        assert!(balance.is_zero());
    }

    #[tokio::test]
    async fn test_soft_delete_keeps_record() {
        let store = MemoryCustomerStore::new();
        let customer = test_customer("12345678", "ana@example.com");
        store.create(&customer).await.unwrap();

        store.soft_delete(customer.id).await.unwrap();
        let found = store.get(customer.id).await.unwrap();
        assert!(found.deleted);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryCustomerStore::new();
        let result = store.get(CustomerId::new_v7()).await;
        assert!(result.unwrap_err().is_not_found());
    }
}
