//! Catalog domain ports
//!
//! `PlanStore` and `ContractStore` define what the catalog domain needs
//! from a data source. The in-memory adapters here back tests and local
//! runs; `infra_db` provides the PostgreSQL adapters.

use async_trait::async_trait;

use core_kernel::{ContractId, CustomerId, DomainPort, PlanId, PortError};

use crate::contract::Contract;
use crate::plan::Plan;

/// Storage port for service plans
#[async_trait]
pub trait PlanStore: DomainPort {
    /// Retrieves a plan by ID
    async fn get(&self, id: PlanId) -> Result<Plan, PortError>;

    /// Lists plans; `active_only` filters out deactivated ones
    async fn list(&self, active_only: bool) -> Result<Vec<Plan>, PortError>;

    /// Creates a new plan; the name must be unique
    async fn create(&self, plan: &Plan) -> Result<(), PortError>;

    /// Replaces the stored record for an existing plan
    async fn update(&self, plan: &Plan) -> Result<(), PortError>;
}

/// Storage port for contracts
///
/// `create` enforces the one-open-contract-per-customer invariant and
/// returns `PortError::Conflict` when violated.
#[async_trait]
pub trait ContractStore: DomainPort {
    /// Retrieves a contract by ID
    async fn get(&self, id: ContractId) -> Result<Contract, PortError>;

    /// Finds the customer's open (non-finalized) contract, if any
    async fn find_open_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<Contract>, PortError>;

    /// Lists all contracts
    async fn list(&self) -> Result<Vec<Contract>, PortError>;

    /// Creates a new contract
    async fn create(&self, contract: &Contract) -> Result<(), PortError>;

    /// Replaces the stored record for an existing contract
    async fn update(&self, contract: &Contract) -> Result<(), PortError>;
}

/// In-memory implementations of the catalog ports
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    /// In-memory plan store
    #[derive(Debug, Default)]
    pub struct MemoryPlanStore {
        plans: RwLock<HashMap<PlanId, Plan>>,
    }

    impl MemoryPlanStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates the store for tests
        pub async fn with_plans(plans: Vec<Plan>) -> Self {
            let store = Self::new();
            {
                let mut map = store.plans.write().await;
                for plan in plans {
                    map.insert(plan.id, plan);
                }
            }
            store
        }
    }

    impl DomainPort for MemoryPlanStore {}

    #[async_trait]
    impl PlanStore for MemoryPlanStore {
        async fn get(&self, id: PlanId) -> Result<Plan, PortError> {
            self.plans
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Plan", id))
        }

        async fn list(&self, active_only: bool) -> Result<Vec<Plan>, PortError> {
            let mut plans: Vec<_> = self
                .plans
                .read()
                .await
                .values()
                .filter(|p| !active_only || p.active)
                .cloned()
                .collect();
            plans.sort_by_key(|p| p.created_at);
            Ok(plans)
        }

        async fn create(&self, plan: &Plan) -> Result<(), PortError> {
            let mut plans = self.plans.write().await;
            if plans.values().any(|p| p.name == plan.name) {
                return Err(PortError::conflict(format!(
                    "plan name already exists: {}",
                    plan.name
                )));
            }
            plans.insert(plan.id, plan.clone());
            Ok(())
        }

        async fn update(&self, plan: &Plan) -> Result<(), PortError> {
            let mut plans = self.plans.write().await;
            if !plans.contains_key(&plan.id) {
                return Err(PortError::not_found("Plan", plan.id));
            }
            plans.insert(plan.id, plan.clone());
            Ok(())
        }
    }

    /// In-memory contract store
    #[derive(Debug, Default)]
    pub struct MemoryContractStore {
        contracts: RwLock<HashMap<ContractId, Contract>>,
    }

    impl MemoryContractStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates the store for tests
        pub async fn with_contracts(contracts: Vec<Contract>) -> Self {
            let store = Self::new();
            {
                let mut map = store.contracts.write().await;
                for contract in contracts {
                    map.insert(contract.id, contract);
                }
            }
            store
        }
    }

    impl DomainPort for MemoryContractStore {}

    #[async_trait]
    impl ContractStore for MemoryContractStore {
        async fn get(&self, id: ContractId) -> Result<Contract, PortError> {
            self.contracts
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Contract", id))
        }

        async fn find_open_by_customer(
            &self,
            customer_id: CustomerId,
        ) -> Result<Option<Contract>, PortError> {
            Ok(self
                .contracts
                .read()
                .await
                .values()
                .find(|c| c.customer_id == customer_id && c.is_open())
                .cloned())
        }

        async fn list(&self) -> Result<Vec<Contract>, PortError> {
            let mut contracts: Vec<_> = self.contracts.read().await.values().cloned().collect();
            contracts.sort_by_key(|c| c.created_at);
            Ok(contracts)
        }

        async fn create(&self, contract: &Contract) -> Result<(), PortError> {
            let mut contracts = self.contracts.write().await;
            if contracts
                .values()
                .any(|c| c.customer_id == contract.customer_id && c.is_open())
            {
                return Err(PortError::conflict(format!(
                    "customer already has an open contract: {}",
                    contract.customer_id
                )));
            }
            contracts.insert(contract.id, contract.clone());
            Ok(())
        }

        async fn update(&self, contract: &Contract) -> Result<(), PortError> {
            let mut contracts = self.contracts.write().await;
            if !contracts.contains_key(&contract.id) {
                return Err(PortError::not_found("Contract", contract.id));
            }
            contracts.insert(contract.id, contract.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::{MemoryContractStore, MemoryPlanStore};
    use super::*;
    use crate::plan::PlanCategory;
    use core_kernel::Money;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_plan_create_list_active_only() {
        let store = MemoryPlanStore::new();
        let active = Plan::new("Basic", 100, Money::usd(dec!(25)), PlanCategory::Home);
        let mut retired = Plan::new("Legacy", 10, Money::usd(dec!(10)), PlanCategory::Home);
        retired.deactivate();

        store.create(&active).await.unwrap();
        store.create(&retired).await.unwrap();

        assert_eq!(store.list(false).await.unwrap().len(), 2);
        let on_offer = store.list(true).await.unwrap();
        assert_eq!(on_offer.len(), 1);
        assert_eq!(on_offer[0].name, "Basic");
    }

    #[tokio::test]
    async fn test_plan_duplicate_name_conflicts() {
        let store = MemoryPlanStore::new();
        let a = Plan::new("Basic", 100, Money::usd(dec!(25)), PlanCategory::Home);
        let b = Plan::new("Basic", 200, Money::usd(dec!(40)), PlanCategory::Home);

        store.create(&a).await.unwrap();
        assert!(matches!(
            store.create(&b).await,
            Err(PortError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_one_open_contract_per_customer() {
        let store = MemoryContractStore::new();
        let customer_id = CustomerId::new_v7();
        let first = Contract::new(customer_id, PlanId::new_v7());
        let second = Contract::new(customer_id, PlanId::new_v7());

        store.create(&first).await.unwrap();
        assert!(matches!(
            store.create(&second).await,
            Err(PortError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_finalized_contract_frees_slot() {
        let store = MemoryContractStore::new();
        let customer_id = CustomerId::new_v7();
        let mut first = Contract::new(customer_id, PlanId::new_v7());
        first.finalize().unwrap();
        store.create(&first).await.unwrap();

        let second = Contract::new(customer_id, PlanId::new_v7());
        store.create(&second).await.unwrap();

        let open = store.find_open_by_customer(customer_id).await.unwrap();
        assert_eq!(open.unwrap().id, second.id);
    }
}
