//! Billing harness over the in-memory store adapters

use std::sync::Arc;

use rust_decimal::Decimal;

use core_kernel::ExchangeRate;
use domain_billing::notify::Notifier;
use domain_billing::ports::memory::MemoryBillingStore;
use domain_billing::rates::FixedRateProvider;
use domain_billing::sweep::OverdueSweep;
use domain_billing::BillingService;
use domain_catalog::ports::memory::{MemoryContractStore, MemoryPlanStore};
use domain_catalog::{Contract, ContractStore, Plan, PlanStore};
use domain_customer::ports::memory::MemoryCustomerStore;
use domain_customer::{Customer, CustomerStore};

use crate::builders::{ContractBuilder, CustomerBuilder, PlanBuilder};

/// A fully wired billing service over in-memory stores and a fixed rate
pub struct BillingHarness {
    pub customers: Arc<MemoryCustomerStore>,
    pub plans: Arc<MemoryPlanStore>,
    pub contracts: Arc<MemoryContractStore>,
    pub store: Arc<MemoryBillingStore>,
    pub service: Arc<BillingService>,
}

impl BillingHarness {
    /// Builds a harness with the given fixed VED-per-USD rate
    pub fn with_rate(ved_per_usd: Decimal) -> Self {
        let customers = Arc::new(MemoryCustomerStore::new());
        let plans = Arc::new(MemoryPlanStore::new());
        let contracts = Arc::new(MemoryContractStore::new());
        let store = Arc::new(MemoryBillingStore::new());
        let rate = ExchangeRate::new(ved_per_usd).expect("test rate must be positive");
        let rates = Arc::new(FixedRateProvider::new(rate));

        let service = Arc::new(BillingService::new(
            customers.clone(),
            plans.clone(),
            contracts.clone(),
            store.clone(),
            rates,
        ));

        Self {
            customers,
            plans,
            contracts,
            store,
            service,
        }
    }

    /// Harness with the rate used in most scenarios (100 VED per USD)
    pub fn new() -> Self {
        Self::with_rate(Decimal::from(100))
    }

    /// Registers and returns a fresh customer
    pub async fn customer(&self) -> Customer {
        let customer = CustomerBuilder::new().build();
        self.customers
            .create(&customer)
            .await
            .expect("fixture customer insert");
        customer
    }

    /// Creates and returns a plan at the given USD price
    pub async fn plan(&self, price_usd: Decimal) -> Plan {
        let plan = PlanBuilder::new().price(price_usd).build();
        self.plans.create(&plan).await.expect("fixture plan insert");
        plan
    }

    /// Contracts a plan for a customer
    pub async fn contract(&self, customer: &Customer, plan: &Plan) -> Contract {
        let contract = ContractBuilder::new(customer.id, plan.id).build();
        self.contracts
            .create(&contract)
            .await
            .expect("fixture contract insert");
        contract
    }

    /// Builds a sweep over this harness's stores
    pub fn sweep(&self, notifier: Arc<dyn Notifier>) -> OverdueSweep {
        OverdueSweep::new(
            self.service.clone(),
            self.store.clone(),
            self.customers.clone(),
            notifier,
        )
    }
}

impl Default for BillingHarness {
    fn default() -> Self {
        Self::new()
    }
}
