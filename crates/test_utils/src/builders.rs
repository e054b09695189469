//! Builders for domain entities with sensible test defaults

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{CustomerId, Money, PlanId};
use domain_catalog::{Contract, Plan, PlanCategory};
use domain_customer::{Customer, Role};

/// Builds customers with unique-enough defaults
pub struct CustomerBuilder {
    cedula: String,
    email: String,
    first_name: String,
    last_name: String,
    role: Role,
}

impl CustomerBuilder {
    pub fn new() -> Self {
        // Derive a distinct cedula/email per builder so uniqueness
        // constraints do not trip across fixtures
        let tag = uuid::Uuid::new_v4().as_u128() % 100_000_000;
        Self {
            cedula: format!("{:08}", tag),
            email: format!("customer{tag}@example.com"),
            first_name: "Ana".to_string(),
            last_name: "Moreno".to_string(),
            role: Role::Customer,
        }
    }

    pub fn cedula(mut self, cedula: impl Into<String>) -> Self {
        self.cedula = cedula.into();
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = first.into();
        self.last_name = last.into();
        self
    }

    pub fn admin(mut self) -> Self {
        self.role = Role::Admin;
        self
    }

    pub fn build(self) -> Customer {
        Customer::new(
            self.cedula,
            self.email,
            "argon2-hash-placeholder",
            self.first_name,
            self.last_name,
        )
        .with_role(self.role)
    }
}

impl Default for CustomerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds plans; defaults to the 25 USD home tier used across the suites
pub struct PlanBuilder {
    name: String,
    bandwidth_mbps: u32,
    price_usd: Decimal,
    category: PlanCategory,
}

impl PlanBuilder {
    pub fn new() -> Self {
        let tag = uuid::Uuid::new_v4().as_u128() % 100_000;
        Self {
            name: format!("Basic 100 Mbps #{tag}"),
            bandwidth_mbps: 100,
            price_usd: dec!(25),
            category: PlanCategory::Home,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn price(mut self, price_usd: Decimal) -> Self {
        self.price_usd = price_usd;
        self
    }

    pub fn bandwidth(mut self, mbps: u32) -> Self {
        self.bandwidth_mbps = mbps;
        self
    }

    pub fn business(mut self) -> Self {
        self.category = PlanCategory::Business;
        self
    }

    pub fn build(self) -> Plan {
        Plan::new(
            self.name,
            self.bandwidth_mbps,
            Money::usd(self.price_usd),
            self.category,
        )
    }
}

impl Default for PlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds contracts
pub struct ContractBuilder {
    customer_id: CustomerId,
    plan_id: PlanId,
}

impl ContractBuilder {
    pub fn new(customer_id: CustomerId, plan_id: PlanId) -> Self {
        Self {
            customer_id,
            plan_id,
        }
    }

    pub fn build(self) -> Contract {
        Contract::new(self.customer_id, self.plan_id)
    }
}
