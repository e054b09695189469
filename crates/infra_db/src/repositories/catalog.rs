//! Plan and contract repositories
//!
//! The one-open-contract-per-customer invariant is enforced by a partial
//! unique index; the insert surfaces it as a `Conflict`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{ContractId, CustomerId, DomainPort, Money, PlanId, PortError};
use domain_catalog::{Contract, ContractStatus, ContractStore, Plan, PlanCategory, PlanStore};

use crate::error::map_sqlx_error;

/// PostgreSQL adapter for `PlanStore`
#[derive(Debug, Clone)]
pub struct PgPlanStore {
    pool: PgPool,
}

impl PgPlanStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PlanRow {
    id: Uuid,
    name: String,
    bandwidth_mbps: i32,
    price_usd: Decimal,
    category: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PlanRow {
    fn into_entity(self) -> Result<Plan, PortError> {
        let category: PlanCategory = self
            .category
            .parse()
            .map_err(|_| PortError::internal(format!("unknown plan category: {}", self.category)))?;

        Ok(Plan {
            id: PlanId::from_uuid(self.id),
            name: self.name,
            bandwidth_mbps: self.bandwidth_mbps as u32,
            price_usd: Money::usd(self.price_usd),
            category,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_PLAN: &str = r#"
    SELECT id, name, bandwidth_mbps, price_usd, category, active, created_at, updated_at
    FROM plans
"#;

impl DomainPort for PgPlanStore {}

#[async_trait]
impl PlanStore for PgPlanStore {
    async fn get(&self, id: PlanId) -> Result<Plan, PortError> {
        let row: PlanRow = sqlx::query_as(&format!("{SELECT_PLAN} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Plan", id))?;
        row.into_entity()
    }

    async fn list(&self, active_only: bool) -> Result<Vec<Plan>, PortError> {
        let query = if active_only {
            format!("{SELECT_PLAN} WHERE active ORDER BY created_at")
        } else {
            format!("{SELECT_PLAN} ORDER BY created_at")
        };
        let rows: Vec<PlanRow> = sqlx::query_as(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Plan", "all"))?;
        rows.into_iter().map(PlanRow::into_entity).collect()
    }

    async fn create(&self, plan: &Plan) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO plans (id, name, bandwidth_mbps, price_usd, category, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(plan.id.as_uuid())
        .bind(&plan.name)
        .bind(plan.bandwidth_mbps as i32)
        .bind(plan.price_usd.amount())
        .bind(plan.category.to_string())
        .bind(plan.active)
        .bind(plan.created_at)
        .bind(plan.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Plan", plan.id))?;

        Ok(())
    }

    async fn update(&self, plan: &Plan) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            UPDATE plans SET
                name = $2, bandwidth_mbps = $3, price_usd = $4,
                category = $5, active = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(plan.id.as_uuid())
        .bind(&plan.name)
        .bind(plan.bandwidth_mbps as i32)
        .bind(plan.price_usd.amount())
        .bind(plan.category.to_string())
        .bind(plan.active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Plan", plan.id))?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Plan", plan.id));
        }
        Ok(())
    }
}

/// PostgreSQL adapter for `ContractStore`
#[derive(Debug, Clone)]
pub struct PgContractStore {
    pool: PgPool,
}

impl PgContractStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ContractRow {
    id: Uuid,
    customer_id: Uuid,
    plan_id: Uuid,
    status: String,
    started_at: DateTime<Utc>,
    suspended_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ContractRow {
    fn into_entity(self) -> Result<Contract, PortError> {
        let status: ContractStatus = self
            .status
            .parse()
            .map_err(|_| PortError::internal(format!("unknown contract status: {}", self.status)))?;

        Ok(Contract {
            id: ContractId::from_uuid(self.id),
            customer_id: CustomerId::from_uuid(self.customer_id),
            plan_id: PlanId::from_uuid(self.plan_id),
            status,
            started_at: self.started_at,
            suspended_at: self.suspended_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_CONTRACT: &str = r#"
    SELECT id, customer_id, plan_id, status, started_at, suspended_at, created_at, updated_at
    FROM contracts
"#;

impl DomainPort for PgContractStore {}

#[async_trait]
impl ContractStore for PgContractStore {
    async fn get(&self, id: ContractId) -> Result<Contract, PortError> {
        let row: ContractRow = sqlx::query_as(&format!("{SELECT_CONTRACT} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Contract", id))?;
        row.into_entity()
    }

    async fn find_open_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<Contract>, PortError> {
        let row: Option<ContractRow> = sqlx::query_as(&format!(
            "{SELECT_CONTRACT} WHERE customer_id = $1 AND status <> 'finalized'"
        ))
        .bind(customer_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Contract", customer_id))?;
        row.map(ContractRow::into_entity).transpose()
    }

    async fn list(&self) -> Result<Vec<Contract>, PortError> {
        let rows: Vec<ContractRow> =
            sqlx::query_as(&format!("{SELECT_CONTRACT} ORDER BY created_at"))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(e, "Contract", "all"))?;
        rows.into_iter().map(ContractRow::into_entity).collect()
    }

    async fn create(&self, contract: &Contract) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO contracts (id, customer_id, plan_id, status, started_at, suspended_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(contract.id.as_uuid())
        .bind(contract.customer_id.as_uuid())
        .bind(contract.plan_id.as_uuid())
        .bind(contract.status.to_string())
        .bind(contract.started_at)
        .bind(contract.suspended_at)
        .bind(contract.created_at)
        .bind(contract.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Contract", contract.id))?;

        Ok(())
    }

    async fn update(&self, contract: &Contract) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            UPDATE contracts SET
                status = $2, suspended_at = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(contract.id.as_uuid())
        .bind(contract.status.to_string())
        .bind(contract.suspended_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Contract", contract.id))?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Contract", contract.id));
        }
        Ok(())
    }
}
