//! Plan and contract DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_catalog::{Contract, Plan};

/// Plan creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlanRequest {
    #[validate(length(min = 3))]
    pub name: String,
    #[validate(range(min = 1))]
    pub bandwidth_mbps: u32,
    pub price_usd: Decimal,
    /// "home" or "business"
    pub category: String,
}

/// Plan update request; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePlanRequest {
    #[validate(length(min = 3))]
    pub name: Option<String>,
    #[validate(range(min = 1))]
    pub bandwidth_mbps: Option<u32>,
    pub price_usd: Option<Decimal>,
    pub active: Option<bool>,
}

/// Plan representation
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub id: Uuid,
    pub name: String,
    pub bandwidth_mbps: u32,
    pub price_usd: Decimal,
    pub category: String,
    pub active: bool,
}

impl From<Plan> for PlanResponse {
    fn from(plan: Plan) -> Self {
        PlanResponse {
            id: *plan.id.as_uuid(),
            name: plan.name,
            bandwidth_mbps: plan.bandwidth_mbps,
            price_usd: plan.price_usd.amount(),
            category: plan.category.to_string(),
            active: plan.active,
        }
    }
}

/// Contract creation request
///
/// `customer_id` may only be set by administrators; customer callers
/// always contract for themselves.
#[derive(Debug, Deserialize)]
pub struct CreateContractRequest {
    pub plan_id: Uuid,
    pub customer_id: Option<Uuid>,
}

/// Contract representation
#[derive(Debug, Serialize)]
pub struct ContractResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub plan_id: Uuid,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub suspended_at: Option<DateTime<Utc>>,
}

impl From<Contract> for ContractResponse {
    fn from(contract: Contract) -> Self {
        ContractResponse {
            id: *contract.id.as_uuid(),
            customer_id: *contract.customer_id.as_uuid(),
            plan_id: *contract.plan_id.as_uuid(),
            status: contract.status.to_string(),
            started_at: contract.started_at,
            suspended_at: contract.suspended_at,
        }
    }
}

/// Contract plus the invoice issued at contracting time
#[derive(Debug, Serialize)]
pub struct ContractCreatedResponse {
    pub contract: ContractResponse,
    pub invoice: crate::dto::billing::InvoiceResponse,
}
