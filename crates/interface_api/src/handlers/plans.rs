//! Plan handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use core_kernel::{Money, PlanId};
use domain_catalog::{Plan, PlanStore};

use crate::auth::Principal;
use crate::dto::catalog::{CreatePlanRequest, PlanResponse, UpdatePlanRequest};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct ListPlansQuery {
    /// When true, only plans currently on offer are returned
    #[serde(default)]
    pub active_only: bool,
}

/// Lists plans (any authenticated caller)
pub async fn list_plans(
    State(state): State<AppState>,
    Query(query): Query<ListPlansQuery>,
) -> Result<Json<Vec<PlanResponse>>, ApiError> {
    let plans = state.plans.list(query.active_only).await?;
    Ok(Json(plans.into_iter().map(Into::into).collect()))
}

/// Gets one plan
pub async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlanResponse>, ApiError> {
    let plan = state.plans.get(PlanId::from_uuid(id)).await?;
    Ok(Json(plan.into()))
}

/// Creates a plan (administrators)
pub async fn create_plan(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreatePlanRequest>,
) -> Result<(StatusCode, Json<PlanResponse>), ApiError> {
    principal.require_admin()?;
    request.validate()?;

    if request.price_usd <= rust_decimal::Decimal::ZERO {
        return Err(ApiError::Validation(
            "plan price must be positive".to_string(),
        ));
    }
    let category = request.category.parse()?;

    let plan = Plan::new(
        request.name,
        request.bandwidth_mbps,
        Money::usd(request.price_usd),
        category,
    );
    state.plans.create(&plan).await?;

    Ok((StatusCode::CREATED, Json(plan.into())))
}

/// Administrative edits; issued invoices are never retroactively altered
pub async fn update_plan(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePlanRequest>,
) -> Result<Json<PlanResponse>, ApiError> {
    principal.require_admin()?;
    request.validate()?;

    let mut plan = state.plans.get(PlanId::from_uuid(id)).await?;
    if let Some(name) = request.name {
        plan.name = name;
    }
    if let Some(bandwidth) = request.bandwidth_mbps {
        plan.bandwidth_mbps = bandwidth;
    }
    if let Some(price) = request.price_usd {
        if price <= rust_decimal::Decimal::ZERO {
            return Err(ApiError::Validation(
                "plan price must be positive".to_string(),
            ));
        }
        plan.price_usd = Money::usd(price);
    }
    if let Some(active) = request.active {
        plan.active = active;
    }
    plan.updated_at = chrono::Utc::now();

    state.plans.update(&plan).await?;
    Ok(Json(plan.into()))
}

/// Takes a plan off the offer (administrators)
pub async fn deactivate_plan(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlanResponse>, ApiError> {
    principal.require_admin()?;

    let mut plan = state.plans.get(PlanId::from_uuid(id)).await?;
    plan.deactivate();
    state.plans.update(&plan).await?;
    Ok(Json(plan.into()))
}
