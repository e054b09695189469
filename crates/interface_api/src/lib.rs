//! HTTP API Layer
//!
//! REST API for the billing system using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: request handlers per resource
//! - **Middleware**: JWT authentication and audit logging
//! - **DTOs**: request/response data transfer objects with validation
//! - **Error handling**: consistent JSON error responses
//!
//! Role checks live in the handlers: invoice issuance and overdue-marking
//! are admin-only; settlement and payment reporting are owner-or-admin.

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_billing::{BillingService, BillingStore};
use domain_catalog::{ContractStore, PlanStore};
use domain_customer::CustomerStore;

use crate::config::ApiConfig;
use crate::handlers::{auth as auth_handlers, contracts, customers, health, invoices, payments, plans};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub customers: Arc<dyn CustomerStore>,
    pub plans: Arc<dyn PlanStore>,
    pub contracts: Arc<dyn ContractStore>,
    pub billing_store: Arc<dyn BillingStore>,
    pub billing: Arc<BillingService>,
    pub config: ApiConfig,
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/api/v1/auth/register", post(auth_handlers::register))
        .route("/api/v1/auth/login", post(auth_handlers::login));

    // Customer routes
    let customer_routes = Router::new()
        .route("/", get(customers::list_customers))
        .route("/:id", get(customers::get_customer))
        .route("/:id", put(customers::update_customer))
        .route("/:id", delete(customers::delete_customer))
        .route("/:id/invoices", get(customers::list_customer_invoices))
        .route("/:id/ledger", get(customers::list_customer_ledger));

    // Plan routes
    let plan_routes = Router::new()
        .route("/", get(plans::list_plans))
        .route("/", post(plans::create_plan))
        .route("/:id", get(plans::get_plan))
        .route("/:id", put(plans::update_plan))
        .route("/:id", delete(plans::deactivate_plan));

    // Contract routes
    let contract_routes = Router::new()
        .route("/", post(contracts::create_contract))
        .route("/", get(contracts::list_contracts))
        .route("/:id", get(contracts::get_contract))
        .route("/:id/suspend", post(contracts::suspend_contract))
        .route("/:id/finalize", post(contracts::finalize_contract));

    // Invoice routes
    let invoice_routes = Router::new()
        .route("/", post(invoices::issue_invoice))
        .route("/", get(invoices::list_invoices))
        .route("/:id", get(invoices::get_invoice))
        .route("/:id/pay", post(invoices::mark_invoice_paid))
        .route("/:id/overdue", post(invoices::mark_invoice_overdue))
        .route("/:id/payments", post(payments::report_payment))
        .route("/:id/payments", get(payments::list_invoice_payments));

    // Payment verification routes
    let payment_routes = Router::new()
        .route("/:id/verify", post(payments::verify_payment))
        .route("/:id/reject", post(payments::reject_payment));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/customers", customer_routes)
        .nest("/plans", plan_routes)
        .nest("/contracts", contract_routes)
        .nest("/invoices", invoice_routes)
        .nest("/payments", payment_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            audit_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
