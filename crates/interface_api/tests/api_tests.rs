//! Handler-level tests over the in-memory store adapters

use axum::extract::{Path, State};
use axum::{Extension, Json};
use rust_decimal_macros::dec;

use core_kernel::CustomerId;
use domain_customer::Role;
use interface_api::auth::Principal;
use interface_api::config::ApiConfig;
use interface_api::dto::auth::{LoginRequest, RegisterRequest};
use interface_api::dto::billing::{IssueInvoiceRequest, ReportPaymentDto};
use interface_api::error::ApiError;
use interface_api::handlers::{auth, invoices, payments};
use interface_api::AppState;
use test_utils::BillingHarness;

fn state_over(harness: &BillingHarness) -> AppState {
    AppState {
        customers: harness.customers.clone(),
        plans: harness.plans.clone(),
        contracts: harness.contracts.clone(),
        billing_store: harness.store.clone(),
        billing: harness.service.clone(),
        config: ApiConfig::default(),
    }
}

fn admin() -> Principal {
    Principal {
        customer_id: CustomerId::new_v7(),
        role: Role::Admin,
    }
}

fn register_request(cedula: &str, email: &str) -> RegisterRequest {
    RegisterRequest {
        cedula: cedula.to_string(),
        email: email.to_string(),
        password: "a-long-password".to_string(),
        first_name: "Ana".to_string(),
        last_name: "Moreno".to_string(),
        phone: Some("04121234567".to_string()),
        address: None,
    }
}

#[tokio::test]
async fn register_then_login_round_trip() {
    let harness = BillingHarness::new();
    let state = state_over(&harness);

    let (status, Json(created)) = auth::register(
        State(state.clone()),
        Json(register_request("12345678", "ana@example.com")),
    )
    .await
    .unwrap();
    assert_eq!(status, axum::http::StatusCode::CREATED);
    assert_eq!(created.customer.email, "ana@example.com");
    assert!(!created.token.is_empty());

    let Json(logged_in) = auth::login(
        State(state),
        Json(LoginRequest {
            email: "ana@example.com".to_string(),
            password: "a-long-password".to_string(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(logged_in.customer.id, created.customer.id);
}

#[tokio::test]
async fn register_rejects_duplicate_cedula() {
    let harness = BillingHarness::new();
    let state = state_over(&harness);

    auth::register(
        State(state.clone()),
        Json(register_request("12345678", "ana@example.com")),
    )
    .await
    .unwrap();

    let result = auth::register(
        State(state),
        Json(register_request("12345678", "other@example.com")),
    )
    .await;
    assert!(matches!(result, Err(ApiError::Conflict(_))));
}

#[tokio::test]
async fn register_rejects_non_numeric_cedula() {
    let harness = BillingHarness::new();
    let state = state_over(&harness);

    let result = auth::register(State(state), Json(register_request("12A4567B", "x@example.com"))).await;
    assert!(matches!(result, Err(ApiError::Validation(_))));
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let harness = BillingHarness::new();
    let state = state_over(&harness);

    auth::register(
        State(state.clone()),
        Json(register_request("12345678", "ana@example.com")),
    )
    .await
    .unwrap();

    let result = auth::login(
        State(state),
        Json(LoginRequest {
            email: "ana@example.com".to_string(),
            password: "wrong-password".to_string(),
        }),
    )
    .await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn invoice_issuance_requires_admin_role() {
    let harness = BillingHarness::new();
    let state = state_over(&harness);

    let customer = harness.customer().await;
    let plan = harness.plan(dec!(25)).await;
    let contract = harness.contract(&customer, &plan).await;

    let as_customer = Principal {
        customer_id: customer.id,
        role: Role::Customer,
    };
    let result = invoices::issue_invoice(
        State(state.clone()),
        Extension(as_customer),
        Json(IssueInvoiceRequest {
            contract_id: *contract.id.as_uuid(),
        }),
    )
    .await;
    assert!(matches!(result, Err(ApiError::Forbidden(_))));

    let (status, Json(issued)) = invoices::issue_invoice(
        State(state),
        Extension(admin()),
        Json(IssueInvoiceRequest {
            contract_id: *contract.id.as_uuid(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(status, axum::http::StatusCode::CREATED);
    assert_eq!(issued.amount_usd, dec!(25));
}

#[tokio::test]
async fn customers_cannot_touch_other_customers_invoices() {
    let harness = BillingHarness::new();
    let state = state_over(&harness);

    let owner = harness.customer().await;
    let intruder = harness.customer().await;
    let plan = harness.plan(dec!(25)).await;
    let contract = harness.contract(&owner, &plan).await;
    let invoice = harness.service.issue_invoice(contract.id).await.unwrap();

    let as_intruder = Principal {
        customer_id: intruder.id,
        role: Role::Customer,
    };

    let result = invoices::get_invoice(
        State(state.clone()),
        Extension(as_intruder),
        Path(*invoice.id.as_uuid()),
    )
    .await;
    assert!(matches!(result, Err(ApiError::Forbidden(_))));

    let result = payments::report_payment(
        State(state),
        Extension(as_intruder),
        Path(*invoice.id.as_uuid()),
        Json(ReportPaymentDto {
            amount: dec!(25),
            currency: "USD".to_string(),
            bank_origin: None,
            destination_account: None,
            reference: "123456".to_string(),
        }),
    )
    .await;
    assert!(matches!(result, Err(ApiError::Forbidden(_))));
}

#[tokio::test]
async fn owner_reports_payment_and_settles_invoice() {
    let harness = BillingHarness::new();
    let state = state_over(&harness);

    let owner = harness.customer().await;
    let plan = harness.plan(dec!(25)).await;
    let contract = harness.contract(&owner, &plan).await;
    let invoice = harness.service.issue_invoice(contract.id).await.unwrap();

    let as_owner = Principal {
        customer_id: owner.id,
        role: Role::Customer,
    };

    let (status, Json(receipt)) = payments::report_payment(
        State(state),
        Extension(as_owner),
        Path(*invoice.id.as_uuid()),
        Json(ReportPaymentDto {
            amount: dec!(2500),
            currency: "VED".to_string(),
            bank_origin: Some("Banco Central".to_string()),
            destination_account: None,
            reference: "654321".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(status, axum::http::StatusCode::CREATED);
    assert_eq!(receipt.payment.usd_equivalent, dec!(25));
    assert_eq!(receipt.invoice.status, "paid");
    assert_eq!(receipt.balance_usd, dec!(0));
}
