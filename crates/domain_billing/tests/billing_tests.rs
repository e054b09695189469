//! Service-level tests for invoice issuance and payment application

use rust_decimal_macros::dec;

use core_kernel::{Currency, CustomerId, InvoiceId, Money};
use domain_billing::{BillingError, BillingStore, InvoiceStatus, PaymentStatus, ReportPaymentRequest};
use domain_catalog::{ContractStatus, ContractStore};
use domain_customer::CustomerStore;
use test_utils::BillingHarness;

fn payment_request(
    customer_id: CustomerId,
    invoice_id: InvoiceId,
    amount: rust_decimal::Decimal,
    currency: Currency,
    reference: &str,
) -> ReportPaymentRequest {
    ReportPaymentRequest {
        customer_id,
        invoice_id,
        amount,
        currency,
        bank_origin: Some("Banco Central".to_string()),
        destination_account: Some("0102-0000-0000".to_string()),
        reference: reference.to_string(),
    }
}

#[tokio::test]
async fn issuance_prices_from_plan_and_debits_balance() {
    let h = BillingHarness::new();
    let customer = h.customer().await;
    let plan = h.plan(dec!(25)).await;
    let contract = h.contract(&customer, &plan).await;

    let invoice = h.service.issue_invoice(contract.id).await.unwrap();

    assert_eq!(invoice.status, InvoiceStatus::Pending);
    assert_eq!(invoice.amount, Money::usd(dec!(25)));
    assert!(invoice.amount_paid.is_zero());
    assert_eq!(invoice.rate_snapshot.ved_per_usd(), dec!(100));

    // Balance debited by exactly the plan price
    let stored = h.customers.get(customer.id).await.unwrap();
    assert_eq!(stored.balance_usd.amount(), dec!(-25));

    // And the debit is on the ledger
    let entries = h.store.list_ledger_entries(customer.id).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].delta.amount(), dec!(-25));
}

#[tokio::test]
async fn issuance_fails_for_missing_contract() {
    let h = BillingHarness::new();
    let result = h
        .service
        .issue_invoice(core_kernel::ContractId::new_v7())
        .await;
    assert!(matches!(result, Err(BillingError::NotFound { .. })));
}

#[tokio::test]
async fn issuance_fails_for_deleted_customer() {
    let h = BillingHarness::new();
    let customer = h.customer().await;
    let plan = h.plan(dec!(25)).await;
    let contract = h.contract(&customer, &plan).await;

    h.customers.soft_delete(customer.id).await.unwrap();

    let result = h.service.issue_invoice(contract.id).await;
    assert!(matches!(result, Err(BillingError::NotFound { .. })));
}

#[tokio::test]
async fn ved_payment_converts_at_current_rate() {
    let h = BillingHarness::with_rate(dec!(100));
    let customer = h.customer().await;
    let plan = h.plan(dec!(25)).await;
    let contract = h.contract(&customer, &plan).await;
    let invoice = h.service.issue_invoice(contract.id).await.unwrap();

    // 1000 VED at 100 VED/USD is 10 USD
    let receipt = h
        .service
        .report_payment(payment_request(
            customer.id,
            invoice.id,
            dec!(1000),
            Currency::VED,
            "111111",
        ))
        .await
        .unwrap();

    assert_eq!(receipt.payment.usd_equivalent, Money::usd(dec!(10)));
    assert_eq!(
        receipt.payment.rate_snapshot.unwrap().ved_per_usd(),
        dec!(100)
    );
    assert_eq!(receipt.invoice.amount_paid.amount(), dec!(10));
    assert_eq!(receipt.invoice.status, InvoiceStatus::Pending);

    // Balance: -25 issuance + 10 credit
    assert_eq!(receipt.balance_usd.amount(), dec!(-15));
}

#[tokio::test]
async fn usd_payment_passes_through_without_rate() {
    let h = BillingHarness::new();
    let customer = h.customer().await;
    let plan = h.plan(dec!(25)).await;
    let contract = h.contract(&customer, &plan).await;
    let invoice = h.service.issue_invoice(contract.id).await.unwrap();

    let receipt = h
        .service
        .report_payment(payment_request(
            customer.id,
            invoice.id,
            dec!(25),
            Currency::USD,
            "222222",
        ))
        .await
        .unwrap();

    assert!(receipt.payment.rate_snapshot.is_none());
    assert_eq!(receipt.payment.usd_equivalent, Money::usd(dec!(25)));
    assert_eq!(receipt.invoice.status, InvoiceStatus::Paid);
    assert!(receipt.invoice.paid_at.is_some());
}

#[tokio::test]
async fn settling_payment_reactivates_suspended_contract() {
    let h = BillingHarness::new();
    let customer = h.customer().await;
    let plan = h.plan(dec!(25)).await;
    let contract = h.contract(&customer, &plan).await;
    let invoice = h.service.issue_invoice(contract.id).await.unwrap();

    // Suspend as the sweep would
    let mut suspended = h.contracts.get(contract.id).await.unwrap();
    suspended.suspend().unwrap();
    h.contracts.update(&suspended).await.unwrap();

    h.service
        .report_payment(payment_request(
            customer.id,
            invoice.id,
            dec!(2500),
            Currency::VED,
            "333333",
        ))
        .await
        .unwrap();

    let after = h.contracts.get(contract.id).await.unwrap();
    assert_eq!(after.status, ContractStatus::Active);
}

#[tokio::test]
async fn duplicate_reference_is_a_conflict() {
    let h = BillingHarness::new();
    let customer = h.customer().await;
    let plan = h.plan(dec!(25)).await;
    let contract = h.contract(&customer, &plan).await;
    let invoice = h.service.issue_invoice(contract.id).await.unwrap();

    h.service
        .report_payment(payment_request(
            customer.id,
            invoice.id,
            dec!(5),
            Currency::USD,
            "444444",
        ))
        .await
        .unwrap();

    let result = h
        .service
        .report_payment(payment_request(
            customer.id,
            invoice.id,
            dec!(5),
            Currency::USD,
            "444444",
        ))
        .await;
    assert!(matches!(result, Err(BillingError::Conflict(_))));

    // The duplicate left no trace: one payment, one credit
    let payments = h.store.list_payments_for_invoice(invoice.id).await.unwrap();
    assert_eq!(payments.len(), 1);
    let stored = h.customers.get(customer.id).await.unwrap();
    assert_eq!(stored.balance_usd.amount(), dec!(-20));
}

#[tokio::test]
async fn payment_for_missing_invoice_leaves_no_record() {
    let h = BillingHarness::new();
    let customer = h.customer().await;

    let ghost = InvoiceId::new_v7();
    let result = h
        .service
        .report_payment(payment_request(
            customer.id,
            ghost,
            dec!(25),
            Currency::USD,
            "555555",
        ))
        .await;
    assert!(matches!(result, Err(BillingError::NotFound { .. })));

    // No orphaned payment and no balance movement
    assert!(h
        .store
        .list_payments_for_invoice(ghost)
        .await
        .unwrap()
        .is_empty());
    let stored = h.customers.get(customer.id).await.unwrap();
    assert!(stored.balance_usd.is_zero());
}

#[tokio::test]
async fn payment_against_other_customers_invoice_rejected() {
    let h = BillingHarness::new();
    let owner = h.customer().await;
    let intruder = h.customer().await;
    let plan = h.plan(dec!(25)).await;
    let contract = h.contract(&owner, &plan).await;
    let invoice = h.service.issue_invoice(contract.id).await.unwrap();

    let result = h
        .service
        .report_payment(payment_request(
            intruder.id,
            invoice.id,
            dec!(25),
            Currency::USD,
            "666666",
        ))
        .await;
    assert!(matches!(result, Err(BillingError::Validation(_))));
}

#[tokio::test]
async fn non_positive_amount_rejected_without_side_effects() {
    let h = BillingHarness::new();
    let customer = h.customer().await;
    let plan = h.plan(dec!(25)).await;
    let contract = h.contract(&customer, &plan).await;
    let invoice = h.service.issue_invoice(contract.id).await.unwrap();

    for amount in [dec!(0), dec!(-10)] {
        let result = h
            .service
            .report_payment(payment_request(
                customer.id,
                invoice.id,
                amount,
                Currency::USD,
                "777777",
            ))
            .await;
        assert!(matches!(result, Err(BillingError::Validation(_))));
    }

    assert!(h
        .store
        .list_payments_for_invoice(invoice.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn overpayment_surplus_stays_on_balance() {
    let h = BillingHarness::new();
    let customer = h.customer().await;
    let plan = h.plan(dec!(25)).await;
    let contract = h.contract(&customer, &plan).await;
    let invoice = h.service.issue_invoice(contract.id).await.unwrap();

    let receipt = h
        .service
        .report_payment(payment_request(
            customer.id,
            invoice.id,
            dec!(40),
            Currency::USD,
            "888888",
        ))
        .await
        .unwrap();

    assert_eq!(receipt.invoice.status, InvoiceStatus::Paid);
    assert_eq!(receipt.invoice.amount_paid.amount(), dec!(40));
    // -25 + 40 leaves 15 USD of favor balance
    assert_eq!(receipt.balance_usd.amount(), dec!(15));
}

#[tokio::test]
async fn paid_invoice_rejects_further_payments() {
    let h = BillingHarness::new();
    let customer = h.customer().await;
    let plan = h.plan(dec!(25)).await;
    let contract = h.contract(&customer, &plan).await;
    let invoice = h.service.issue_invoice(contract.id).await.unwrap();

    h.service
        .report_payment(payment_request(
            customer.id,
            invoice.id,
            dec!(25),
            Currency::USD,
            "999999",
        ))
        .await
        .unwrap();

    let result = h
        .service
        .report_payment(payment_request(
            customer.id,
            invoice.id,
            dec!(5),
            Currency::USD,
            "000001",
        ))
        .await;
    assert!(matches!(result, Err(BillingError::Validation(_))));
}

#[tokio::test]
async fn administrative_paid_does_not_touch_balance() {
    let h = BillingHarness::new();
    let customer = h.customer().await;
    let plan = h.plan(dec!(25)).await;
    let contract = h.contract(&customer, &plan).await;
    let invoice = h.service.issue_invoice(contract.id).await.unwrap();

    let settled = h
        .service
        .mark_invoice_paid(invoice.id, Some("MANUAL-1".to_string()))
        .await
        .unwrap();

    assert_eq!(settled.status, InvoiceStatus::Paid);
    assert_eq!(settled.payment_reference.as_deref(), Some("MANUAL-1"));

    // Only the issuance debit is on the books
    let stored = h.customers.get(customer.id).await.unwrap();
    assert_eq!(stored.balance_usd.amount(), dec!(-25));
    assert_eq!(h.store.list_ledger_entries(customer.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn payment_verification_transitions() {
    let h = BillingHarness::new();
    let customer = h.customer().await;
    let plan = h.plan(dec!(25)).await;
    let contract = h.contract(&customer, &plan).await;
    let invoice = h.service.issue_invoice(contract.id).await.unwrap();

    let receipt = h
        .service
        .report_payment(payment_request(
            customer.id,
            invoice.id,
            dec!(25),
            Currency::USD,
            "121212",
        ))
        .await
        .unwrap();

    let verified = h.service.verify_payment(receipt.payment.id).await.unwrap();
    assert_eq!(verified.status, PaymentStatus::Verified);

    // Verification is terminal
    assert!(h.service.reject_payment(receipt.payment.id).await.is_err());
}
