//! End-to-end billing scenarios

use std::sync::Arc;

use rust_decimal_macros::dec;

use core_kernel::Currency;
use domain_billing::notify::RecordingNotifier;
use domain_billing::{BillingStore, InvoiceStatus, ReportPaymentRequest};
use domain_catalog::ContractStore;
use domain_customer::CustomerStore;
use test_utils::BillingHarness;

/// The full lifecycle: contract a 25 USD plan, get invoiced, pay 2500 VED
/// at rate 100, end with a paid invoice and a net-zero balance
#[tokio::test]
async fn contract_invoice_pay_in_ved_nets_to_zero() {
    let h = BillingHarness::with_rate(dec!(100));
    let customer = h.customer().await;
    let plan = h.plan(dec!(25)).await;
    let contract = h.contract(&customer, &plan).await;

    let invoice = h.service.issue_invoice(contract.id).await.unwrap();
    assert_eq!(invoice.amount.amount(), dec!(25));
    assert_eq!(invoice.status, InvoiceStatus::Pending);
    assert_eq!(
        h.customers.get(customer.id).await.unwrap().balance_usd.amount(),
        dec!(-25)
    );

    let receipt = h
        .service
        .report_payment(ReportPaymentRequest {
            customer_id: customer.id,
            invoice_id: invoice.id,
            amount: dec!(2500),
            currency: Currency::VED,
            bank_origin: Some("Banco de Venezuela".to_string()),
            destination_account: Some("0102-1234-5678".to_string()),
            reference: "654321".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(receipt.invoice.amount_paid.amount(), dec!(25));
    assert_eq!(receipt.invoice.status, InvoiceStatus::Paid);
    assert!(receipt.invoice.paid_at.is_some());

    // Debited 25 at issuance, credited 25 on payment: net zero
    assert!(receipt.balance_usd.is_zero());

    // A sweep afterwards has nothing to do
    let sweep = h.sweep(Arc::new(RecordingNotifier::new()));
    let report = sweep.run().await;
    assert_eq!(report.examined, 0);
    assert_eq!(report.marked_overdue, 0);
}

/// Two simultaneous half payments must both land on the invoice
#[tokio::test]
async fn concurrent_half_payments_both_apply() {
    let h = BillingHarness::new();
    let customer = h.customer().await;
    let plan = h.plan(dec!(30)).await;
    let contract = h.contract(&customer, &plan).await;
    let invoice = h.service.issue_invoice(contract.id).await.unwrap();

    let make_request = |reference: &str| ReportPaymentRequest {
        customer_id: customer.id,
        invoice_id: invoice.id,
        amount: dec!(15),
        currency: Currency::USD,
        bank_origin: None,
        destination_account: None,
        reference: reference.to_string(),
    };

    let service_a = h.service.clone();
    let service_b = h.service.clone();
    let req_a = make_request("100001");
    let req_b = make_request("100002");

    let (a, b) = tokio::join!(
        tokio::spawn(async move { service_a.report_payment(req_a).await }),
        tokio::spawn(async move { service_b.report_payment(req_b).await }),
    );
    a.unwrap().unwrap();
    b.unwrap().unwrap();

    // Neither update was lost: 15 + 15 == 30 and the invoice settled
    let settled = h.store.get_invoice(invoice.id).await.unwrap();
    assert_eq!(settled.amount_paid.amount(), dec!(30));
    assert_eq!(settled.status, InvoiceStatus::Paid);

    // Balance: -30 issuance + 15 + 15
    let stored = h.customers.get(customer.id).await.unwrap();
    assert!(stored.balance_usd.is_zero());

    let payments = h.store.list_payments_for_invoice(invoice.id).await.unwrap();
    assert_eq!(payments.len(), 2);
}

/// A payment against an overdue invoice settles it and restores service
#[tokio::test]
async fn late_payment_recovers_suspended_service() {
    let h = BillingHarness::new();
    let customer = h.customer().await;
    let plan = h.plan(dec!(25)).await;
    let contract = h.contract(&customer, &plan).await;
    let invoice = h.service.issue_invoice(contract.id).await.unwrap();

    // Let the invoice age past due and sweep it
    let mut stale = h.store.get_invoice(invoice.id).await.unwrap();
    stale.due_date = chrono::Utc::now() - chrono::Duration::days(2);
    h.store.update_invoice(&stale).await.unwrap();

    let sweep = h.sweep(Arc::new(RecordingNotifier::new()));
    sweep.run().await;
    assert_eq!(
        h.store.get_invoice(invoice.id).await.unwrap().status,
        InvoiceStatus::Overdue
    );
    assert_eq!(
        h.contracts.get(contract.id).await.unwrap().status,
        domain_catalog::ContractStatus::Suspended
    );

    // Paying the overdue invoice goes straight to paid and reactivates
    let receipt = h
        .service
        .report_payment(ReportPaymentRequest {
            customer_id: customer.id,
            invoice_id: invoice.id,
            amount: dec!(25),
            currency: Currency::USD,
            bank_origin: None,
            destination_account: None,
            reference: "200001".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(receipt.invoice.status, InvoiceStatus::Paid);
    assert_eq!(
        h.contracts.get(contract.id).await.unwrap().status,
        domain_catalog::ContractStatus::Active
    );
}

/// The ledger entries always reproduce the cached balance
#[tokio::test]
async fn ledger_entries_reconcile_with_balance() {
    let h = BillingHarness::new();
    let customer = h.customer().await;
    let plan = h.plan(dec!(40)).await;
    let contract = h.contract(&customer, &plan).await;
    let invoice = h.service.issue_invoice(contract.id).await.unwrap();

    for (amount, reference) in [(dec!(10), "300001"), (dec!(5), "300002")] {
        h.service
            .report_payment(ReportPaymentRequest {
                customer_id: customer.id,
                invoice_id: invoice.id,
                amount,
                currency: Currency::USD,
                bank_origin: None,
                destination_account: None,
                reference: reference.to_string(),
            })
            .await
            .unwrap();
    }

    let entries = h.store.list_ledger_entries(customer.id).await.unwrap();
    let balance = h.customers.get(customer.id).await.unwrap().balance_usd;

    assert_eq!(entries.len(), 3);
    assert_eq!(domain_billing::ledger::net_delta(&entries), balance);
    assert_eq!(balance.amount(), dec!(-25));
}
