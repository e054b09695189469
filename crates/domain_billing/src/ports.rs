//! Billing domain port
//!
//! The `BillingStore` trait defines the persistence surface for invoices,
//! payments, and balance ledger entries. The in-memory adapter here backs
//! tests and local runs; `infra_db` provides the PostgreSQL adapter.

use async_trait::async_trait;

use core_kernel::{CustomerId, DomainPort, InvoiceId, PaymentId, PortError};

use crate::invoice::{Invoice, InvoiceStatus};
use crate::ledger::BalanceEntry;
use crate::payment::Payment;

/// Storage port for the billing ledger
///
/// `insert_payment` enforces uniqueness on (invoice, reference) and
/// returns `PortError::Conflict` on a duplicate report. Invoices are
/// never deleted; there is deliberately no removal operation.
#[async_trait]
pub trait BillingStore: DomainPort {
    /// Retrieves an invoice by ID
    async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError>;

    /// Lists every invoice
    async fn list_invoices(&self) -> Result<Vec<Invoice>, PortError>;

    /// Lists a customer's invoices
    async fn list_invoices_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Invoice>, PortError>;

    /// Lists invoices in a given state; the sweep scans `pending`
    async fn list_invoices_by_status(
        &self,
        status: InvoiceStatus,
    ) -> Result<Vec<Invoice>, PortError>;

    /// Persists a newly issued invoice
    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), PortError>;

    /// Replaces the stored record for an existing invoice
    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), PortError>;

    /// Retrieves a payment by ID
    async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError>;

    /// Persists a new payment report
    async fn insert_payment(&self, payment: &Payment) -> Result<(), PortError>;

    /// Updates a payment's verification status
    async fn update_payment(&self, payment: &Payment) -> Result<(), PortError>;

    /// Lists the payments reported against an invoice
    async fn list_payments_for_invoice(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Vec<Payment>, PortError>;

    /// Appends a balance ledger entry
    async fn append_ledger_entry(&self, entry: &BalanceEntry) -> Result<(), PortError>;

    /// Lists a customer's balance ledger entries, oldest first
    async fn list_ledger_entries(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<BalanceEntry>, PortError>;
}

/// In-memory implementation of `BillingStore`
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    #[derive(Debug, Default)]
    struct State {
        invoices: HashMap<InvoiceId, Invoice>,
        payments: HashMap<PaymentId, Payment>,
        ledger: Vec<BalanceEntry>,
    }

    /// In-memory billing store
    #[derive(Debug, Default)]
    pub struct MemoryBillingStore {
        state: RwLock<State>,
    }

    impl MemoryBillingStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MemoryBillingStore {}

    #[async_trait]
    impl BillingStore for MemoryBillingStore {
        async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError> {
            self.state
                .read()
                .await
                .invoices
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Invoice", id))
        }

        async fn list_invoices(&self) -> Result<Vec<Invoice>, PortError> {
            let mut invoices: Vec<_> = self.state.read().await.invoices.values().cloned().collect();
            invoices.sort_by_key(|i| i.issued_at);
            Ok(invoices)
        }

        async fn list_invoices_for_customer(
            &self,
            customer_id: CustomerId,
        ) -> Result<Vec<Invoice>, PortError> {
            let mut invoices: Vec<_> = self
                .state
                .read()
                .await
                .invoices
                .values()
                .filter(|i| i.customer_id == customer_id)
                .cloned()
                .collect();
            invoices.sort_by_key(|i| i.issued_at);
            Ok(invoices)
        }

        async fn list_invoices_by_status(
            &self,
            status: InvoiceStatus,
        ) -> Result<Vec<Invoice>, PortError> {
            let mut invoices: Vec<_> = self
                .state
                .read()
                .await
                .invoices
                .values()
                .filter(|i| i.status == status)
                .cloned()
                .collect();
            invoices.sort_by_key(|i| i.issued_at);
            Ok(invoices)
        }

        async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
            let mut state = self.state.write().await;
            if state.invoices.contains_key(&invoice.id) {
                return Err(PortError::conflict(format!(
                    "invoice already exists: {}",
                    invoice.id
                )));
            }
            state.invoices.insert(invoice.id, invoice.clone());
            Ok(())
        }

        async fn update_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
            let mut state = self.state.write().await;
            if !state.invoices.contains_key(&invoice.id) {
                return Err(PortError::not_found("Invoice", invoice.id));
            }
            state.invoices.insert(invoice.id, invoice.clone());
            Ok(())
        }

        async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError> {
            self.state
                .read()
                .await
                .payments
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Payment", id))
        }

        async fn insert_payment(&self, payment: &Payment) -> Result<(), PortError> {
            let mut state = self.state.write().await;
            if state
                .payments
                .values()
                .any(|p| p.invoice_id == payment.invoice_id && p.reference == payment.reference)
            {
                return Err(PortError::conflict(format!(
                    "payment reference already reported for invoice {}: {}",
                    payment.invoice_id, payment.reference
                )));
            }
            state.payments.insert(payment.id, payment.clone());
            Ok(())
        }

        async fn update_payment(&self, payment: &Payment) -> Result<(), PortError> {
            let mut state = self.state.write().await;
            if !state.payments.contains_key(&payment.id) {
                return Err(PortError::not_found("Payment", payment.id));
            }
            state.payments.insert(payment.id, payment.clone());
            Ok(())
        }

        async fn list_payments_for_invoice(
            &self,
            invoice_id: InvoiceId,
        ) -> Result<Vec<Payment>, PortError> {
            let mut payments: Vec<_> = self
                .state
                .read()
                .await
                .payments
                .values()
                .filter(|p| p.invoice_id == invoice_id)
                .cloned()
                .collect();
            payments.sort_by_key(|p| p.reported_at);
            Ok(payments)
        }

        async fn append_ledger_entry(&self, entry: &BalanceEntry) -> Result<(), PortError> {
            self.state.write().await.ledger.push(entry.clone());
            Ok(())
        }

        async fn list_ledger_entries(
            &self,
            customer_id: CustomerId,
        ) -> Result<Vec<BalanceEntry>, PortError> {
            Ok(self
                .state
                .read()
                .await
                .ledger
                .iter()
                .filter(|e| e.customer_id == customer_id)
                .cloned()
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryBillingStore;
    use super::*;
    use core_kernel::{ExchangeRate, Money};
    use domain_catalog::{Contract, Plan, PlanCategory};
    use rust_decimal_macros::dec;

    fn pending_invoice() -> Invoice {
        let plan = Plan::new("Basic", 100, Money::usd(dec!(25)), PlanCategory::Home);
        let contract = Contract::new(CustomerId::new_v7(), plan.id);
        Invoice::issue(&contract, &plan, ExchangeRate::new(dec!(100)).unwrap())
    }

    #[tokio::test]
    async fn test_insert_and_get_invoice() {
        let store = MemoryBillingStore::new();
        let invoice = pending_invoice();
        store.insert_invoice(&invoice).await.unwrap();

        let found = store.get_invoice(invoice.id).await.unwrap();
        assert_eq!(found.amount, invoice.amount);
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let store = MemoryBillingStore::new();
        let pending = pending_invoice();
        let mut overdue = pending_invoice();
        overdue.mark_overdue().unwrap();

        store.insert_invoice(&pending).await.unwrap();
        store.insert_invoice(&overdue).await.unwrap();

        let found = store
            .list_invoices_by_status(InvoiceStatus::Pending)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, pending.id);
    }

    #[tokio::test]
    async fn test_duplicate_payment_reference_conflicts() {
        let store = MemoryBillingStore::new();
        let invoice = pending_invoice();
        store.insert_invoice(&invoice).await.unwrap();

        let first = Payment::new(
            invoice.customer_id,
            invoice.id,
            Money::usd(dec!(10)),
            Money::usd(dec!(10)),
            None,
            "123456",
        )
        .unwrap();
        let duplicate = Payment::new(
            invoice.customer_id,
            invoice.id,
            Money::usd(dec!(10)),
            Money::usd(dec!(10)),
            None,
            "123456",
        )
        .unwrap();

        store.insert_payment(&first).await.unwrap();
        let result = store.insert_payment(&duplicate).await;
        assert!(matches!(result, Err(PortError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_same_reference_on_other_invoice_allowed() {
        let store = MemoryBillingStore::new();
        let a = pending_invoice();
        let b = pending_invoice();
        store.insert_invoice(&a).await.unwrap();
        store.insert_invoice(&b).await.unwrap();

        let on_a = Payment::new(
            a.customer_id,
            a.id,
            Money::usd(dec!(10)),
            Money::usd(dec!(10)),
            None,
            "123456",
        )
        .unwrap();
        let on_b = Payment::new(
            b.customer_id,
            b.id,
            Money::usd(dec!(10)),
            Money::usd(dec!(10)),
            None,
            "123456",
        )
        .unwrap();

        store.insert_payment(&on_a).await.unwrap();
        store.insert_payment(&on_b).await.unwrap();
    }
}
