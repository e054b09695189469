//! Billing service - orchestrates the ledger operations
//!
//! The service is the single write path for invoices, payments, customer
//! balances, and the contract suspension cascade. Role/ownership checks
//! belong to the API layer; this component assumes an authorized caller.
//!
//! # Serialization
//!
//! The original read-modify-write sequences on `amount_paid` and the
//! customer balance are unprotected against concurrent requests. Here
//! every mutation runs under per-entity async locks from a lock registry,
//! always acquired invoice-first then customer, so two concurrent payment
//! reports against one invoice (or a payment racing the overdue sweep)
//! serialize instead of losing updates.
//!
//! # Atomicity
//!
//! All failure conditions - validation, missing entities, ownership,
//! duplicate references, rate availability - are checked before the first
//! write. The original created the Payment record before resolving the
//! customer, leaving orphaned reports behind 404s; that cannot happen
//! here.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

use core_kernel::{ContractId, Currency, CustomerId, ExchangeRate, InvoiceId, Money, PaymentId};
use domain_catalog::{Contract, ContractStore, PlanStore};
use domain_customer::{Customer, CustomerStore};

use crate::error::BillingError;
use crate::invoice::{Invoice, InvoiceStatus};
use crate::ledger::BalanceEntry;
use crate::payment::Payment;
use crate::ports::BillingStore;
use crate::rates::RateProvider;

/// Registry of per-entity async locks
///
/// Lock handles are created on first use and kept for the life of the
/// process; the entity population (customers, open invoices) is small
/// enough that eviction is not worth the complexity.
#[derive(Default)]
struct EntityLocks {
    handles: StdMutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl EntityLocks {
    fn handle(&self, key: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut handles = self.handles.lock().expect("lock registry poisoned");
        handles.entry(key).or_default().clone()
    }

    async fn acquire(&self, key: Uuid) -> tokio::sync::OwnedMutexGuard<()> {
        self.handle(key).lock_owned().await
    }
}

/// A payment report as received from the API layer
#[derive(Debug, Clone)]
pub struct ReportPaymentRequest {
    pub customer_id: CustomerId,
    pub invoice_id: InvoiceId,
    pub amount: Decimal,
    pub currency: Currency,
    pub bank_origin: Option<String>,
    pub destination_account: Option<String>,
    pub reference: String,
}

/// Result of applying a reported payment
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub invoice: Invoice,
    /// Customer balance after the credit
    pub balance_usd: Money,
}

/// Outcome of the sweep processing one past-due invoice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverdueOutcome {
    /// The invoice left the pending state since the scan; nothing to do
    AlreadyHandled,
    /// Invoice marked overdue; the contract was not active
    MarkedOverdue,
    /// Invoice marked overdue and its contract suspended
    MarkedAndSuspended(ContractId),
}

/// The billing ledger's write path
pub struct BillingService {
    customers: Arc<dyn CustomerStore>,
    plans: Arc<dyn PlanStore>,
    contracts: Arc<dyn ContractStore>,
    store: Arc<dyn BillingStore>,
    rates: Arc<dyn RateProvider>,
    locks: EntityLocks,
}

impl BillingService {
    pub fn new(
        customers: Arc<dyn CustomerStore>,
        plans: Arc<dyn PlanStore>,
        contracts: Arc<dyn ContractStore>,
        store: Arc<dyn BillingStore>,
        rates: Arc<dyn RateProvider>,
    ) -> Self {
        Self {
            customers,
            plans,
            contracts,
            store,
            rates,
            locks: EntityLocks::default(),
        }
    }

    /// Issues a pending invoice for a contract and debits the customer
    ///
    /// The customer is charged ahead for the coming period: the balance is
    /// debited at issuance and credited back as payments arrive.
    #[instrument(skip(self), fields(%contract_id))]
    pub async fn issue_invoice(&self, contract_id: ContractId) -> Result<Invoice, BillingError> {
        let contract = self.contracts.get(contract_id).await?;
        let plan = self.plans.get(contract.plan_id).await?;

        let _customer_guard = self.locks.acquire(*contract.customer_id.as_uuid()).await;

        let customer = self.active_customer(contract.customer_id).await?;
        let rate = self.current_rate().await?;

        let invoice = Invoice::issue(&contract, &plan, rate);

        self.store.insert_invoice(&invoice).await?;
        self.customers
            .adjust_balance(customer.id, -invoice.amount)
            .await?;
        self.store
            .append_ledger_entry(&BalanceEntry::invoice_issued(
                customer.id,
                invoice.id,
                invoice.amount,
            ))
            .await?;

        info!(
            invoice = %invoice.id,
            customer = %customer.id,
            amount = %invoice.amount,
            rate = %invoice.rate_snapshot,
            "invoice issued"
        );
        Ok(invoice)
    }

    /// Records a reported payment and applies it to the ledger
    ///
    /// Converts VED amounts at the current rate (falling back to the last
    /// known rate when the upstream is down), credits the customer's USD
    /// balance, accumulates `amount_paid`, and settles the invoice when it
    /// reaches its face value - reactivating a suspended contract.
    #[instrument(skip(self, request), fields(invoice = %request.invoice_id, customer = %request.customer_id))]
    pub async fn report_payment(
        &self,
        request: ReportPaymentRequest,
    ) -> Result<PaymentReceipt, BillingError> {
        if request.amount <= Decimal::ZERO {
            return Err(BillingError::validation(format!(
                "payment amount must be positive, got {}",
                request.amount
            )));
        }
        if request.reference.trim().is_empty() {
            return Err(BillingError::validation("payment reference is required"));
        }

        let _invoice_guard = self.locks.acquire(*request.invoice_id.as_uuid()).await;
        let _customer_guard = self.locks.acquire(*request.customer_id.as_uuid()).await;

        let mut invoice = self.store.get_invoice(request.invoice_id).await?;
        let customer = self.active_customer(request.customer_id).await?;

        if invoice.customer_id != customer.id {
            return Err(BillingError::validation(format!(
                "invoice {} does not belong to customer {}",
                invoice.id, customer.id
            )));
        }
        if invoice.status == InvoiceStatus::Paid {
            return Err(BillingError::validation(format!(
                "invoice {} is already paid",
                invoice.id
            )));
        }

        let existing = self
            .store
            .list_payments_for_invoice(invoice.id)
            .await?;
        if existing.iter().any(|p| p.reference == request.reference) {
            return Err(BillingError::Conflict(format!(
                "payment reference already reported for invoice {}: {}",
                invoice.id, request.reference
            )));
        }

        let amount = Money::new(request.amount, request.currency);
        let (rate_snapshot, usd_equivalent) = match request.currency {
            Currency::USD => (None, amount),
            Currency::VED => {
                let rate = self.current_rate().await?;
                (Some(rate), rate.to_usd(amount)?)
            }
        };

        let mut payment = Payment::new(
            customer.id,
            invoice.id,
            amount,
            usd_equivalent,
            rate_snapshot,
            request.reference.clone(),
        )?;
        if let Some(bank) = request.bank_origin {
            payment = payment.with_bank_origin(bank);
        }
        if let Some(account) = request.destination_account {
            payment = payment.with_destination_account(account);
        }

        let became_paid = invoice.record_payment(usd_equivalent)?;
        if became_paid {
            invoice.payment_reference = Some(request.reference);
        }

        // All checks passed; apply the writes under the held locks
        self.store.insert_payment(&payment).await?;
        self.store.update_invoice(&invoice).await?;
        let balance_usd = self
            .customers
            .adjust_balance(customer.id, usd_equivalent)
            .await?;
        self.store
            .append_ledger_entry(&BalanceEntry::payment_applied(
                customer.id,
                payment.id,
                invoice.id,
                usd_equivalent,
            ))
            .await?;

        if became_paid {
            self.reactivate_suspended_contract(customer.id).await?;
        }

        info!(
            payment = %payment.id,
            invoice = %invoice.id,
            usd_equivalent = %usd_equivalent,
            settled = became_paid,
            "payment applied"
        );
        Ok(PaymentReceipt {
            payment,
            invoice,
            balance_usd,
        })
    }

    /// Administrative settlement of an invoice without a payment record
    ///
    /// Sets the paid date and reactivates a suspended contract. The
    /// balance ledger is untouched: only issuance and payment application
    /// mutate the favor balance.
    #[instrument(skip(self), fields(%invoice_id))]
    pub async fn mark_invoice_paid(
        &self,
        invoice_id: InvoiceId,
        reference: Option<String>,
    ) -> Result<Invoice, BillingError> {
        let _invoice_guard = self.locks.acquire(*invoice_id.as_uuid()).await;

        let mut invoice = self.store.get_invoice(invoice_id).await?;
        let _customer_guard = self.locks.acquire(*invoice.customer_id.as_uuid()).await;

        invoice.mark_paid(reference)?;
        self.store.update_invoice(&invoice).await?;

        self.reactivate_suspended_contract(invoice.customer_id)
            .await?;

        info!(invoice = %invoice.id, "invoice settled administratively");
        Ok(invoice)
    }

    /// Administrative overdue marking without the suspension cascade
    #[instrument(skip(self), fields(%invoice_id))]
    pub async fn mark_invoice_overdue(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Invoice, BillingError> {
        let _invoice_guard = self.locks.acquire(*invoice_id.as_uuid()).await;

        let mut invoice = self.store.get_invoice(invoice_id).await?;
        invoice.mark_overdue()?;
        self.store.update_invoice(&invoice).await?;

        info!(invoice = %invoice.id, "invoice marked overdue");
        Ok(invoice)
    }

    /// Sweep unit of work: marks one past-due invoice overdue and
    /// suspends its contract
    ///
    /// Idempotent: an invoice that already left the pending state is
    /// skipped. The transition and the suspension are applied together
    /// under the invoice and customer locks.
    pub async fn process_overdue(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<OverdueOutcome, BillingError> {
        let _invoice_guard = self.locks.acquire(*invoice_id.as_uuid()).await;

        let mut invoice = self.store.get_invoice(invoice_id).await?;
        if invoice.status != InvoiceStatus::Pending {
            return Ok(OverdueOutcome::AlreadyHandled);
        }

        let _customer_guard = self.locks.acquire(*invoice.customer_id.as_uuid()).await;

        invoice.mark_overdue()?;
        self.store.update_invoice(&invoice).await?;

        let contract = self.contracts.get(invoice.contract_id).await?;
        if contract.is_active() {
            let mut contract = contract;
            contract.suspend()?;
            self.contracts.update(&contract).await?;
            info!(
                invoice = %invoice.id,
                contract = %contract.id,
                "invoice overdue, contract suspended"
            );
            return Ok(OverdueOutcome::MarkedAndSuspended(contract.id));
        }

        info!(invoice = %invoice.id, "invoice overdue");
        Ok(OverdueOutcome::MarkedOverdue)
    }

    /// Flags an invoice so the due-date reminder is not re-sent
    pub async fn mark_reminder_sent(&self, invoice_id: InvoiceId) -> Result<(), BillingError> {
        let _invoice_guard = self.locks.acquire(*invoice_id.as_uuid()).await;

        let mut invoice = self.store.get_invoice(invoice_id).await?;
        if invoice.reminder_sent {
            return Ok(());
        }
        invoice.mark_reminder_sent();
        self.store.update_invoice(&invoice).await?;
        Ok(())
    }

    /// Confirms a reported payment against the bank statement
    pub async fn verify_payment(&self, payment_id: PaymentId) -> Result<Payment, BillingError> {
        let mut payment = self.store.get_payment(payment_id).await?;
        payment.verify()?;
        self.store.update_payment(&payment).await?;
        Ok(payment)
    }

    /// Rejects a reported payment
    pub async fn reject_payment(&self, payment_id: PaymentId) -> Result<Payment, BillingError> {
        let mut payment = self.store.get_payment(payment_id).await?;
        payment.reject()?;
        self.store.update_payment(&payment).await?;
        Ok(payment)
    }

    /// Loads a customer and refuses soft-deleted accounts
    async fn active_customer(&self, id: CustomerId) -> Result<Customer, BillingError> {
        let customer = self.customers.get(id).await?;
        if customer.deleted {
            return Err(BillingError::not_found("Customer", id));
        }
        Ok(customer)
    }

    async fn current_rate(&self) -> Result<ExchangeRate, BillingError> {
        self.rates
            .current_rate()
            .await
            .map_err(|e| BillingError::RateUnavailable(e.to_string()))
    }

    /// Reactivates the customer's contract if it is suspended
    async fn reactivate_suspended_contract(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<Contract>, BillingError> {
        let Some(mut contract) = self.contracts.find_open_by_customer(customer_id).await? else {
            return Ok(None);
        };
        if contract.is_active() {
            return Ok(None);
        }
        contract.reactivate()?;
        self.contracts.update(&contract).await?;
        info!(contract = %contract.id, customer = %customer_id, "contract reactivated after payment");
        Ok(Some(contract))
    }
}
