//! Notifier port for due-date reminders
//!
//! Reminders are fire-and-forget: a notifier failure is logged by the
//! sweep and never blocks an invoice transition.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use core_kernel::{InvoiceId, PortError};

use crate::invoice::Invoice;

/// Delivery channel for customer-facing reminders
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Tells the customer their invoice is due tomorrow
    async fn due_reminder(&self, invoice: &Invoice, email: &str) -> Result<(), PortError>;
}

/// Notifier that only writes a structured log line
///
/// Stands in for the real mail channel in local runs.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn due_reminder(&self, invoice: &Invoice, email: &str) -> Result<(), PortError> {
        info!(
            invoice = %invoice.id,
            period = %invoice.period,
            %email,
            "invoice due tomorrow, reminder emitted"
        );
        Ok(())
    }
}

/// Test notifier that records which invoices were reminded
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<InvoiceId>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoice ids reminded so far
    pub async fn sent(&self) -> Vec<InvoiceId> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn due_reminder(&self, invoice: &Invoice, _email: &str) -> Result<(), PortError> {
        self.sent.lock().await.push(invoice.id);
        Ok(())
    }
}

/// Test notifier that always fails, for exercising the fire-and-forget path
#[derive(Debug, Default)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn due_reminder(&self, _invoice: &Invoice, _email: &str) -> Result<(), PortError> {
        Err(PortError::ServiceUnavailable {
            service: "mail relay".to_string(),
        })
    }
}
