//! Overdue sweep
//!
//! Periodic scan over pending invoices:
//!
//! - one day before the due date, a reminder goes out through the
//!   [`Notifier`] and the invoice is flagged so it is not reminded twice;
//! - at or past the due date, the invoice moves to `overdue` and the
//!   associated contract is suspended, both as one unit.
//!
//! The sweep is single-flight: if a tick fires while the previous run is
//! still scanning, it is skipped. A failure on one invoice is recorded and
//! the scan continues with the next; re-running the sweep produces no
//! additional transitions.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use domain_customer::CustomerStore;

use crate::notify::Notifier;
use crate::ports::BillingStore;
use crate::service::{BillingService, OverdueOutcome};
use crate::invoice::InvoiceStatus;

/// Summary of one sweep run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Whether this tick was skipped because a run was already active
    pub skipped: bool,
    /// Pending invoices examined
    pub examined: usize,
    /// Reminders emitted this run
    pub reminders_sent: usize,
    /// Invoices transitioned to overdue
    pub marked_overdue: usize,
    /// Contracts suspended as a consequence
    pub contracts_suspended: usize,
    /// Invoices whose processing failed; the scan continued past them
    pub failures: usize,
}

impl SweepReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// The scheduled batch process advancing unpaid invoices past their due date
pub struct OverdueSweep {
    service: Arc<BillingService>,
    store: Arc<dyn BillingStore>,
    customers: Arc<dyn CustomerStore>,
    notifier: Arc<dyn Notifier>,
    run_lock: Mutex<()>,
}

impl OverdueSweep {
    pub fn new(
        service: Arc<BillingService>,
        store: Arc<dyn BillingStore>,
        customers: Arc<dyn CustomerStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            service,
            store,
            customers,
            notifier,
            run_lock: Mutex::new(()),
        }
    }

    /// Runs one sweep, or skips it if the previous run is still going
    #[instrument(skip(self))]
    pub async fn run(&self) -> SweepReport {
        let Ok(_guard) = self.run_lock.try_lock() else {
            debug!("previous sweep still running, skipping tick");
            return SweepReport::skipped();
        };

        let mut report = SweepReport::default();
        let now = Utc::now();

        let pending = match self.store.list_invoices_by_status(InvoiceStatus::Pending).await {
            Ok(pending) => pending,
            Err(err) => {
                error!(error = %err, "sweep could not list pending invoices");
                report.failures += 1;
                return report;
            }
        };

        info!(pending = pending.len(), "sweep started");
        report.examined = pending.len();

        for invoice in pending {
            let days = invoice.days_until_due(now);

            if days == 1 && !invoice.reminder_sent {
                self.send_reminder(&invoice, &mut report).await;
            }

            if days <= 0 {
                match self.service.process_overdue(invoice.id).await {
                    Ok(OverdueOutcome::AlreadyHandled) => {}
                    Ok(OverdueOutcome::MarkedOverdue) => {
                        report.marked_overdue += 1;
                    }
                    Ok(OverdueOutcome::MarkedAndSuspended(_)) => {
                        report.marked_overdue += 1;
                        report.contracts_suspended += 1;
                    }
                    Err(err) => {
                        // One bad invoice must not stop the scan
                        error!(invoice = %invoice.id, error = %err, "sweep failed to process invoice");
                        report.failures += 1;
                    }
                }
            }
        }

        info!(
            examined = report.examined,
            reminders = report.reminders_sent,
            overdue = report.marked_overdue,
            suspended = report.contracts_suspended,
            failures = report.failures,
            "sweep completed"
        );
        report
    }

    /// Spawns the sweep on a fixed interval
    ///
    /// Ticks that land while a run is active resolve to skipped runs, so
    /// overlapping executions cannot happen regardless of the interval.
    pub fn spawn(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick fires immediately; run once at startup, then on the interval
            loop {
                ticker.tick().await;
                self.run().await;
            }
        })
    }

    /// Reminder delivery is fire-and-forget: a notifier failure is logged
    /// and the invoice stays unflagged so the next run retries
    async fn send_reminder(&self, invoice: &crate::invoice::Invoice, report: &mut SweepReport) {
        let email = match self.customers.get(invoice.customer_id).await {
            Ok(customer) => customer.email,
            Err(err) => {
                warn!(invoice = %invoice.id, error = %err, "reminder skipped, customer lookup failed");
                report.failures += 1;
                return;
            }
        };

        match self.notifier.due_reminder(invoice, &email).await {
            Ok(()) => {
                if let Err(err) = self.service.mark_reminder_sent(invoice.id).await {
                    warn!(invoice = %invoice.id, error = %err, "failed to flag reminder as sent");
                    report.failures += 1;
                } else {
                    report.reminders_sent += 1;
                }
            }
            Err(err) => {
                warn!(invoice = %invoice.id, error = %err, "reminder delivery failed");
                report.failures += 1;
            }
        }
    }
}
