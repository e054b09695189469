//! Contract entity and its state machine
//!
//! A contract binds exactly one customer to one plan. At most one
//! non-finalized contract may exist per customer; the store enforces that
//! at creation.
//!
//! # State machine
//!
//! ```text
//! active <-----> suspended
//!    \             /
//!     +-> finalized (terminal)
//! ```
//!
//! Suspension is driven by the overdue sweep (or an administrator);
//! reactivation happens when an associated invoice is paid. The contract
//! is the sole authority on suspension - the plan's `active` flag only
//! controls whether new contracts may reference it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ContractId, CustomerId, PlanId};

use crate::error::CatalogError;

/// Contract lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    /// Service is being provided
    Active,
    /// Service cut for non-payment; reactivated when the invoice is paid
    Suspended,
    /// Contract ended; terminal
    Finalized,
}

impl std::fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractStatus::Active => write!(f, "active"),
            ContractStatus::Suspended => write!(f, "suspended"),
            ContractStatus::Finalized => write!(f, "finalized"),
        }
    }
}

impl std::str::FromStr for ContractStatus {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ContractStatus::Active),
            "suspended" => Ok(ContractStatus::Suspended),
            "finalized" => Ok(ContractStatus::Finalized),
            other => Err(CatalogError::Validation(format!(
                "unknown contract status: {other}"
            ))),
        }
    }
}

/// The commercial agreement binding one customer to one plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    /// Unique identifier
    pub id: ContractId,
    /// The subscribing customer
    pub customer_id: CustomerId,
    /// The contracted plan
    pub plan_id: PlanId,
    /// Lifecycle state
    pub status: ContractStatus,
    /// When service started
    pub started_at: DateTime<Utc>,
    /// When the contract was last suspended, if ever
    pub suspended_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// Creates a new active contract
    pub fn new(customer_id: CustomerId, plan_id: PlanId) -> Self {
        let now = Utc::now();

        Self {
            id: ContractId::new_v7(),
            customer_id,
            plan_id,
            status: ContractStatus::Active,
            started_at: now,
            suspended_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Suspends service for non-payment
    ///
    /// Only an active contract can be suspended.
    pub fn suspend(&mut self) -> Result<(), CatalogError> {
        match self.status {
            ContractStatus::Active => {
                self.status = ContractStatus::Suspended;
                self.suspended_at = Some(Utc::now());
                self.updated_at = Utc::now();
                Ok(())
            }
            from => Err(CatalogError::InvalidTransition {
                from: from.to_string(),
                to: ContractStatus::Suspended.to_string(),
            }),
        }
    }

    /// Restores service after the outstanding invoice is paid
    pub fn reactivate(&mut self) -> Result<(), CatalogError> {
        match self.status {
            ContractStatus::Suspended => {
                self.status = ContractStatus::Active;
                self.suspended_at = None;
                self.updated_at = Utc::now();
                Ok(())
            }
            from => Err(CatalogError::InvalidTransition {
                from: from.to_string(),
                to: ContractStatus::Active.to_string(),
            }),
        }
    }

    /// Ends the contract permanently
    pub fn finalize(&mut self) -> Result<(), CatalogError> {
        match self.status {
            ContractStatus::Active | ContractStatus::Suspended => {
                self.status = ContractStatus::Finalized;
                self.updated_at = Utc::now();
                Ok(())
            }
            from => Err(CatalogError::InvalidTransition {
                from: from.to_string(),
                to: ContractStatus::Finalized.to_string(),
            }),
        }
    }

    /// Returns true if service is currently provided
    pub fn is_active(&self) -> bool {
        self.status == ContractStatus::Active
    }

    /// Returns true if the contract still occupies the customer's slot
    pub fn is_open(&self) -> bool {
        self.status != ContractStatus::Finalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_contract() -> Contract {
        Contract::new(CustomerId::new_v7(), PlanId::new_v7())
    }

    #[test]
    fn test_new_contract_is_active() {
        let contract = test_contract();
        assert_eq!(contract.status, ContractStatus::Active);
        assert!(contract.is_active());
        assert!(contract.is_open());
    }

    #[test]
    fn test_suspend_and_reactivate() {
        let mut contract = test_contract();
        contract.suspend().unwrap();
        assert_eq!(contract.status, ContractStatus::Suspended);
        assert!(contract.suspended_at.is_some());

        contract.reactivate().unwrap();
        assert_eq!(contract.status, ContractStatus::Active);
        assert!(contract.suspended_at.is_none());
    }

    #[test]
    fn test_double_suspend_rejected() {
        let mut contract = test_contract();
        contract.suspend().unwrap();
        assert!(contract.suspend().is_err());
    }

    #[test]
    fn test_reactivate_active_rejected() {
        let mut contract = test_contract();
        assert!(contract.reactivate().is_err());
    }

    #[test]
    fn test_finalized_is_terminal() {
        let mut contract = test_contract();
        contract.finalize().unwrap();
        assert!(!contract.is_open());
        assert!(contract.suspend().is_err());
        assert!(contract.reactivate().is_err());
        assert!(contract.finalize().is_err());
    }

    #[test]
    fn test_finalize_from_suspended() {
        let mut contract = test_contract();
        contract.suspend().unwrap();
        contract.finalize().unwrap();
        assert_eq!(contract.status, ContractStatus::Finalized);
    }
}
