//! Customer entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CustomerId, Currency, Money};

use crate::error::CustomerError;

/// Role assigned to an authenticated customer account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular subscriber
    Customer,
    /// Back-office administrator
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Customer => write!(f, "customer"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = CustomerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(CustomerError::InvalidRole(other.to_string())),
        }
    }
}

/// Service address embedded in the customer record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// City of the service location
    pub city: String,
    /// Neighborhood or urbanization
    pub neighborhood: String,
    /// Street
    pub street: String,
    /// Apartment or house number
    pub unit: Option<String>,
}

/// A registered customer account
///
/// The favor balance is denominated in USD-equivalent terms and is mutated
/// only through the billing ledger: debited when an invoice is issued and
/// credited when a payment is applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Unique identifier
    pub id: CustomerId,
    /// National identity document number (unique, 7-9 digits)
    pub cedula: String,
    /// Email address (unique)
    pub email: String,
    /// Credential hash; never the plaintext password
    pub password_hash: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Phone number (11 digits)
    pub phone: Option<String>,
    /// Service address
    pub address: Option<Address>,
    /// Authorization role
    pub role: Role,
    /// USD-equivalent favor balance
    pub balance_usd: Money,
    /// Soft-delete flag; deleted customers keep their financial history
    pub deleted: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Creates a new customer account with a zero balance
    pub fn new(
        cedula: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: CustomerId::new_v7(),
            cedula: cedula.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone: None,
            address: None,
            role: Role::Customer,
            balance_usd: Money::zero(Currency::USD),
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the phone number
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Sets the service address
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Promotes the account to administrator
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Returns the customer's display name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Applies a signed USD delta to the favor balance
    ///
    /// Positive deltas credit the account, negative deltas debit it. The
    /// balance may go negative: an issued-but-unpaid invoice leaves the
    /// customer owing money.
    pub fn apply_balance_delta(&mut self, delta: Money) -> Result<(), CustomerError> {
        self.balance_usd = self.balance_usd.checked_add(&delta)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Marks the account as deleted without removing it
    pub fn soft_delete(&mut self) {
        self.deleted = true;
        self.updated_at = Utc::now();
    }

    /// Returns true if the account can act in the system
    pub fn is_active(&self) -> bool {
        !self.deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_customer() -> Customer {
        Customer::new("12345678", "ana@example.com", "hash", "Ana", "Moreno")
    }

    #[test]
    fn test_new_customer_defaults() {
        let c = test_customer();
        assert_eq!(c.role, Role::Customer);
        assert_eq!(c.balance_usd, Money::zero(Currency::USD));
        assert!(!c.deleted);
        assert!(c.is_active());
    }

    #[test]
    fn test_balance_delta_debit_and_credit() {
        let mut c = test_customer();
        c.apply_balance_delta(Money::usd(dec!(-25))).unwrap();
        assert_eq!(c.balance_usd.amount(), dec!(-25));

        c.apply_balance_delta(Money::usd(dec!(25))).unwrap();
        assert!(c.balance_usd.is_zero());
    }

    #[test]
    fn test_balance_delta_rejects_ved() {
        let mut c = test_customer();
        let result = c.apply_balance_delta(Money::ved(dec!(100)));
        assert!(result.is_err());
    }

    #[test]
    fn test_soft_delete() {
        let mut c = test_customer();
        c.soft_delete();
        assert!(c.deleted);
        assert!(!c.is_active());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("customer".parse::<Role>().unwrap(), Role::Customer);
        assert!("root".parse::<Role>().is_err());
    }
}
