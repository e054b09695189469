//! Service plan entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Money, PlanId};

/// Market segment a plan is sold to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanCategory {
    /// Residential service
    Home,
    /// Small-business service
    Business,
}

impl std::fmt::Display for PlanCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanCategory::Home => write!(f, "home"),
            PlanCategory::Business => write!(f, "business"),
        }
    }
}

impl std::str::FromStr for PlanCategory {
    type Err = crate::error::CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(PlanCategory::Home),
            "business" => Ok(PlanCategory::Business),
            other => Err(crate::error::CatalogError::Validation(format!(
                "unknown plan category: {other}"
            ))),
        }
    }
}

/// A service tier offered to subscribers
///
/// Invoices snapshot the plan price at issuance, so administrative edits
/// and deactivation never retroactively change issued invoices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Unique identifier
    pub id: PlanId,
    /// Commercial name, e.g. "Basic 100 Mbps"
    pub name: String,
    /// Download bandwidth in Mbps
    pub bandwidth_mbps: u32,
    /// Monthly price in USD
    pub price_usd: Money,
    /// Market segment
    pub category: PlanCategory,
    /// Whether the plan can be contracted
    pub active: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    /// Creates a new active plan
    pub fn new(
        name: impl Into<String>,
        bandwidth_mbps: u32,
        price_usd: Money,
        category: PlanCategory,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: PlanId::new_v7(),
            name: name.into(),
            bandwidth_mbps,
            price_usd,
            category,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Removes the plan from the offer; existing contracts are unaffected
    pub fn deactivate(&mut self) {
        self.active = false;
        self.updated_at = Utc::now();
    }

    /// Puts the plan back on offer
    pub fn reactivate(&mut self) {
        self.active = true;
        self.updated_at = Utc::now();
    }
}
