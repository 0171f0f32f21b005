//! Key performance indicator types.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::filter::ALL_PRODUCTS;

/// What a [`KpiSet`] was computed over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiScope {
    /// Every record in the filtered subset.
    AllProducts,
    /// The records of one product.
    Product(String),
}

impl fmt::Display for KpiScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllProducts => write!(f, "{ALL_PRODUCTS} Products"),
            Self::Product(name) => write!(f, "{name}"),
        }
    }
}

/// Aggregated sales metrics over a set of records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiSet {
    /// What the metrics cover.
    pub scope: KpiScope,
    /// Sum of units sold.
    pub total_units: u64,
    /// Sum of visitors.
    pub total_visitors: u64,
    /// Sum of conversions.
    pub total_conversions: u64,
    /// `100 × conversions / visitors`, or zero when there were no visitors.
    pub conversion_rate: Decimal,
    /// Sum of revenue.
    pub total_revenue: Decimal,
}

impl KpiSet {
    /// A zeroed set of metrics.
    #[must_use]
    pub const fn zero(scope: KpiScope) -> Self {
        Self {
            scope,
            total_units: 0,
            total_visitors: 0,
            total_conversions: 0,
            conversion_rate: Decimal::ZERO,
            total_revenue: Decimal::ZERO,
        }
    }

    /// Conversion rate rounded for display, e.g. `"10.00%"`.
    #[must_use]
    pub fn conversion_rate_display(&self) -> String {
        format!("{:.2}%", self.conversion_rate)
    }
}
