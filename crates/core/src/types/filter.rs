//! Filter types: date ranges and product selections.

use core::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::{RECORD_DATE_FORMAT, SalesRecord};

/// Sentinel product name meaning "do not filter by product".
pub const ALL_PRODUCTS: &str = "All";

/// Errors that can occur when building a [`DateRange`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DateRangeError {
    /// The start date is after the end date.
    #[error("start date {start} is after end date {end}")]
    Inverted {
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },
}

/// An inclusive range of calendar days.
///
/// Either bound may be open. A range with no bounds is *trivial*: it keeps
/// every record, including records whose date is missing. Any bounded range
/// excludes records without a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct DateRange {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateRange {
    /// A range covering `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns `DateRangeError::Inverted` if `start > end`.
    pub fn between(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if start > end {
            return Err(DateRangeError::Inverted { start, end });
        }
        Ok(Self {
            start: Some(start),
            end: Some(end),
        })
    }

    /// A range with optional bounds. Both `None` gives the trivial range.
    ///
    /// # Errors
    ///
    /// Returns `DateRangeError::Inverted` if both bounds are set and
    /// `start > end`.
    pub fn from_bounds(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self, DateRangeError> {
        if let (Some(start), Some(end)) = (start, end) {
            return Self::between(start, end);
        }
        Ok(Self { start, end })
    }

    /// A range with no bounds.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// The smallest range covering every valid date in `records`.
    ///
    /// Returns `None` when no record has a valid date.
    #[must_use]
    pub fn spanning(records: &[SalesRecord]) -> Option<Self> {
        let mut dates = records.iter().filter_map(|r| r.date);
        let first = dates.next()?;
        let (start, end) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(Self {
            start: Some(start),
            end: Some(end),
        })
    }

    /// Lower bound, if any.
    #[must_use]
    pub const fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    /// Upper bound, if any.
    #[must_use]
    pub const fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    /// Whether the range has no bounds.
    #[must_use]
    pub const fn is_trivial(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether a record dated `date` falls inside the range.
    #[must_use]
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        if self.is_trivial() {
            return true;
        }
        let Some(date) = date else {
            return false;
        };
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |d: Option<NaiveDate>| {
            d.map_or_else(|| "…".to_string(), |d| d.format(RECORD_DATE_FORMAT).to_string())
        };
        write!(f, "{} → {}", bound(self.start), bound(self.end))
    }
}

/// Which products a view is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductSelection {
    /// Every product, aggregated together.
    #[default]
    All,
    /// Only the named products, aggregated one by one, in this order.
    Products(Vec<String>),
}

impl ProductSelection {
    /// Build a selection from the names picked in a product selector.
    ///
    /// If any name is the [`ALL_PRODUCTS`] sentinel the selection is `All`,
    /// whatever else was picked. Duplicate names are dropped, keeping the
    /// first occurrence.
    ///
    /// ```
    /// use revtee_core::ProductSelection;
    ///
    /// assert_eq!(ProductSelection::from_names(["Tee", "All"]), ProductSelection::All);
    /// assert!(ProductSelection::from_names(Vec::<String>::new()).is_empty());
    /// ```
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut products: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if name == ALL_PRODUCTS {
                return Self::All;
            }
            if !products.contains(&name) {
                products.push(name);
            }
        }
        Self::Products(products)
    }

    /// Whether no product at all is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Products(products) if products.is_empty())
    }

    /// Whether a record for `product` passes the selection.
    #[must_use]
    pub fn matches(&self, product: &str) -> bool {
        match self {
            Self::All => true,
            Self::Products(products) => products.iter().any(|p| p == product),
        }
    }
}

impl fmt::Display for ProductSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "{ALL_PRODUCTS}"),
            Self::Products(products) if products.is_empty() => write!(f, "(none)"),
            Self::Products(products) => write!(f, "{}", products.join(", ")),
        }
    }
}
