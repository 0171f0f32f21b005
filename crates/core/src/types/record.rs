//! Sales record type and date handling.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Format used when writing record dates.
pub const RECORD_DATE_FORMAT: &str = "%Y-%m-%d";

/// Date-only formats accepted when reading a record file.
const DATE_FORMATS: &[&str] = &[RECORD_DATE_FORMAT, "%Y/%m/%d", "%m/%d/%Y"];

/// Date-time formats accepted when reading a record file; the time is dropped.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Column headers of the record file.
///
/// These names are read by downstream consumers and must not change.
pub mod columns {
    /// Sale date.
    pub const DATE: &str = "Date";
    /// Product name.
    pub const PRODUCT: &str = "Produits_vendus";
    /// Units sold.
    pub const UNITS_SOLD: &str = "Ventes";
    /// Store visitors.
    pub const VISITORS: &str = "Visiteurs";
    /// Visitors who bought.
    pub const CONVERSIONS: &str = "Conversions";
    /// Revenue in the store currency.
    pub const REVENUE: &str = "Revenus";

    /// All headers in file order.
    pub const ALL: [&str; 6] = [DATE, PRODUCT, UNITS_SOLD, VISITORS, CONVERSIONS, REVENUE];
}

/// Parse a date cell from a record file.
///
/// Returns `None` for empty or unrecognised text instead of failing, so a
/// single bad cell never prevents the rest of the table from loading.
///
/// ```
/// use chrono::NaiveDate;
/// use revtee_core::parse_record_date;
///
/// let expected = NaiveDate::from_ymd_opt(2024, 1, 31);
/// assert_eq!(parse_record_date("2024-01-31"), expected);
/// assert_eq!(parse_record_date("2024-01-31 00:00:00"), expected);
/// assert_eq!(parse_record_date("01/31/2024"), expected);
/// assert_eq!(parse_record_date("not a date"), None);
/// ```
#[must_use]
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|datetime| datetime.date())
        })
}

/// One row of sales activity for a product on a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRecord {
    /// Day of the activity; `None` when the stored value could not be parsed.
    pub date: Option<NaiveDate>,
    /// Product name.
    pub product: String,
    /// Units sold.
    pub units_sold: u64,
    /// Store visitors.
    pub visitors: u64,
    /// Visitors who bought.
    pub conversions: u64,
    /// Revenue, never negative.
    pub revenue: Decimal,
}

impl SalesRecord {
    /// Whether the product name has visible content.
    #[must_use]
    pub fn has_product(&self) -> bool {
        !self.product.trim().is_empty()
    }

    /// The date as written to the record file; empty when missing.
    #[must_use]
    pub fn formatted_date(&self) -> String {
        self.date
            .map(|date| date.format(RECORD_DATE_FORMAT).to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_record_date("2024-03-05"), Some(date(2024, 3, 5)));
        assert_eq!(parse_record_date("  2024-03-05  "), Some(date(2024, 3, 5)));
    }

    #[test]
    fn test_parse_datetime_drops_time() {
        assert_eq!(
            parse_record_date("2024-03-05 13:45:00"),
            Some(date(2024, 3, 5))
        );
        assert_eq!(
            parse_record_date("2024-03-05T13:45:00"),
            Some(date(2024, 3, 5))
        );
        assert_eq!(
            parse_record_date("2024-03-05 13:45:00.250"),
            Some(date(2024, 3, 5))
        );
    }

    #[test]
    fn test_parse_slash_formats() {
        assert_eq!(parse_record_date("2024/03/05"), Some(date(2024, 3, 5)));
        assert_eq!(parse_record_date("03/05/2024"), Some(date(2024, 3, 5)));
    }

    #[test]
    fn test_unparsable_dates_are_missing() {
        assert_eq!(parse_record_date(""), None);
        assert_eq!(parse_record_date("yesterday"), None);
        assert_eq!(parse_record_date("2024-13-01"), None);
        assert_eq!(parse_record_date("2024-02-30"), None);
    }

    #[test]
    fn test_formatted_date() {
        let mut record = SalesRecord {
            date: Some(date(2024, 1, 1)),
            product: "Tee".to_string(),
            units_sold: 5,
            visitors: 20,
            conversions: 2,
            revenue: Decimal::from(500),
        };
        assert_eq!(record.formatted_date(), "2024-01-01");

        record.date = None;
        assert_eq!(record.formatted_date(), "");
    }

    #[test]
    fn test_has_product() {
        let mut record = SalesRecord {
            date: None,
            product: "   ".to_string(),
            units_sold: 0,
            visitors: 0,
            conversions: 0,
            revenue: Decimal::ZERO,
        };
        assert!(!record.has_product());

        record.product = "Hoodie".to_string();
        assert!(record.has_product());
    }

    #[test]
    fn test_columns_order() {
        assert_eq!(
            columns::ALL,
            [
                "Date",
                "Produits_vendus",
                "Ventes",
                "Visiteurs",
                "Conversions",
                "Revenus"
            ]
        );
    }
}
