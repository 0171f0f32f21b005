//! Filtering and aggregation of sales records.
//!
//! Everything here is a pure function over borrowed records. Functions take
//! any iterator of `&SalesRecord`, so a filtered subset can be fed back in
//! without copying.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use revtee_core::{DateRange, KpiScope, KpiSet, ProductSelection, SalesRecord};

/// Errors that stop KPIs or charts from being computed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    /// No product is selected.
    #[error("select at least one product to see indicators")]
    EmptySelection,

    /// No record has a usable date, so there is no range to filter on.
    #[error("no record has a valid date")]
    NoValidDates,

    /// A sum is too large to represent.
    #[error("{0} is too large to compute")]
    Overflow(&'static str),
}

fn add_count(sum: u64, value: u64, metric: &'static str) -> Result<u64, AnalyticsError> {
    sum.checked_add(value).ok_or(AnalyticsError::Overflow(metric))
}

fn add_revenue(sum: Decimal, value: Decimal) -> Result<Decimal, AnalyticsError> {
    sum.checked_add(value).ok_or(AnalyticsError::Overflow("total revenue"))
}

// =============================================================================
// Filtering
// =============================================================================

/// Records inside `range` whose product passes `selection`, in input order.
///
/// Applying the same filter twice gives the same result as applying it once.
pub fn filter<'a, I>(
    records: I,
    range: &DateRange,
    selection: &ProductSelection,
) -> Vec<&'a SalesRecord>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    records
        .into_iter()
        .filter(|r| range.contains(r.date) && selection.matches(&r.product))
        .collect()
}

// =============================================================================
// KPIs
// =============================================================================

/// Sum the metrics of `records`.
///
/// The conversion rate is `100 × conversions / visitors`, or zero when there
/// are no visitors.
///
/// # Errors
///
/// Returns `AnalyticsError::Overflow` if a sum does not fit its type.
pub fn aggregate<'a, I>(scope: KpiScope, records: I) -> Result<KpiSet, AnalyticsError>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut kpis = KpiSet::zero(scope);
    for record in records {
        kpis.total_units = add_count(kpis.total_units, record.units_sold, "units sold")?;
        kpis.total_visitors = add_count(kpis.total_visitors, record.visitors, "visitors")?;
        kpis.total_conversions =
            add_count(kpis.total_conversions, record.conversions, "conversions")?;
        kpis.total_revenue = add_revenue(kpis.total_revenue, record.revenue)?;
    }

    if kpis.total_visitors > 0 {
        kpis.conversion_rate = Decimal::from(kpis.total_conversions)
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|c| c.checked_div(Decimal::from(kpis.total_visitors)))
            .ok_or(AnalyticsError::Overflow("conversion rate"))?;
    }
    Ok(kpis)
}

/// KPIs for a filtered subset.
///
/// `All` yields one set over every record. A product list yields one set per
/// product in selection order; products without rows get zeros.
///
/// # Errors
///
/// Returns `AnalyticsError::EmptySelection` if no product is selected and
/// `AnalyticsError::Overflow` if a sum does not fit its type.
pub fn kpis(
    records: &[&SalesRecord],
    selection: &ProductSelection,
) -> Result<Vec<KpiSet>, AnalyticsError> {
    match selection {
        ProductSelection::All => Ok(vec![aggregate(
            KpiScope::AllProducts,
            records.iter().copied(),
        )?]),
        ProductSelection::Products(products) if products.is_empty() => {
            Err(AnalyticsError::EmptySelection)
        }
        ProductSelection::Products(products) => products
            .iter()
            .map(|product| {
                aggregate(
                    KpiScope::Product(product.clone()),
                    records.iter().copied().filter(|r| r.product == *product),
                )
            })
            .collect(),
    }
}

// =============================================================================
// Chart Series
// =============================================================================

/// One value of a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    /// Day.
    pub date: NaiveDate,
    /// Sum for that day.
    pub value: u64,
}

/// Daily values for one product, dates ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSeries {
    /// Product name.
    pub product: String,
    /// Points, one per day with data.
    pub points: Vec<TrendPoint>,
}

/// Revenue of one product and its share of the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevenueShare {
    /// Product name.
    pub product: String,
    /// Summed revenue.
    pub revenue: Decimal,
    /// Percentage of total revenue, two decimals; zero when the total is zero.
    pub share: Decimal,
}

/// Data behind the dashboard charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartData {
    /// Units sold per day per product.
    pub sales_trend: Vec<ProductSeries>,
    /// Visitors per day per product.
    pub visitor_trend: Vec<ProductSeries>,
    /// Revenue per product.
    pub revenue_distribution: Vec<RevenueShare>,
}

/// Build every chart series for `records`.
///
/// # Errors
///
/// Returns `AnalyticsError::Overflow` if a daily or product sum does not fit
/// its type.
pub fn charts(records: &[&SalesRecord]) -> Result<ChartData, AnalyticsError> {
    Ok(ChartData {
        sales_trend: sales_trend(records.iter().copied())?,
        visitor_trend: visitor_trend(records.iter().copied())?,
        revenue_distribution: revenue_distribution(records.iter().copied())?,
    })
}

/// Units sold per day, one series per product in first-seen order.
///
/// # Errors
///
/// Returns `AnalyticsError::Overflow` if a daily sum does not fit in `u64`.
pub fn sales_trend<'a, I>(records: I) -> Result<Vec<ProductSeries>, AnalyticsError>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    trend(records, "units sold", |r| r.units_sold)
}

/// Visitors per day, one series per product in first-seen order.
///
/// # Errors
///
/// Returns `AnalyticsError::Overflow` if a daily sum does not fit in `u64`.
pub fn visitor_trend<'a, I>(records: I) -> Result<Vec<ProductSeries>, AnalyticsError>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    trend(records, "visitors", |r| r.visitors)
}

fn trend<'a, I>(
    records: I,
    name: &'static str,
    metric: fn(&SalesRecord) -> u64,
) -> Result<Vec<ProductSeries>, AnalyticsError>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut series: Vec<(String, BTreeMap<NaiveDate, u64>)> = Vec::new();
    for record in records {
        // Undated rows cannot be placed on a time axis.
        let Some(date) = record.date else {
            continue;
        };
        let index = series
            .iter()
            .position(|(p, _)| *p == record.product)
            .unwrap_or_else(|| {
                series.push((record.product.clone(), BTreeMap::new()));
                series.len() - 1
            });
        if let Some((_, days)) = series.get_mut(index) {
            let value = days.entry(date).or_insert(0);
            *value = add_count(*value, metric(record), name)?;
        }
    }

    Ok(series
        .into_iter()
        .map(|(product, days)| ProductSeries {
            product,
            points: days
                .into_iter()
                .map(|(date, value)| TrendPoint { date, value })
                .collect(),
        })
        .collect())
}

/// Revenue per product in first-seen order, with percentage shares.
///
/// # Errors
///
/// Returns `AnalyticsError::Overflow` if the revenue total does not fit in a
/// `Decimal`.
pub fn revenue_distribution<'a, I>(records: I) -> Result<Vec<RevenueShare>, AnalyticsError>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut totals: Vec<(String, Decimal)> = Vec::new();
    for record in records {
        match totals.iter_mut().find(|(p, _)| *p == record.product) {
            Some((_, revenue)) => *revenue = add_revenue(*revenue, record.revenue)?,
            None => totals.push((record.product.clone(), record.revenue)),
        }
    }

    let total = totals
        .iter()
        .try_fold(Decimal::ZERO, |sum, (_, revenue)| add_revenue(sum, *revenue))?;
    totals
        .into_iter()
        .map(|(product, revenue)| {
            // The ratio is at most one, so scaling it by 100 stays in range.
            let share = if total.is_zero() {
                Decimal::ZERO
            } else {
                revenue
                    .checked_div(total)
                    .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                    .ok_or(AnalyticsError::Overflow("revenue share"))?
                    .round_dp(2)
            };
            Ok(RevenueShare {
                product,
                revenue,
                share,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(day: Option<u32>, product: &str, units: u64, visitors: u64, conv: u64, rev: i64) -> SalesRecord {
        SalesRecord {
            date: day.map(|d| date(2024, 1, d)),
            product: product.to_string(),
            units_sold: units,
            visitors,
            conversions: conv,
            revenue: Decimal::from(rev),
        }
    }

    fn sample() -> Vec<SalesRecord> {
        vec![
            record(Some(1), "Tee", 5, 20, 2, 500),
            record(Some(2), "Hoodie", 1, 10, 1, 300),
            record(Some(2), "Tee", 3, 30, 3, 300),
            record(None, "Tee", 9, 9, 9, 900),
            record(Some(20), "Cap", 2, 5, 0, 100),
        ]
    }

    fn first_week() -> DateRange {
        DateRange::between(date(2024, 1, 1), date(2024, 1, 7)).unwrap()
    }

    #[test]
    fn test_filter_by_range_and_product() {
        let records = sample();
        let tees = filter(&records, &first_week(), &ProductSelection::from_names(["Tee"]));
        assert_eq!(tees.len(), 2);
        assert!(tees.iter().all(|r| r.product == "Tee" && r.date.is_some()));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let records = sample();
        let range = first_week();
        for selection in [
            ProductSelection::All,
            ProductSelection::from_names(["Tee", "Cap"]),
            ProductSelection::from_names(Vec::<String>::new()),
        ] {
            let once = filter(&records, &range, &selection);
            let twice = filter(once.clone(), &range, &selection);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_filter_all_is_date_subset() {
        let records = sample();
        let range = first_week();
        let all = filter(&records, &range, &ProductSelection::All);
        let by_date: Vec<&SalesRecord> = records.iter().filter(|r| range.contains(r.date)).collect();
        assert_eq!(all, by_date);
    }

    #[test]
    fn test_trivial_range_keeps_undated_rows() {
        let records = sample();
        let all = filter(&records, &DateRange::unbounded(), &ProductSelection::All);
        assert_eq!(all.len(), records.len());
    }

    #[test]
    fn test_aggregate_empty_is_zero() {
        let kpis = aggregate(KpiScope::AllProducts, Vec::<&SalesRecord>::new()).unwrap();
        assert_eq!(kpis, KpiSet::zero(KpiScope::AllProducts));
    }

    #[test]
    fn test_aggregate_conversion_rate() {
        let records = vec![record(Some(1), "Tee", 5, 20, 2, 500)];
        let kpis = aggregate(KpiScope::AllProducts, &records).unwrap();
        assert_eq!(kpis.total_units, 5);
        assert_eq!(kpis.total_visitors, 20);
        assert_eq!(kpis.conversion_rate, Decimal::from(10));
        assert_eq!(kpis.total_revenue, Decimal::from(500));
    }

    #[test]
    fn test_aggregate_zero_visitors() {
        let records = vec![record(Some(1), "Tee", 5, 0, 3, 500)];
        let kpis = aggregate(KpiScope::AllProducts, &records).unwrap();
        assert_eq!(kpis.conversion_rate, Decimal::ZERO);
        assert_eq!(kpis.total_conversions, 3);
    }

    #[test]
    fn test_kpis_per_product_in_selection_order() {
        let records = sample();
        let subset = filter(&records, &first_week(), &ProductSelection::All);
        let selection = ProductSelection::from_names(["Hoodie", "Tee", "Socks"]);
        let sets = kpis(&subset, &selection).unwrap();

        assert_eq!(sets.len(), 3);
        assert_eq!(sets[0].scope, KpiScope::Product("Hoodie".to_string()));
        assert_eq!(sets[1].total_units, 8);
        assert_eq!(sets[1].conversion_rate, Decimal::from(10));
        assert_eq!(sets[2], KpiSet::zero(KpiScope::Product("Socks".to_string())));
    }

    #[test]
    fn test_kpis_all_is_single_set() {
        let records = sample();
        let subset = filter(&records, &first_week(), &ProductSelection::All);
        let sets = kpis(&subset, &ProductSelection::All).unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].total_units, 9);
        assert_eq!(sets[0].total_revenue, Decimal::from(1100));
    }

    #[test]
    fn test_kpis_empty_selection() {
        let selection = ProductSelection::from_names(Vec::<String>::new());
        assert_eq!(kpis(&[], &selection), Err(AnalyticsError::EmptySelection));
    }

    #[test]
    fn test_sales_trend() {
        let records = sample();
        let series = sales_trend(&records).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].product, "Tee");
        assert_eq!(
            series[0].points,
            vec![
                TrendPoint { date: date(2024, 1, 1), value: 5 },
                TrendPoint { date: date(2024, 1, 2), value: 3 },
            ]
        );
        assert_eq!(series[1].product, "Hoodie");
    }

    #[test]
    fn test_visitor_trend_sums_same_day() {
        let records = vec![
            record(Some(3), "Tee", 1, 10, 0, 0),
            record(Some(3), "Tee", 1, 15, 0, 0),
        ];
        let series = visitor_trend(&records).unwrap();
        assert_eq!(series[0].points, vec![TrendPoint { date: date(2024, 1, 3), value: 25 }]);
    }

    #[test]
    fn test_revenue_distribution() {
        let records = vec![
            record(Some(1), "Tee", 0, 0, 0, 300),
            record(Some(1), "Hoodie", 0, 0, 0, 100),
            record(Some(2), "Tee", 0, 0, 0, 600),
        ];
        let shares = revenue_distribution(&records).unwrap();
        assert_eq!(shares[0].product, "Tee");
        assert_eq!(shares[0].revenue, Decimal::from(900));
        assert_eq!(shares[0].share, Decimal::from(90));
        assert_eq!(shares[1].share, Decimal::from(10));
    }

    #[test]
    fn test_revenue_distribution_zero_total() {
        let records = vec![record(Some(1), "Tee", 1, 1, 0, 0)];
        let shares = revenue_distribution(&records).unwrap();
        assert_eq!(shares[0].share, Decimal::ZERO);
    }

    #[test]
    fn test_chart_data_json_shape() {
        let records = sample();
        let subset: Vec<&SalesRecord> = records.iter().collect();
        let json = serde_json::to_value(charts(&subset).unwrap()).unwrap();
        assert!(json["sales_trend"].is_array());
        assert_eq!(json["revenue_distribution"][0]["product"], "Tee");
        assert!(json["visitor_trend"][0]["points"][0]["date"].is_string());
    }

    #[test]
    fn test_huge_revenue_share_does_not_overflow() {
        let mut big = record(Some(1), "Tee", 1, 1, 1, 0);
        big.revenue = Decimal::from_i128_with_scale(10_i128.pow(27), 0);
        let small = record(Some(1), "Cap", 1, 1, 1, 0);
        let records = [big, small];

        let shares = revenue_distribution(&records).unwrap();
        assert_eq!(shares[0].share, Decimal::ONE_HUNDRED);
        assert_eq!(shares[1].share, Decimal::ZERO);
        assert!(charts(&records.iter().collect::<Vec<_>>()).is_ok());
    }

    #[test]
    fn test_revenue_total_overflow_is_an_error() {
        let mut first = record(Some(1), "Tee", 1, 1, 1, 0);
        first.revenue = Decimal::MAX;
        let mut second = record(Some(2), "Cap", 1, 1, 1, 0);
        second.revenue = Decimal::MAX;
        let records = [first, second];
        let subset: Vec<&SalesRecord> = records.iter().collect();

        assert_eq!(
            kpis(&subset, &ProductSelection::All),
            Err(AnalyticsError::Overflow("total revenue"))
        );
        assert_eq!(charts(&subset), Err(AnalyticsError::Overflow("total revenue")));
    }

    #[test]
    fn test_count_overflow_is_an_error() {
        let records = [
            record(Some(1), "Tee", u64::MAX, 1, 1, 0),
            record(Some(1), "Tee", 1, 1, 1, 0),
        ];
        assert_eq!(
            aggregate(KpiScope::AllProducts, &records),
            Err(AnalyticsError::Overflow("units sold"))
        );
        assert_eq!(sales_trend(&records), Err(AnalyticsError::Overflow("units sold")));
    }
}
