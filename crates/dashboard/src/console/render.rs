//! Plain-text rendering of dashboard views.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use revtee_core::types::record::columns;
use revtee_core::{KpiSet, SalesRecord, UserAccount};

use crate::config::DashboardConfig;
use crate::services::analytics::{ChartData, ProductSeries};
use crate::store::LoadNotice;

/// Width of a 100% bar in the revenue chart.
const BAR_WIDTH: u32 = 40;

fn format_row<'a>(cells: impl IntoIterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .into_iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Lay out `rows` under `headers` in left-aligned columns.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let mut lines = vec![
        format_row(headers.iter().copied(), &widths),
        format_row(rule.iter().map(String::as_str), &widths),
    ];
    for row in rows {
        lines.push(format_row(row.iter().map(String::as_str), &widths));
    }
    lines.join("\n")
}

/// Records as a table, or a placeholder when there are none.
pub fn records(records: &[&SalesRecord]) -> String {
    if records.is_empty() {
        return "(no records)".to_string();
    }
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.formatted_date(),
                r.product.clone(),
                r.units_sold.to_string(),
                r.visitors.to_string(),
                r.conversions.to_string(),
                r.revenue.to_string(),
            ]
        })
        .collect();
    format!(
        "{}\n{} record(s)",
        table(&columns::ALL, &rows),
        records.len()
    )
}

/// One block of indicators per KPI set.
pub fn kpis(sets: &[KpiSet], config: &DashboardConfig) -> String {
    sets.iter()
        .map(|set| {
            [
                format!("Indicators: {}", set.scope),
                format!("  Total sales      {} {}", set.total_units, config.unit_label),
                format!("  Total visitors   {}", set.total_visitors),
                format!("  Conversion rate  {}", set.conversion_rate_display()),
                format!(
                    "  Total revenue    {} {}",
                    set.total_revenue.round_dp(2),
                    config.currency
                ),
            ]
            .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn trend(title: &str, series: &[ProductSeries]) -> String {
    let mut rows = Vec::new();
    for s in series {
        for (i, point) in s.points.iter().enumerate() {
            let product = if i == 0 { s.product.clone() } else { String::new() };
            rows.push(vec![
                product,
                point.date.format(revtee_core::RECORD_DATE_FORMAT).to_string(),
                point.value.to_string(),
            ]);
        }
    }
    if rows.is_empty() {
        return format!("{title}\n(no dated records)");
    }
    format!("{title}\n{}", table(&["Product", "Date", "Value"], &rows))
}

fn bar(share: Decimal) -> String {
    let len = (share * Decimal::from(BAR_WIDTH) / Decimal::ONE_HUNDRED)
        .round()
        .to_usize()
        .unwrap_or(0);
    "#".repeat(len)
}

/// The three chart series as text.
pub fn charts(data: &ChartData, config: &DashboardConfig) -> String {
    let revenue_rows: Vec<Vec<String>> = data
        .revenue_distribution
        .iter()
        .map(|share| {
            vec![
                share.product.clone(),
                format!("{} {}", share.revenue.round_dp(2), config.currency),
                format!("{:.2}%", share.share),
                bar(share.share),
            ]
        })
        .collect();
    let revenue = if revenue_rows.is_empty() {
        "Revenue distribution\n(no records)".to_string()
    } else {
        format!(
            "Revenue distribution\n{}",
            table(&["Product", "Revenue", "Share", ""], &revenue_rows)
        )
    };

    [
        trend(
            &format!("Sales trend ({} per day)", config.unit_label),
            &data.sales_trend,
        ),
        trend("Visitor trend (visitors per day)", &data.visitor_trend),
        revenue,
    ]
    .join("\n\n")
}

/// Accounts with their roles. Digests are never shown.
pub fn users(accounts: &[UserAccount]) -> String {
    let rows: Vec<Vec<String>> = accounts
        .iter()
        .map(|a| vec![a.username.to_string(), a.role.to_string()])
        .collect();
    table(&["Username", "Role"], &rows)
}

/// Load notices, one per line.
pub fn notices(notices: &[LoadNotice]) -> String {
    notices
        .iter()
        .map(|n| format!("notice: {n}"))
        .collect::<Vec<_>>()
        .join("\n")
}
