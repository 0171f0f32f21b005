//! KPI report and CSV export commands.
//!
//! Both read the data file directly and apply the same date range and
//! product selection rules as the console.

use std::io::{self, Write};
use std::path::Path;

use chrono::NaiveDate;
use thiserror::Error;

use revtee_core::{DateRange, DateRangeError, ProductSelection};
use revtee_dashboard::DashboardConfig;
use revtee_dashboard::console::render;
use revtee_dashboard::services::analytics::{self, AnalyticsError};
use revtee_dashboard::services::export::{self, ExportError};
use revtee_dashboard::store::{RecordStore, RecordTable, StoreError};

/// Errors that can occur while building a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Data file could not be read.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Nothing to aggregate for the requested filter.
    #[error("{0}")]
    Analytics(#[from] AnalyticsError),

    /// `--from` is after `--to`.
    #[error("Invalid date range: {0}")]
    InvalidDateRange(#[from] DateRangeError),

    /// Writing the export failed.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Encoding JSON output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing to stdout failed.
    #[error("Output error: {0}")]
    Output(#[from] io::Error),
}

/// Date range and products from the command line.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    /// First day, inclusive.
    pub from: Option<NaiveDate>,
    /// Last day, inclusive.
    pub to: Option<NaiveDate>,
    /// Selected products; empty means `All`.
    pub products: Vec<String>,
}

impl ReportFilter {
    /// Without bounds the range spans the dates in the data.
    fn range(&self, records: &RecordTable) -> Result<DateRange, ReportError> {
        if self.from.is_none() && self.to.is_none() {
            return DateRange::spanning(records.records())
                .ok_or(ReportError::Analytics(AnalyticsError::NoValidDates));
        }
        Ok(DateRange::from_bounds(self.from, self.to)?)
    }

    fn selection(&self) -> ProductSelection {
        if self.products.is_empty() {
            ProductSelection::All
        } else {
            ProductSelection::from_names(self.products.iter().cloned())
        }
    }
}

fn load(config: &DashboardConfig) -> Result<RecordTable, ReportError> {
    Ok(RecordStore::new(&config.data_file).load()?.table)
}

/// Write KPIs for `filter` to `out`, as text or as JSON.
///
/// # Errors
///
/// Returns `ReportError::Store` if the data file cannot be read,
/// `ReportError::Analytics` if no record has a date and no bounds were
/// given, and `ReportError::Output` if writing fails.
pub fn kpis<W: Write>(
    config: &DashboardConfig,
    filter: &ReportFilter,
    json: bool,
    mut out: W,
) -> Result<(), ReportError> {
    let records = load(config)?;
    let range = filter.range(&records)?;
    let selection = filter.selection();

    let subset = analytics::filter(records.records(), &range, &selection);
    let sets = analytics::kpis(&subset, &selection)?;
    tracing::debug!(%range, %selection, records = subset.len(), "computed kpis");

    if json {
        let report = serde_json::json!({ "range": range, "kpis": sets });
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    } else {
        writeln!(out, "Date range: {range}\n\n{}", render::kpis(&sets, config))?;
    }
    Ok(())
}

/// Write the records passing `filter` to `output` as CSV.
///
/// # Errors
///
/// Returns `ReportError::Store` if the data file cannot be read and
/// `ReportError::Export` if the file cannot be written.
pub fn export(
    config: &DashboardConfig,
    filter: &ReportFilter,
    output: &Path,
) -> Result<usize, ReportError> {
    let records = load(config)?;
    let range = filter.range(&records)?;
    let subset = analytics::filter(records.records(), &range, &filter.selection());
    Ok(export::write_csv(output, subset)?)
}
