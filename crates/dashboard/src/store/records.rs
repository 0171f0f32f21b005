//! Record store: the sales data file and its in-memory table.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use revtee_core::types::record::columns;
use revtee_core::{SalesRecord, parse_record_date};

use super::{LoadNotice, Loaded, StoreError, ValidationError, open_reader, write_atomically};

// =============================================================================
// Record Table
// =============================================================================

/// Ordered, append-only list of sales records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordTable {
    records: Vec<SalesRecord>,
}

impl RecordTable {
    /// Build a table from records, kept in the given order.
    #[must_use]
    pub const fn from_records(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    /// All records in file order.
    #[must_use]
    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append one record.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyField` if the product name is blank and
    /// `ValidationError::InvalidValue` if the revenue is negative.
    pub fn append(&mut self, record: SalesRecord) -> Result<(), ValidationError> {
        if !record.has_product() {
            return Err(ValidationError::EmptyField("product"));
        }
        if record.revenue.is_sign_negative() && !record.revenue.is_zero() {
            return Err(ValidationError::InvalidValue {
                field: "revenue",
                message: "must not be negative".to_string(),
            });
        }
        self.records.push(record);
        Ok(())
    }

    /// Remove the most recently appended record.
    pub(crate) fn pop(&mut self) -> Option<SalesRecord> {
        self.records.pop()
    }

    /// Distinct product names in first-seen order, blanks skipped.
    #[must_use]
    pub fn products(&self) -> Vec<String> {
        let mut products: Vec<String> = Vec::new();
        for record in self.records.iter().filter(|r| r.has_product()) {
            if !products.iter().any(|p| *p == record.product) {
                products.push(record.product.clone());
            }
        }
        products
    }
}

// =============================================================================
// Cell Parsing
// =============================================================================

/// Parse a count column. Blank cells count as zero; integral decimals such
/// as `5.0` are accepted.
fn parse_count(raw: &str) -> Result<u64, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    if let Ok(value) = raw.parse::<u64>() {
        return Ok(value);
    }

    let value = Decimal::from_str(raw).map_err(|_| format!("'{raw}' is not a number"))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(format!("'{raw}' is negative"));
    }
    if !value.fract().is_zero() {
        return Err(format!("'{raw}' is not a whole number"));
    }
    value
        .trunc()
        .to_u64()
        .ok_or_else(|| format!("'{raw}' is out of range"))
}

/// Parse the revenue column. Blank cells count as zero.
fn parse_revenue(raw: &str) -> Result<Decimal, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let value = Decimal::from_str(raw).map_err(|_| format!("'{raw}' is not a number"))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(format!("'{raw}' is negative"));
    }
    Ok(value)
}

/// Column positions of a data file, read from its header row.
#[derive(Debug, Clone, Copy)]
struct Layout {
    date: usize,
    product: usize,
    units_sold: usize,
    visitors: usize,
    conversions: usize,
    revenue: usize,
}

impl Layout {
    fn from_header(path: &Path, row: &csv::StringRecord) -> Result<Self, StoreError> {
        let position = |name: &str| {
            row.iter()
                .position(|cell| cell.trim().trim_start_matches('\u{feff}') == name)
                .ok_or_else(|| StoreError::DataCorruption {
                    path: path.to_path_buf(),
                    line: 1,
                    column: name.to_owned(),
                    message: "column is missing from the header".to_string(),
                })
        };

        Ok(Self {
            date: position(columns::DATE)?,
            product: position(columns::PRODUCT)?,
            units_sold: position(columns::UNITS_SOLD)?,
            visitors: position(columns::VISITORS)?,
            conversions: position(columns::CONVERSIONS)?,
            revenue: position(columns::REVENUE)?,
        })
    }
}

/// Outcome of parsing one data row.
struct ParsedRow {
    record: SalesRecord,
    date_coerced: bool,
}

fn parse_row(
    path: &Path,
    layout: Layout,
    row: &csv::StringRecord,
) -> Result<ParsedRow, StoreError> {
    let line = row.position().map_or(0, csv::Position::line);
    let cell = |index: usize| row.get(index).unwrap_or_default();
    let count = |index: usize, column: &str| {
        parse_count(cell(index)).map_err(|message| StoreError::DataCorruption {
            path: path.to_path_buf(),
            line,
            column: column.to_owned(),
            message,
        })
    };

    let raw_date = cell(layout.date);
    let date = parse_record_date(raw_date);
    let revenue =
        parse_revenue(cell(layout.revenue)).map_err(|message| StoreError::DataCorruption {
            path: path.to_path_buf(),
            line,
            column: columns::REVENUE.to_owned(),
            message,
        })?;

    Ok(ParsedRow {
        record: SalesRecord {
            date,
            product: cell(layout.product).to_owned(),
            units_sold: count(layout.units_sold, columns::UNITS_SOLD)?,
            visitors: count(layout.visitors, columns::VISITORS)?,
            conversions: count(layout.conversions, columns::CONVERSIONS)?,
            revenue,
        },
        date_coerced: date.is_none() && !raw_date.trim().is_empty(),
    })
}

/// Write `records` with a header row to `writer`.
///
/// Dates are written as `YYYY-MM-DD`, missing dates as empty cells.
pub(crate) fn write_rows<'a, W, I>(
    writer: &mut csv::Writer<W>,
    records: I,
) -> Result<(), csv::Error>
where
    W: Write,
    I: IntoIterator<Item = &'a SalesRecord>,
{
    writer.write_record(columns::ALL)?;
    for record in records {
        writer.write_record([
            record.formatted_date(),
            record.product.clone(),
            record.units_sold.to_string(),
            record.visitors.to_string(),
            record.conversions.to_string(),
            record.revenue.to_string(),
        ])?;
    }
    Ok(())
}

// =============================================================================
// Store
// =============================================================================

/// Reads and writes the sales data file.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    /// Create a store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the data file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every record.
    ///
    /// A missing file yields an empty table and a `LoadNotice::MissingFile`;
    /// the file is created by the first persist. Dates that cannot be parsed
    /// are stored as missing and counted in a `LoadNotice::UnparsableDates`.
    /// A row with a malformed numeric cell is left out and reported as a
    /// `LoadNotice::SkippedRow`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` or `StoreError::Csv` if the file cannot be
    /// read, and `StoreError::DataCorruption` if the header lacks a column.
    pub fn load(&self) -> Result<Loaded<RecordTable>, StoreError> {
        let mut reader = match open_reader(&self.path) {
            Ok(reader) => reader,
            Err(StoreError::MissingFile { path }) => {
                tracing::warn!(path = %path.display(), "data file not found, starting with no records");
                return Ok(Loaded {
                    table: RecordTable::default(),
                    notices: vec![LoadNotice::MissingFile(path)],
                });
            }
            Err(e) => return Err(e),
        };

        let mut layout = None;
        let mut records = Vec::new();
        let mut coerced = 0;
        let mut notices = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| StoreError::csv(&self.path, e))?;
            let Some(current) = layout else {
                layout = Some(Layout::from_header(&self.path, &row)?);
                continue;
            };
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            let parsed = match parse_row(&self.path, current, &row) {
                Ok(parsed) => parsed,
                Err(StoreError::DataCorruption {
                    path,
                    line,
                    column,
                    message,
                }) => {
                    tracing::warn!(path = %path.display(), line, column = %column, %message, "skipped malformed row");
                    notices.push(LoadNotice::SkippedRow {
                        path,
                        line,
                        column,
                        message,
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };
            if parsed.date_coerced {
                coerced += 1;
            }
            records.push(parsed.record);
        }

        if coerced > 0 {
            tracing::warn!(path = %self.path.display(), count = coerced, "coerced unparsable dates to missing");
            notices.push(LoadNotice::UnparsableDates {
                path: self.path.clone(),
                count: coerced,
            });
        }

        tracing::info!(path = %self.path.display(), rows = records.len(), "loaded records");
        Ok(Loaded {
            table: RecordTable::from_records(records),
            notices,
        })
    }

    /// Overwrite the data file with `table`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` or `StoreError::Csv` if the file cannot be
    /// written. The previous file is left in place on failure.
    pub fn persist(&self, table: &RecordTable) -> Result<(), StoreError> {
        write_atomically(&self.path, |writer| write_rows(writer, table.records()))?;
        tracing::info!(path = %self.path.display(), rows = table.len(), "persisted records");
        Ok(())
    }
}
