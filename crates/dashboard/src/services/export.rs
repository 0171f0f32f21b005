//! CSV export of sales records.
//!
//! Exports use the same header and date format as the data file, so an
//! export can be loaded back as a data file.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use revtee_core::SalesRecord;

use crate::store::records::write_rows;

/// Errors that can occur while exporting.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Encoding the rows failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Writing the export file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Destination file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Encode `records` as CSV text with a header row.
///
/// # Errors
///
/// Returns `ExportError::Csv` if encoding fails.
pub fn to_csv<'a, I>(records: I) -> Result<String, ExportError>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_rows(&mut writer, records)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    // Cells are written from `String`s.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write `records` as CSV to `path`, returning the number of rows written.
///
/// # Errors
///
/// Returns `ExportError::Csv` if encoding fails and `ExportError::Io` if the
/// file cannot be written.
pub fn write_csv<'a, I>(path: &Path, records: I) -> Result<usize, ExportError>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let records: Vec<&SalesRecord> = records.into_iter().collect();
    let text = to_csv(records.iter().copied())?;
    fs::write(path, text).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(path = %path.display(), rows = records.len(), "exported records");
    Ok(records.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;

    fn tee() -> SalesRecord {
        SalesRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 1),
            product: "Tee, classic".to_string(),
            units_sold: 5,
            visitors: 20,
            conversions: 2,
            revenue: Decimal::new(5005, 1),
        }
    }

    #[test]
    fn test_to_csv() {
        let records = [tee()];
        let text = to_csv(&records).unwrap();
        assert_eq!(
            text,
            "Date,Produits_vendus,Ventes,Visiteurs,Conversions,Revenus\n\
             2024-01-01,\"Tee, classic\",5,20,2,500.5\n"
        );
    }

    #[test]
    fn test_to_csv_empty_has_header() {
        let text = to_csv(Vec::<&SalesRecord>::new()).unwrap();
        assert_eq!(text, "Date,Produits_vendus,Ventes,Visiteurs,Conversions,Revenus\n");
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let records = [tee(), tee()];

        let written = write_csv(&path, &records).unwrap();
        assert_eq!(written, 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), to_csv(&records).unwrap());
    }

    #[test]
    fn test_write_csv_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent").join("out.csv");
        let result = write_csv(&path, &[tee()]);
        assert!(matches!(result, Err(ExportError::Io { .. })));
    }
}
