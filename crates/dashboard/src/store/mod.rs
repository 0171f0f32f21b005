//! Flat-file storage for the dashboard.
//!
//! # Files
//!
//! - users file (`REVTEE_USERS_FILE`) - `username,password,role`
//! - data file (`REVTEE_DATA_FILE`) - `Date,Produits_vendus,Ventes,Visiteurs,Conversions,Revenus`
//!
//! Both files are loaded wholesale at start-up and rewritten wholesale after
//! every mutation. Writes go to a sibling `.tmp` file that is then renamed
//! over the target. There is no locking: two sessions writing the same file
//! race, and the last writer wins.

pub mod credentials;
pub mod records;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use credentials::{CredentialStore, UserTable};
pub use records::{RecordStore, RecordTable};

/// Errors that can occur while reading or writing a backing file.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file does not exist.
    #[error("file not found: {}", path.display())]
    MissingFile {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// Filesystem error.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid CSV.
    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: csv::Error,
    },

    /// A row holds a value that cannot be stored in its column.
    #[error("data corruption in {} at line {line}, column {column}: {message}", path.display())]
    DataCorruption {
        /// File being read.
        path: PathBuf,
        /// 1-based line number in the file.
        line: u64,
        /// Column header.
        column: String,
        /// What was wrong with the value.
        message: String,
    },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A rejected mutation of an in-memory table.
///
/// Nothing is changed or persisted when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is empty.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// Another account already uses the username.
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    /// No account has the username.
    #[error("no user named '{0}'")]
    UnknownUser(String),

    /// A value could not be parsed.
    #[error("invalid {field}: {message}")]
    InvalidValue {
        /// Field being parsed.
        field: &'static str,
        /// What was wrong with the value.
        message: String,
    },
}

/// Something worth telling the operator about a load that still succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadNotice {
    /// The file was absent; the table was seeded or started empty.
    MissingFile(PathBuf),
    /// The credential file had no role column; roles were inferred.
    LegacyRoles(PathBuf),
    /// The credential file exists but holds no account, so nobody can log in.
    NoUsers(PathBuf),
    /// Some date cells could not be parsed and were left empty.
    UnparsableDates {
        /// File being read.
        path: PathBuf,
        /// How many cells were coerced.
        count: usize,
    },
    /// A data row held a malformed value and was left out of the table.
    SkippedRow {
        /// File being read.
        path: PathBuf,
        /// 1-based line number in the file.
        line: u64,
        /// Column header of the bad cell.
        column: String,
        /// What was wrong with the value.
        message: String,
    },
}

impl std::fmt::Display for LoadNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFile(path) => write!(f, "{} was not found, starting fresh", path.display()),
            Self::LegacyRoles(path) => write!(
                f,
                "{} has no role column, roles were inferred",
                path.display()
            ),
            Self::NoUsers(path) => write!(
                f,
                "{} holds no users, nobody can log in until one is added with revtee-cli",
                path.display()
            ),
            Self::UnparsableDates { path, count } => write!(
                f,
                "{count} date(s) in {} could not be read and are excluded from date filters",
                path.display()
            ),
            Self::SkippedRow {
                path,
                line,
                column,
                message,
            } => write!(
                f,
                "line {line} of {} was skipped ({column}: {message}) and will be dropped by the next save",
                path.display()
            ),
        }
    }
}

/// A table together with the notices raised while loading it.
#[derive(Debug)]
pub struct Loaded<T> {
    /// The loaded table.
    pub table: T,
    /// Non-fatal findings, in the order they were raised.
    pub notices: Vec<LoadNotice>,
}

/// Path of the scratch file written before renaming over `path`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `path` with the rows produced by `write`.
///
/// The rows go to a temporary sibling first, which is renamed over `path`
/// once it is complete. Missing parent directories are created.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut csv::Writer<BufWriter<File>>) -> Result<(), csv::Error>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let scratch = temp_path(path);
    let result = write_scratch(&scratch, write);
    if let Err(e) = result {
        // Best effort.
        let _ = fs::remove_file(&scratch);
        return Err(e);
    }

    fs::rename(&scratch, path).map_err(|e| StoreError::io(path, e))
}

fn write_scratch<F>(scratch: &Path, write: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut csv::Writer<BufWriter<File>>) -> Result<(), csv::Error>,
{
    let file = File::create(scratch).map_err(|e| StoreError::io(scratch, e))?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));
    write(&mut writer).map_err(|e| StoreError::csv(scratch, e))?;

    let mut buffered = writer
        .into_inner()
        .map_err(|e| StoreError::io(scratch, e.into_error()))?;
    buffered.flush().map_err(|e| StoreError::io(scratch, e))?;
    buffered
        .get_ref()
        .sync_all()
        .map_err(|e| StoreError::io(scratch, e))
}

/// Open `path` for CSV reading without treating the first row as a header.
///
/// Header handling is left to the caller so that header-less files can be
/// detected and rows keep their line numbers.
pub(crate) fn open_reader(path: &Path) -> Result<csv::Reader<File>, StoreError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StoreError::MissingFile {
                path: path.to_path_buf(),
            }
        } else {
            StoreError::io(path, e)
        }
    })?;

    Ok(csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file))
}
