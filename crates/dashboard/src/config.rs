//! Dashboard configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `REVTEE_USERS_FILE` - Users file (default: `users.csv`)
//! - `REVTEE_DATA_FILE` - Sales data file (default: `revtee_data.csv`)
//! - `REVTEE_EXPORT_DIR` - Directory for default export file names (default: `.`)
//! - `REVTEE_CURRENCY` - Revenue label shown with KPIs (default: `MAD`)
//! - `REVTEE_UNIT_LABEL` - Units label shown with KPIs (default: `T-shirts`)
//!
//! ## Logging
//! - `RUST_LOG` - Log filter (default: `revtee_dashboard=info,revtee_cli=info`)
//! - `REVTEE_LOG_JSON` - Emit JSON logs when set

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Environment variable naming the users file.
pub const USERS_FILE_VAR: &str = "REVTEE_USERS_FILE";
/// Environment variable naming the data file.
pub const DATA_FILE_VAR: &str = "REVTEE_DATA_FILE";
const EXPORT_DIR_VAR: &str = "REVTEE_EXPORT_DIR";
const CURRENCY_VAR: &str = "REVTEE_CURRENCY";
const UNIT_LABEL_VAR: &str = "REVTEE_UNIT_LABEL";

const DEFAULT_USERS_FILE: &str = "users.csv";
const DEFAULT_DATA_FILE: &str = "revtee_data.csv";
const DEFAULT_EXPORT_DIR: &str = ".";
const DEFAULT_CURRENCY: &str = "MAD";
const DEFAULT_UNIT_LABEL: &str = "T-shirts";

/// Default file name for an export of the filtered view.
pub const FILTERED_EXPORT_NAME: &str = "revtee_data_filtered.csv";
/// Default file name for an export of the whole table.
pub const FULL_EXPORT_NAME: &str = "revtee_data_complete.csv";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Dashboard configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Users file path
    pub users_file: PathBuf,
    /// Sales data file path
    pub data_file: PathBuf,
    /// Directory that default export names are resolved against
    pub export_dir: PathBuf,
    /// Currency label for revenue (e.g., "MAD")
    pub currency: String,
    /// Label for units sold (e.g., "T-shirts")
    pub unit_label: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            users_file: PathBuf::from(DEFAULT_USERS_FILE),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
            currency: DEFAULT_CURRENCY.to_string(),
            unit_label: DEFAULT_UNIT_LABEL.to_string(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a path is empty or both
    /// storage files point at the same path.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process
    /// environment.
    ///
    /// # Errors
    ///
    /// See [`DashboardConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get_or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            users_file: PathBuf::from(get_or_default(USERS_FILE_VAR, DEFAULT_USERS_FILE)),
            data_file: PathBuf::from(get_or_default(DATA_FILE_VAR, DEFAULT_DATA_FILE)),
            export_dir: PathBuf::from(get_or_default(EXPORT_DIR_VAR, DEFAULT_EXPORT_DIR)),
            currency: get_or_default(CURRENCY_VAR, DEFAULT_CURRENCY),
            unit_label: get_or_default(UNIT_LABEL_VAR, DEFAULT_UNIT_LABEL),
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the storage paths given on the command line.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the result fails validation.
    pub fn with_overrides(
        mut self,
        users_file: Option<PathBuf>,
        data_file: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = users_file {
            self.users_file = path;
        }
        if let Some(path) = data_file {
            self.data_file = path;
        }
        self.validate()?;
        Ok(self)
    }

    /// Where an export goes when no path is given.
    #[must_use]
    pub fn default_export_path(&self, name: &str) -> PathBuf {
        self.export_dir.join(name)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_path(USERS_FILE_VAR, &self.users_file)?;
        check_path(DATA_FILE_VAR, &self.data_file)?;
        check_path(EXPORT_DIR_VAR, &self.export_dir)?;
        if self.users_file == self.data_file {
            return Err(ConfigError::InvalidEnvVar(
                DATA_FILE_VAR.to_string(),
                format!(
                    "must differ from {USERS_FILE_VAR} ({})",
                    self.users_file.display()
                ),
            ));
        }
        Ok(())
    }
}

fn check_path(key: &str, path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "path cannot be empty".to_string(),
        ));
    }
    Ok(())
}
