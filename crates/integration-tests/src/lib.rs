//! Integration tests for the Rev-Tee dashboard.
//!
//! Every test works on its own temporary directory holding a users file and
//! a data file, so tests can run in parallel.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p revtee-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `properties` - Hashing, authentication, filtering and aggregation laws
//! - `dashboard_flow` - Login, filters, mutations and exports through `Dashboard`
//! - `console_session` - Scripted sessions through the console loop
//! - `storage_files` - Legacy, malformed and hand-edited files on disk

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::TempDir;

use revtee_core::SalesRecord;
use revtee_dashboard::services::LoginForm;
use revtee_dashboard::{Dashboard, DashboardConfig};

/// Header of the data file.
pub const DATA_HEADER: &str = "Date,Produits_vendus,Ventes,Visiteurs,Conversions,Revenus";

/// A temporary directory with dashboard files in it.
pub struct TestFiles {
    dir: TempDir,
    /// Configuration pointing into the directory.
    pub config: DashboardConfig,
}

impl TestFiles {
    /// Empty directory; both files are missing.
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = DashboardConfig {
            users_file: dir.path().join("users.csv"),
            data_file: dir.path().join("revtee_data.csv"),
            export_dir: dir.path().to_path_buf(),
            ..DashboardConfig::default()
        };
        Self { dir, config }
    }

    /// Path of `name` inside the directory.
    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Replace the users file.
    pub fn write_users(&self, contents: &str) {
        fs::write(&self.config.users_file, contents).expect("Failed to write users file");
    }

    /// Replace the data file.
    pub fn write_data(&self, contents: &str) {
        fs::write(&self.config.data_file, contents).expect("Failed to write data file");
    }

    /// Current users file contents.
    #[must_use]
    pub fn read_users(&self) -> String {
        fs::read_to_string(&self.config.users_file).expect("Failed to read users file")
    }

    /// Current data file contents.
    #[must_use]
    pub fn read_data(&self) -> String {
        fs::read_to_string(&self.config.data_file).expect("Failed to read data file")
    }

    /// Open a dashboard on the files, logged out.
    #[must_use]
    pub fn open(&self) -> Dashboard {
        Dashboard::open(self.config.clone()).expect("Failed to open dashboard")
    }

    /// Open a dashboard and log in as `username`.
    #[must_use]
    pub fn open_as(&self, username: &str, password: &str) -> Dashboard {
        let mut dashboard = self.open();
        dashboard
            .login(&LoginForm::new(username, password))
            .expect("Failed to log in");
        dashboard
    }

    /// Open a dashboard logged in as the seeded admin.
    #[must_use]
    pub fn open_admin(&self) -> Dashboard {
        self.open_as("admin", "admin")
    }
}

impl Default for TestFiles {
    fn default() -> Self {
        Self::new()
    }
}

/// A day in January 2024.
#[must_use]
pub fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).expect("valid January day")
}

/// A dated record.
#[must_use]
pub fn record(
    day: u32,
    product: &str,
    units_sold: u64,
    visitors: u64,
    conversions: u64,
    revenue: i64,
) -> SalesRecord {
    SalesRecord {
        date: Some(jan(day)),
        product: product.to_string(),
        units_sold,
        visitors,
        conversions,
        revenue: Decimal::from(revenue),
    }
}
