//! Dashboard state and the operations the presentation layer calls.
//!
//! A [`Dashboard`] owns both tables, the session and the current filter.
//! Every operation except [`Dashboard::login`] needs a logged-in user;
//! mutations and the user list also need the admin role. Mutations are
//! persisted before they return, and rolled back in memory if the write
//! fails.

use std::path::PathBuf;

use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};

use revtee_core::{
    DateRange, KpiSet, ProductSelection, SalesRecord, UserAccount, UserRole, Username,
};

use crate::config::{DashboardConfig, FILTERED_EXPORT_NAME, FULL_EXPORT_NAME};
use crate::error::AppError;
use crate::services::analytics::{self, AnalyticsError, ChartData};
use crate::services::auth::{AuthError, Authenticator, LoginForm};
use crate::services::export;
use crate::session::{CurrentUser, Session};
use crate::store::{CredentialStore, LoadNotice, RecordStore, RecordTable, UserTable};

/// Outcome of an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// File written.
    pub path: PathBuf,
    /// Number of data rows.
    pub rows: usize,
}

/// One running dashboard session.
#[derive(Debug)]
pub struct Dashboard {
    config: DashboardConfig,
    credential_store: CredentialStore,
    record_store: RecordStore,
    users: UserTable,
    records: RecordTable,
    session: Session,
    /// Range picked by the user; `None` follows the span of the data.
    range: Option<DateRange>,
    selection: ProductSelection,
    notices: Vec<LoadNotice>,
}

impl Dashboard {
    /// Load both files named in `config` and start logged out.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if a file exists but cannot be read or is
    /// malformed. Missing files are not errors; see [`Dashboard::notices`].
    pub fn open(config: DashboardConfig) -> Result<Self, AppError> {
        let credential_store = CredentialStore::new(&config.users_file);
        let record_store = RecordStore::new(&config.data_file);

        let users = credential_store.load()?;
        let records = record_store.load()?;
        let mut notices = users.notices;
        notices.extend(records.notices);

        Ok(Self {
            config,
            credential_store,
            record_store,
            users: users.table,
            records: records.table,
            session: Session::default(),
            range: None,
            selection: ProductSelection::All,
            notices,
        })
    }

    /// Configuration the dashboard was opened with.
    #[must_use]
    pub const fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Findings from loading the files.
    #[must_use]
    pub fn notices(&self) -> &[LoadNotice] {
        &self.notices
    }

    /// Current login state.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Log in.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` if the credentials are wrong or someone is
    /// already logged in.
    pub fn login(&mut self, form: &LoginForm) -> Result<&CurrentUser, AppError> {
        if let Some(current) = self.session.current() {
            return Err(AuthError::AlreadyLoggedIn(current.username.to_string()).into());
        }
        let user = Authenticator::new(&self.users).login(form)?;
        Ok(self.session.begin(user)?)
    }

    /// Log out, returning who was logged in. The date range and product
    /// selection go back to their defaults for the next user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` if nobody is logged in.
    pub fn logout(&mut self) -> Result<CurrentUser, AppError> {
        let user = self.session.end()?;
        self.range = None;
        self.selection = ProductSelection::All;
        tracing::info!(username = %user.username, "user logged out");
        Ok(user)
    }

    fn require_user(&self) -> Result<&CurrentUser, AppError> {
        self.session
            .current()
            .ok_or_else(|| AppError::Unauthorized("log in first".to_string()))
    }

    fn require_admin(&self) -> Result<&CurrentUser, AppError> {
        let user = self.require_user()?;
        if !Authenticator::new(&self.users).is_admin(user.username.as_str()) {
            tracing::warn!(username = %user.username, "admin action refused");
            return Err(AppError::Forbidden("admin role required".to_string()));
        }
        Ok(user)
    }

    // =========================================================================
    // Filters
    // =========================================================================

    /// The date range in effect.
    ///
    /// Until a range is set, this spans the earliest to the latest valid
    /// date in the data.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` when logged out and
    /// `AppError::Analytics` if no range was set and no record has a date.
    pub fn date_range(&self) -> Result<DateRange, AppError> {
        self.require_user()?;
        Ok(self.active_range()?)
    }

    fn active_range(&self) -> Result<DateRange, AnalyticsError> {
        match self.range {
            Some(range) => Ok(range),
            None => DateRange::spanning(self.records.records()).ok_or(AnalyticsError::NoValidDates),
        }
    }

    /// Restrict views to `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidDateRange` if `start` is after `end`.
    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) -> Result<DateRange, AppError> {
        self.require_user()?;
        let range = DateRange::between(start, end)?;
        self.range = Some(range);
        tracing::debug!(%range, "date range set");
        Ok(range)
    }

    /// Go back to the range spanning the data.
    ///
    /// # Errors
    ///
    /// See [`Dashboard::date_range`].
    pub fn reset_date_range(&mut self) -> Result<DateRange, AppError> {
        self.require_user()?;
        self.range = None;
        Ok(self.active_range()?)
    }

    /// Current product selection.
    #[must_use]
    pub const fn selection(&self) -> &ProductSelection {
        &self.selection
    }

    /// Replace the product selection. Picking `All` overrides other names.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` when logged out.
    pub fn select_products<I, S>(&mut self, names: I) -> Result<&ProductSelection, AppError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require_user()?;
        self.selection = ProductSelection::from_names(names);
        tracing::debug!(selection = %self.selection, "products selected");
        Ok(&self.selection)
    }

    /// Product names available to select, in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` when logged out.
    pub fn product_options(&self) -> Result<Vec<String>, AppError> {
        self.require_user()?;
        Ok(self.records.products())
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Records passing the current range and selection.
    ///
    /// # Errors
    ///
    /// See [`Dashboard::date_range`].
    pub fn filtered_records(&self) -> Result<Vec<&SalesRecord>, AppError> {
        self.require_user()?;
        let range = self.active_range()?;
        Ok(analytics::filter(
            self.records.records(),
            &range,
            &self.selection,
        ))
    }

    /// KPIs for the current filter.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Analytics` with `EmptySelection` when no product is
    /// selected, and see [`Dashboard::date_range`].
    pub fn kpis(&self) -> Result<Vec<KpiSet>, AppError> {
        let subset = self.filtered_records()?;
        Ok(analytics::kpis(&subset, &self.selection)?)
    }

    /// Chart series for the current filter.
    ///
    /// # Errors
    ///
    /// See [`Dashboard::kpis`].
    pub fn charts(&self) -> Result<ChartData, AppError> {
        self.require_user()?;
        if self.selection.is_empty() {
            return Err(AnalyticsError::EmptySelection.into());
        }
        let subset = self.filtered_records()?;
        Ok(analytics::charts(&subset)?)
    }

    /// Every record, unfiltered.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` when logged out.
    pub fn records(&self) -> Result<&[SalesRecord], AppError> {
        self.require_user()?;
        Ok(self.records.records())
    }

    /// Every account.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` when logged out and
    /// `AppError::Forbidden` for non-admins.
    pub fn users(&self) -> Result<&[UserAccount], AppError> {
        self.require_admin()?;
        Ok(self.users.accounts())
    }

    // =========================================================================
    // Admin Actions
    // =========================================================================

    /// Append a sales record and persist the data file.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for non-admins, `AppError::Validation`
    /// for a blank product, and `AppError::Store` if the file cannot be
    /// written, in which case the record is dropped again.
    pub fn add_record(&mut self, record: SalesRecord) -> Result<(), AppError> {
        let actor = self.require_admin()?.username.clone();
        let product = record.product.clone();
        self.records.append(record)?;

        if let Err(e) = self.record_store.persist(&self.records) {
            self.records.pop();
            return Err(e.into());
        }
        tracing::info!(username = %actor, %product, "record added");
        Ok(())
    }

    /// Create an account and persist the users file.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for non-admins, `AppError::Validation`
    /// for empty fields or a taken username, and `AppError::Store` if the
    /// file cannot be written, in which case the account is dropped again.
    pub fn add_user(
        &mut self,
        username: &str,
        password: &SecretString,
        role: UserRole,
    ) -> Result<(), AppError> {
        let actor = self.require_admin()?.username.clone();
        let mut users = self.users.clone();
        users.add(username, password.expose_secret(), role)?;
        self.credential_store.persist(&users)?;
        self.users = users;

        tracing::info!(username = %actor, new_user = %username, %role, "user added");
        Ok(())
    }

    /// Rename an account, set its password and persist the users file.
    ///
    /// Renaming the logged-in account keeps the session on it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for non-admins, `AppError::Validation`
    /// for empty fields, an unknown account or a taken username, and
    /// `AppError::Store` if the file cannot be written, in which case
    /// nothing changes.
    pub fn edit_user(
        &mut self,
        old_username: &str,
        new_username: &str,
        new_password: &SecretString,
    ) -> Result<(), AppError> {
        let actor = self.require_admin()?.username.clone();
        let mut users = self.users.clone();
        let renamed: Username = users
            .rename_and_rehash(old_username, new_username, new_password.expose_secret())?
            .username
            .clone();
        self.credential_store.persist(&users)?;
        self.users = users;
        self.session.follow_rename(old_username, &renamed);

        tracing::info!(username = %actor, old = %old_username, new = %renamed, "user updated");
        Ok(())
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Write the filtered records as CSV, by default to
    /// `revtee_data_filtered.csv` in the export directory.
    ///
    /// # Errors
    ///
    /// See [`Dashboard::filtered_records`]; also `AppError::Export` if the
    /// file cannot be written.
    pub fn export_filtered(&self, path: Option<PathBuf>) -> Result<ExportSummary, AppError> {
        let subset = self.filtered_records()?;
        let path = path.unwrap_or_else(|| self.config.default_export_path(FILTERED_EXPORT_NAME));
        let rows = export::write_csv(&path, subset)?;
        Ok(ExportSummary { path, rows })
    }

    /// Write every record as CSV, by default to `revtee_data_complete.csv`
    /// in the export directory.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` when logged out and
    /// `AppError::Export` if the file cannot be written.
    pub fn export_full(&self, path: Option<PathBuf>) -> Result<ExportSummary, AppError> {
        let records = self.records()?;
        let path = path.unwrap_or_else(|| self.config.default_export_path(FULL_EXPORT_NAME));
        let rows = export::write_csv(&path, records)?;
        Ok(ExportSummary { path, rows })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use rust_decimal::Decimal;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn open(dir: &tempfile::TempDir) -> Dashboard {
        let config = DashboardConfig {
            users_file: dir.path().join("users.csv"),
            data_file: dir.path().join("revtee_data.csv"),
            export_dir: dir.path().to_path_buf(),
            ..DashboardConfig::default()
        };
        Dashboard::open(config).unwrap()
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn tee(day: u32) -> SalesRecord {
        SalesRecord {
            date: Some(date(2024, 1, day)),
            product: "Tee".to_string(),
            units_sold: 5,
            visitors: 20,
            conversions: 2,
            revenue: Decimal::from(500),
        }
    }

    fn admin_dashboard(dir: &tempfile::TempDir) -> Dashboard {
        let mut dashboard = open(dir);
        dashboard.login(&LoginForm::new("admin", "admin")).unwrap();
        dashboard
    }

    #[test]
    fn test_open_fresh_directory() {
        let dir = tempfile::tempdir().unwrap();
        let dashboard = open(&dir);
        assert_eq!(dashboard.notices().len(), 2);
        assert!(!dashboard.session().is_logged_in());
        assert!(dir.path().join("users.csv").exists());
    }

    #[test]
    fn test_views_require_login() {
        let dir = tempfile::tempdir().unwrap();
        let dashboard = open(&dir);
        assert!(matches!(dashboard.kpis(), Err(AppError::Unauthorized(_))));
        assert!(matches!(dashboard.records(), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_charts_require_login_before_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut dashboard = admin_dashboard(&dir);
        dashboard.select_products(Vec::<String>::new()).unwrap();
        dashboard.logout().unwrap();

        assert!(matches!(dashboard.charts(), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_logout_resets_filters() {
        let dir = tempfile::tempdir().unwrap();
        let mut dashboard = admin_dashboard(&dir);
        dashboard.add_record(tee(1)).unwrap();
        dashboard.add_record(tee(9)).unwrap();
        dashboard.set_date_range(date(2024, 1, 1), date(2024, 1, 2)).unwrap();
        dashboard.select_products(["Hoodie"]).unwrap();
        dashboard.logout().unwrap();

        dashboard.login(&LoginForm::new("admin", "admin")).unwrap();
        assert_eq!(dashboard.selection(), &ProductSelection::All);
        assert_eq!(dashboard.date_range().unwrap().end(), Some(date(2024, 1, 9)));
        assert_eq!(dashboard.filtered_records().unwrap().len(), 2);
    }

    #[test]
    fn test_login_failure_keeps_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let mut dashboard = open(&dir);
        let err = dashboard.login(&LoginForm::new("admin", "nope")).unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::InvalidCredentials)));
        assert!(!dashboard.session().is_logged_in());
    }

    #[test]
    fn test_no_valid_dates() {
        let dir = tempfile::tempdir().unwrap();
        let dashboard = admin_dashboard(&dir);
        assert!(matches!(
            dashboard.kpis(),
            Err(AppError::Analytics(AnalyticsError::NoValidDates))
        ));
    }

    #[test]
    fn test_add_record_and_kpis() {
        let dir = tempfile::tempdir().unwrap();
        let mut dashboard = admin_dashboard(&dir);
        dashboard.add_record(tee(1)).unwrap();

        let kpis = dashboard.kpis().unwrap();
        assert_eq!(kpis.len(), 1);
        assert_eq!(kpis[0].conversion_rate, Decimal::from(10));

        let reopened = open(&dir);
        assert_eq!(reopened.records.records(), &[tee(1)]);
    }

    #[test]
    fn test_default_range_follows_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut dashboard = admin_dashboard(&dir);
        dashboard.add_record(tee(5)).unwrap();
        dashboard.add_record(tee(9)).unwrap();

        let range = dashboard.date_range().unwrap();
        assert_eq!(range.start(), Some(date(2024, 1, 5)));
        assert_eq!(range.end(), Some(date(2024, 1, 9)));

        dashboard.set_date_range(date(2024, 1, 1), date(2024, 1, 6)).unwrap();
        assert_eq!(dashboard.filtered_records().unwrap().len(), 1);

        dashboard.reset_date_range().unwrap();
        assert_eq!(dashboard.filtered_records().unwrap().len(), 2);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut dashboard = admin_dashboard(&dir);
        let err = dashboard
            .set_date_range(date(2024, 2, 1), date(2024, 1, 1))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidDateRange(_)));
    }

    #[test]
    fn test_empty_selection_warns() {
        let dir = tempfile::tempdir().unwrap();
        let mut dashboard = admin_dashboard(&dir);
        dashboard.add_record(tee(1)).unwrap();
        dashboard.select_products(Vec::<String>::new()).unwrap();

        assert!(matches!(
            dashboard.kpis(),
            Err(AppError::Analytics(AnalyticsError::EmptySelection))
        ));
        assert!(matches!(
            dashboard.charts(),
            Err(AppError::Analytics(AnalyticsError::EmptySelection))
        ));
    }

    #[test]
    fn test_viewer_cannot_mutate() {
        let dir = tempfile::tempdir().unwrap();
        let mut dashboard = admin_dashboard(&dir);
        dashboard
            .add_user("guest", &secret("pw"), UserRole::Viewer)
            .unwrap();
        dashboard.logout().unwrap();
        dashboard.login(&LoginForm::new("guest", "pw")).unwrap();

        assert!(matches!(dashboard.add_record(tee(1)), Err(AppError::Forbidden(_))));
        assert!(matches!(dashboard.users(), Err(AppError::Forbidden(_))));
        assert!(dashboard.records().is_ok());
    }

    #[test]
    fn test_add_user_rejects_duplicate_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let mut dashboard = admin_dashboard(&dir);
        let before = fs::read(dir.path().join("users.csv")).unwrap();

        let err = dashboard
            .add_user("admin", &secret("pw"), UserRole::Viewer)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(fs::read(dir.path().join("users.csv")).unwrap(), before);
    }

    #[test]
    fn test_edit_self_follows_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut dashboard = admin_dashboard(&dir);
        dashboard.edit_user("admin", "root", &secret("x")).unwrap();

        assert_eq!(
            dashboard.session().current().unwrap().username.as_str(),
            "root"
        );
        assert!(dashboard.users().is_ok());

        dashboard.logout().unwrap();
        assert!(dashboard.login(&LoginForm::new("admin", "admin")).is_err());
        assert!(dashboard.login(&LoginForm::new("root", "x")).is_ok());
    }

    #[test]
    fn test_exports() {
        let dir = tempfile::tempdir().unwrap();
        let mut dashboard = admin_dashboard(&dir);
        dashboard.add_record(tee(1)).unwrap();
        dashboard.add_record(tee(20)).unwrap();
        dashboard.set_date_range(date(2024, 1, 1), date(2024, 1, 10)).unwrap();

        let filtered = dashboard.export_filtered(None).unwrap();
        assert_eq!(filtered.path, dir.path().join("revtee_data_filtered.csv"));
        assert_eq!(filtered.rows, 1);

        let full = dashboard.export_full(None).unwrap();
        assert_eq!(full.path, dir.path().join("revtee_data_complete.csv"));
        assert_eq!(full.rows, 2);
    }
}
