//! Credential store: the users file and its in-memory table.

use std::path::{Path, PathBuf};

use revtee_core::{PasswordDigest, UserAccount, UserRole, Username};

use super::{LoadNotice, Loaded, StoreError, ValidationError, open_reader, write_atomically};

/// Header row written to the users file.
pub const HEADER: [&str; 3] = ["username", "password", "role"];

// =============================================================================
// User Table
// =============================================================================

/// Ordered list of accounts. Lookups return the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserTable {
    accounts: Vec<UserAccount>,
}

impl UserTable {
    /// The table created when no users file exists: only `admin` / `admin`.
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            accounts: vec![UserAccount::default_admin()],
        }
    }

    /// Build a table from accounts, kept in the given order.
    #[must_use]
    pub const fn from_accounts(accounts: Vec<UserAccount>) -> Self {
        Self { accounts }
    }

    /// All accounts in file order.
    #[must_use]
    pub fn accounts(&self) -> &[UserAccount] {
        &self.accounts
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the table has no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// First account named `username`.
    #[must_use]
    pub fn get(&self, username: &str) -> Option<&UserAccount> {
        self.accounts.iter().find(|a| a.username == username)
    }

    /// Usernames held by more than one account, in first-seen order.
    #[must_use]
    pub fn duplicate_usernames(&self) -> Vec<&str> {
        let mut duplicates: Vec<&str> = Vec::new();
        for (i, account) in self.accounts.iter().enumerate() {
            let name = account.username.as_str();
            let repeated = self
                .accounts
                .iter()
                .skip(i + 1)
                .any(|other| other.username == name);
            if repeated && !duplicates.contains(&name) {
                duplicates.push(name);
            }
        }
        duplicates
    }

    /// Whether any account is named `username`.
    #[must_use]
    pub fn contains(&self, username: &str) -> bool {
        self.get(username).is_some()
    }

    /// Whether some account is named `username` and stores the digest of
    /// `password`. Both comparisons are exact.
    #[must_use]
    pub fn find(&self, username: &str, password: &str) -> bool {
        let digest = PasswordDigest::of(password);
        self.accounts
            .iter()
            .any(|a| a.username == username && a.password_hash == digest)
    }

    /// Append a new account.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyField` if the username or password is
    /// empty, and `ValidationError::UsernameTaken` if the username exists.
    pub fn add(
        &mut self,
        username: &str,
        password: &str,
        role: UserRole,
    ) -> Result<(), ValidationError> {
        let username = parse_username(username)?;
        if password.is_empty() {
            return Err(ValidationError::EmptyField("password"));
        }
        if self.contains(username.as_str()) {
            return Err(ValidationError::UsernameTaken(username.into_inner()));
        }

        self.accounts
            .push(UserAccount::new(username, password, role));
        Ok(())
    }

    /// Rename every account named `old_username` and give each the new
    /// password. Roles are kept.
    ///
    /// Older users files may hold the same name twice; all of those rows are
    /// updated so that the old password stops working. Renaming to the same
    /// name only changes the password.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyField` if the new username or password
    /// is empty, `ValidationError::UnknownUser` if `old_username` does not
    /// exist, and `ValidationError::UsernameTaken` if `new_username` belongs
    /// to another account.
    pub fn rename_and_rehash(
        &mut self,
        old_username: &str,
        new_username: &str,
        new_password: &str,
    ) -> Result<&UserAccount, ValidationError> {
        let new_username = parse_username(new_username)?;
        if new_password.is_empty() {
            return Err(ValidationError::EmptyField("password"));
        }
        if new_username != old_username && self.contains(new_username.as_str()) {
            return Err(ValidationError::UsernameTaken(new_username.into_inner()));
        }

        if !self.contains(old_username) {
            return Err(ValidationError::UnknownUser(old_username.to_owned()));
        }

        let password_hash = PasswordDigest::of(new_password);
        for account in self
            .accounts
            .iter_mut()
            .filter(|a| a.username == old_username)
        {
            account.username = new_username.clone();
            account.password_hash = password_hash.clone();
        }
        self.get(new_username.as_str())
            .ok_or_else(|| ValidationError::UnknownUser(new_username.into_inner()))
    }
}

fn parse_username(username: &str) -> Result<Username, ValidationError> {
    Username::parse(username).map_err(|_| ValidationError::EmptyField("username"))
}

// =============================================================================
// Internal Row Type
// =============================================================================

/// Column positions of a users file.
#[derive(Debug, Clone, Copy)]
struct Layout {
    username: usize,
    password: usize,
    role: Option<usize>,
}

impl Layout {
    /// Positional layout for files without a header row.
    const POSITIONAL: Self = Self {
        username: 0,
        password: 1,
        role: Some(2),
    };

    /// Read the layout from a header row, if the row is one.
    fn from_header(row: &csv::StringRecord) -> Option<Self> {
        let position = |name: &str| row.iter().position(|cell| cell.trim() == name);
        Some(Self {
            username: position(HEADER[0])?,
            password: position(HEADER[1])?,
            role: position(HEADER[2]),
        })
    }
}

/// One data row of a users file.
struct UserRow<'a> {
    line: u64,
    username: &'a str,
    password: &'a str,
    role: Option<&'a str>,
}

impl UserRow<'_> {
    fn into_account(self, path: &Path) -> Result<UserAccount, StoreError> {
        let corrupt = |column: &str, message: String| StoreError::DataCorruption {
            path: path.to_path_buf(),
            line: self.line,
            column: column.to_owned(),
            message,
        };

        let username =
            Username::parse(self.username).map_err(|e| corrupt(HEADER[0], e.to_string()))?;
        let password_hash = PasswordDigest::parse(self.password.trim())
            .map_err(|e| corrupt(HEADER[1], e.to_string()))?;
        let role = match self.role.map(str::trim).filter(|r| !r.is_empty()) {
            Some(role) => role
                .parse::<UserRole>()
                .map_err(|e| corrupt(HEADER[2], e.to_string()))?,
            None => UserRole::legacy_for(&username),
        };

        Ok(UserAccount {
            username,
            password_hash,
            role,
        })
    }
}

// =============================================================================
// Store
// =============================================================================

/// Reads and writes the users file.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Create a store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the users file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every account.
    ///
    /// If the file does not exist, the seeded table is written to it and
    /// returned. A file without a role column is accepted; `admin` becomes
    /// an admin and every other account a viewer.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` or `StoreError::Csv` if the file cannot be
    /// read, and `StoreError::DataCorruption` if a row is malformed.
    pub fn load(&self) -> Result<Loaded<UserTable>, StoreError> {
        let mut reader = match open_reader(&self.path) {
            Ok(reader) => reader,
            Err(StoreError::MissingFile { .. }) => return self.seed(),
            Err(e) => return Err(e),
        };

        let mut layout = None;
        let mut accounts = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| StoreError::csv(&self.path, e))?;
            let current = if let Some(current) = layout {
                current
            } else {
                let detected = Layout::from_header(&row);
                layout = Some(detected.unwrap_or(Layout::POSITIONAL));
                if detected.is_some() {
                    continue;
                }
                Layout::POSITIONAL
            };
            if row.iter().all(str::is_empty) {
                continue;
            }

            let user_row = UserRow {
                line: row.position().map_or(0, csv::Position::line),
                username: row.get(current.username).unwrap_or_default(),
                password: row.get(current.password).unwrap_or_default(),
                role: current.role.and_then(|i| row.get(i)),
            };
            accounts.push(user_row.into_account(&self.path)?);
        }

        let mut notices = Vec::new();
        if layout.is_some_and(|l| l.role.is_none()) {
            tracing::warn!(path = %self.path.display(), "users file has no role column, inferring roles");
            notices.push(LoadNotice::LegacyRoles(self.path.clone()));
        }
        if accounts.is_empty() {
            tracing::warn!(path = %self.path.display(), "users file holds no accounts");
            notices.push(LoadNotice::NoUsers(self.path.clone()));
        }
        let table = UserTable::from_accounts(accounts);
        let duplicates = table.duplicate_usernames();
        if !duplicates.is_empty() {
            tracing::warn!(path = %self.path.display(), usernames = ?duplicates, "users file repeats usernames");
        }

        tracing::info!(path = %self.path.display(), users = table.len(), "loaded users");
        Ok(Loaded { table, notices })
    }

    fn seed(&self) -> Result<Loaded<UserTable>, StoreError> {
        tracing::warn!(path = %self.path.display(), "users file not found, seeding default admin");
        let table = UserTable::seeded();
        self.persist(&table)?;
        Ok(Loaded {
            table,
            notices: vec![LoadNotice::MissingFile(self.path.clone())],
        })
    }

    /// Overwrite the users file with `table`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` or `StoreError::Csv` if the file cannot be
    /// written. The previous file is left in place on failure.
    pub fn persist(&self, table: &UserTable) -> Result<(), StoreError> {
        write_atomically(&self.path, |writer| {
            writer.write_record(HEADER)?;
            for account in table.accounts() {
                let role = account.role.to_string();
                writer.write_record([
                    account.username.as_str(),
                    account.password_hash.as_str(),
                    role.as_str(),
                ])?;
            }
            Ok(())
        })?;

        tracing::info!(path = %self.path.display(), users = table.len(), "persisted users");
        Ok(())
    }
}
