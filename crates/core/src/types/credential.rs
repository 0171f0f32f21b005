//! Credential types: usernames, password digests and roles.

use core::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Username of the account seeded when no credential file exists.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Errors that can occur when building credential types.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The username is empty.
    #[error("username cannot be empty")]
    EmptyUsername,
    /// The password is empty.
    #[error("password cannot be empty")]
    EmptyPassword,
    /// A stored digest is not a SHA-256 hex string.
    #[error("password digest must be {expected} hex characters")]
    MalformedDigest {
        /// Expected digest length.
        expected: usize,
    },
    /// The role name is not recognised.
    #[error("invalid role: {0}. Valid roles: admin, viewer")]
    InvalidRole(String),
}

/// An account name.
///
/// Usernames are compared exactly: `"Admin"` and `"admin"` are different
/// accounts. The only constraint is that the name is not empty.
///
/// ## Examples
///
/// ```
/// use revtee_core::Username;
///
/// assert!(Username::parse("admin").is_ok());
/// assert!(Username::parse("").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Parse a `Username` from a string.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::EmptyUsername` if the input is empty.
    pub fn parse(s: &str) -> Result<Self, CredentialError> {
        if s.is_empty() {
            return Err(CredentialError::EmptyUsername);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Username` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Username {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Username {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Username {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// One-way digest of a password: lowercase hex SHA-256.
///
/// Digests are deterministic and unsalted so that credential files written by
/// earlier versions of the dashboard keep working.
///
/// ```
/// use revtee_core::PasswordDigest;
///
/// let digest = PasswordDigest::of("admin");
/// assert_eq!(digest.as_str().len(), PasswordDigest::HEX_LENGTH);
/// assert!(digest.matches("admin"));
/// assert!(!digest.matches("Admin"));
/// ```
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Length of the hex encoding of a SHA-256 digest.
    pub const HEX_LENGTH: usize = 64;

    /// Hash a plaintext password.
    #[must_use]
    pub fn of(password: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Parse a stored digest, normalising it to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::MalformedDigest` if the input is not
    /// exactly 64 hex characters.
    pub fn parse(s: &str) -> Result<Self, CredentialError> {
        if s.len() != Self::HEX_LENGTH || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CredentialError::MalformedDigest {
                expected: Self::HEX_LENGTH,
            });
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Whether `password` hashes to this digest.
    #[must_use]
    pub fn matches(&self, password: &str) -> bool {
        Self::of(password) == *self
    }

    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep digests out of logs.
impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest([REDACTED])")
    }
}

/// Capability level of a dashboard account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Can add sales records and manage users.
    Admin,
    /// Read-only access to KPIs, charts and exports.
    #[default]
    Viewer,
}

impl UserRole {
    /// Role given to an account loaded from a file without a role column.
    ///
    /// Only the seed account name was privileged before roles were stored.
    #[must_use]
    pub fn legacy_for(username: &Username) -> Self {
        if username == DEFAULT_ADMIN_USERNAME {
            Self::Admin
        } else {
            Self::Viewer
        }
    }

    /// Whether this role may mutate records and users.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Viewer => write!(f, "viewer"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "viewer" => Ok(Self::Viewer),
            _ => Err(CredentialError::InvalidRole(s.to_owned())),
        }
    }
}

/// A row of the credential table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    /// Account name.
    pub username: Username,
    /// Digest of the account password.
    pub password_hash: PasswordDigest,
    /// Capability level.
    pub role: UserRole,
}

impl UserAccount {
    /// Build an account from a plaintext password.
    #[must_use]
    pub fn new(username: Username, password: &str, role: UserRole) -> Self {
        Self {
            username,
            password_hash: PasswordDigest::of(password),
            role,
        }
    }

    /// The account created when no credential file exists: `admin` / `admin`.
    #[must_use]
    pub fn default_admin() -> Self {
        Self {
            username: Username(DEFAULT_ADMIN_USERNAME.to_owned()),
            password_hash: PasswordDigest::of(DEFAULT_ADMIN_USERNAME),
            role: UserRole::Admin,
        }
    }
}
