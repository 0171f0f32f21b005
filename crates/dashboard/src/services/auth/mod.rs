//! Password authentication against the users table.
//!
//! Passwords arrive as [`SecretString`] and are only exposed to be hashed.
//! Neither passwords nor digests are ever logged.

mod error;

pub use error::AuthError;

use secrecy::{ExposeSecret, SecretString};

use crate::session::CurrentUser;
use crate::store::UserTable;

/// Credentials submitted by a login attempt.
#[derive(Debug, Clone)]
pub struct LoginForm {
    /// Submitted username, compared exactly.
    pub username: String,
    /// Submitted password.
    pub password: SecretString,
}

impl LoginForm {
    /// Build a form from plain input.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Checks credentials and capabilities against a users table.
pub struct Authenticator<'a> {
    users: &'a UserTable,
}

impl<'a> Authenticator<'a> {
    /// Create an authenticator over `users`.
    #[must_use]
    pub const fn new(users: &'a UserTable) -> Self {
        Self { users }
    }

    /// Whether `username` and `password` match a stored account.
    #[must_use]
    pub fn authenticate(&self, username: &str, password: &SecretString) -> bool {
        self.users.find(username, password.expose_secret())
    }

    /// Whether the first account named `username` has the admin role.
    #[must_use]
    pub fn is_admin(&self, username: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|account| account.role.is_admin())
    }

    /// Check a login form and return the identity to store in the session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the form does not match an
    /// account.
    pub fn login(&self, form: &LoginForm) -> Result<CurrentUser, AuthError> {
        if !self.authenticate(&form.username, &form.password) {
            tracing::warn!(username = %form.username, "failed login attempt");
            return Err(AuthError::InvalidCredentials);
        }

        let account = self
            .users
            .get(&form.username)
            .ok_or(AuthError::InvalidCredentials)?;
        tracing::info!(username = %account.username, role = %account.role, "user logged in");
        Ok(CurrentUser {
            username: account.username.clone(),
            role: account.role,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use revtee_core::UserRole;

    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn test_authenticate_seeded_admin() {
        let users = UserTable::seeded();
        let auth = Authenticator::new(&users);
        assert!(auth.authenticate("admin", &secret("admin")));
        assert!(!auth.authenticate("admin", &secret("wrong")));
    }

    #[test]
    fn test_authenticate_rejects_mismatched_pairs() {
        let mut users = UserTable::seeded();
        users.add("bob", "hunter2", UserRole::Viewer).unwrap();
        let auth = Authenticator::new(&users);

        assert!(auth.authenticate("bob", &secret("hunter2")));
        assert!(!auth.authenticate("bob", &secret("admin")));
        assert!(!auth.authenticate("admin", &secret("hunter2")));
        assert!(!auth.authenticate("carol", &secret("hunter2")));
    }

    #[test]
    fn test_is_admin_on_seeded_table() {
        let users = UserTable::seeded();
        let auth = Authenticator::new(&users);
        assert!(auth.is_admin("admin"));
        for name in ["", "Admin", "administrator", "root"] {
            assert!(!auth.is_admin(name), "{name:?}");
        }
    }

    #[test]
    fn test_is_admin_follows_role() {
        let mut users = UserTable::seeded();
        users.add("ops", "pw", UserRole::Admin).unwrap();
        users.add("guest", "pw", UserRole::Viewer).unwrap();
        let auth = Authenticator::new(&users);
        assert!(auth.is_admin("ops"));
        assert!(!auth.is_admin("guest"));
    }

    #[test]
    fn test_login_returns_identity() {
        let users = UserTable::seeded();
        let auth = Authenticator::new(&users);
        let user = auth.login(&LoginForm::new("admin", "admin")).unwrap();
        assert_eq!(user.username.as_str(), "admin");
        assert_eq!(user.role, UserRole::Admin);

        assert_eq!(
            auth.login(&LoginForm::new("admin", "nope")).unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[test]
    fn test_login_form_debug_redacts_password() {
        let form = LoginForm::new("admin", "hunter2");
        let debug_output = format!("{form:?}");
        assert!(debug_output.contains("admin"));
        assert!(!debug_output.contains("hunter2"));
    }
}
