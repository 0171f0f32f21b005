//! Login state of a dashboard session.
//!
//! ```text
//! LoggedOut --login--> LoggedIn --logout--> LoggedOut
//! ```
//!
//! There is no timeout and no lockout. The state lives only as long as the
//! running process.

use serde::{Deserialize, Serialize};

use revtee_core::{UserRole, Username};

use crate::services::auth::AuthError;

/// Identity stored in the session after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Account name.
    pub username: Username,
    /// Role at login time.
    pub role: UserRole,
}

/// Whether someone is logged in, and who.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    /// Nobody is logged in.
    #[default]
    LoggedOut,
    /// A user is logged in.
    LoggedIn(CurrentUser),
}

impl Session {
    /// The logged-in user, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&CurrentUser> {
        match self {
            Self::LoggedOut => None,
            Self::LoggedIn(user) => Some(user),
        }
    }

    /// Whether a user is logged in.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn(_))
    }

    /// Move to `LoggedIn`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AlreadyLoggedIn` if a user is already logged in.
    pub fn begin(&mut self, user: CurrentUser) -> Result<&CurrentUser, AuthError> {
        if let Self::LoggedIn(existing) = self {
            return Err(AuthError::AlreadyLoggedIn(existing.username.to_string()));
        }
        *self = Self::LoggedIn(user);
        self.current().ok_or(AuthError::NotLoggedIn)
    }

    /// Move to `LoggedOut`, returning who was logged in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn` if nobody was logged in.
    pub fn end(&mut self) -> Result<CurrentUser, AuthError> {
        match std::mem::take(self) {
            Self::LoggedIn(user) => Ok(user),
            Self::LoggedOut => Err(AuthError::NotLoggedIn),
        }
    }

    /// Keep the stored identity in step with a renamed account.
    pub(crate) fn follow_rename(&mut self, old_username: &str, new_username: &Username) {
        if let Self::LoggedIn(user) = self {
            if user.username == old_username {
                user.username = new_username.clone();
            }
        }
    }
}
