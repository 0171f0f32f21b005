//! Authentication error types.

use thiserror::Error;

/// Errors that can occur while logging in or out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The username and password do not match a stored account.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// A user is already logged in to this session.
    #[error("already logged in as {0}, log out first")]
    AlreadyLoggedIn(String),

    /// Nobody is logged in to this session.
    #[error("not logged in")]
    NotLoggedIn,
}
