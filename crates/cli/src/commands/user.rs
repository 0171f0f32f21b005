//! User account commands.
//!
//! # Usage
//!
//! ```bash
//! revtee-cli user add -u amina -p secret -r viewer
//! revtee-cli user edit -u amina --new-username amina.b -p secret2
//! revtee-cli user list
//! ```
//!
//! # Environment Variables
//!
//! - `REVTEE_USERS_FILE` - Users file to edit
//! - `REVTEE_PASSWORD` - Password for `add`/`edit` when `-p` is omitted

use std::io::{self, Write};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use revtee_core::UserRole;
use revtee_dashboard::DashboardConfig;
use revtee_dashboard::console::render;
use revtee_dashboard::store::{CredentialStore, StoreError, ValidationError};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// Users file could not be read or written.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The change was rejected.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Writing the listing failed.
    #[error("Output error: {0}")]
    Output(#[from] io::Error),
}

/// Create a user and save the users file.
///
/// # Errors
///
/// Returns `UserError::Validation` for an empty field or a taken username,
/// and `UserError::Store` if the file cannot be read or written.
pub fn add(
    config: &DashboardConfig,
    username: &str,
    password: &SecretString,
    role: UserRole,
) -> Result<(), UserError> {
    let store = CredentialStore::new(&config.users_file);
    let mut users = store.load()?.table;

    users.add(username, password.expose_secret(), role)?;
    store.persist(&users)?;

    tracing::info!(
        "User created: {} ({}) in {}",
        username,
        role,
        store.path().display()
    );
    Ok(())
}

/// Rename a user, set a new password and save the users file.
///
/// `new_username` defaults to the current name.
///
/// # Errors
///
/// Returns `UserError::Validation` for an empty field, an unknown user or a
/// taken username, and `UserError::Store` if the file cannot be read or
/// written.
pub fn edit(
    config: &DashboardConfig,
    username: &str,
    new_username: Option<&str>,
    password: &SecretString,
) -> Result<(), UserError> {
    let store = CredentialStore::new(&config.users_file);
    let mut users = store.load()?.table;

    let new_username = new_username.unwrap_or(username);
    users.rename_and_rehash(username, new_username, password.expose_secret())?;
    store.persist(&users)?;

    if new_username == username {
        tracing::info!("Password changed for {username}");
    } else {
        tracing::info!("User {username} renamed to {new_username}, password changed");
    }
    Ok(())
}

/// Write the users table (names and roles) to `out`.
///
/// # Errors
///
/// Returns `UserError::Store` if the file cannot be read and
/// `UserError::Output` if writing fails.
pub fn list<W: Write>(config: &DashboardConfig, mut out: W) -> Result<(), UserError> {
    let store = CredentialStore::new(&config.users_file);
    let users = store.load()?.table;
    writeln!(out, "{}", render::users(users.accounts()))?;
    Ok(())
}
