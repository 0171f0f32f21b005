//! Unified error handling for the dashboard.

use thiserror::Error;

use revtee_core::DateRangeError;

use crate::services::{AnalyticsError, AuthError, ExportError};
use crate::store::{StoreError, ValidationError};

/// Application-level error type for the dashboard.
#[derive(Debug, Error)]
pub enum AppError {
    /// Reading or writing a backing file failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// A mutation was rejected.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Login or logout failed.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// KPIs or charts cannot be computed for the current filter.
    #[error("{0}")]
    Analytics(#[from] AnalyticsError),

    /// Writing an export failed.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// The requested date range is invalid.
    #[error("Invalid date range: {0}")]
    InvalidDateRange(#[from] DateRangeError),

    /// User is not logged in.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed input.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Message to show the user.
    ///
    /// Storage failures are logged in full and reported without paths or
    /// OS detail.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Store(_) => {
                tracing::error!(error = %self, "storage error");
                "Storage error: the data files could not be read or written".to_string()
            }
            Self::Export(ExportError::Io { path, .. }) => {
                tracing::error!(error = %self, "export error");
                format!("Export error: could not write {}", path.display())
            }
            Self::Analytics(AnalyticsError::EmptySelection) => {
                format!("Warning: {}", AnalyticsError::EmptySelection)
            }
            _ => self.to_string(),
        }
    }
}
