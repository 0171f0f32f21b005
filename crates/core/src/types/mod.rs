//! Core types for Rev-Tee.
//!
//! This module provides type-safe wrappers for the dashboard's domain concepts.

pub mod credential;
pub mod filter;
pub mod kpi;
pub mod record;

pub use credential::{
    CredentialError, DEFAULT_ADMIN_USERNAME, PasswordDigest, UserAccount, UserRole, Username,
};
pub use filter::{ALL_PRODUCTS, DateRange, DateRangeError, ProductSelection};
pub use kpi::{KpiScope, KpiSet};
pub use record::{RECORD_DATE_FORMAT, SalesRecord, parse_record_date};
