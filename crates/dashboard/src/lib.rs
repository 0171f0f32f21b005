//! Rev-Tee sales dashboard library.
//!
//! Loads the users file and the sales data file, authenticates against the
//! former and computes filtered KPIs and chart series from the latter.
//! The console binary and the management CLI are thin layers over
//! [`Dashboard`] and the services below it.
//!
//! # Security
//!
//! Passwords are stored as unsalted SHA-256 digests so existing users files
//! keep working. Treat the users file as sensitive.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod console;
pub mod dashboard;
pub mod error;
pub mod services;
pub mod session;
pub mod store;
pub mod telemetry;

pub use config::DashboardConfig;
pub use dashboard::{Dashboard, ExportSummary};
pub use error::AppError;
