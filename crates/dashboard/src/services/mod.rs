//! Business logic services for the dashboard.
//!
//! # Services
//!
//! - `analytics` - Filtering, KPI aggregation and chart series
//! - `auth` - Password authentication and role checks
//! - `export` - CSV export of record subsets

pub mod analytics;
pub mod auth;
pub mod export;

pub use analytics::{AnalyticsError, ChartData};
pub use auth::{AuthError, Authenticator, LoginForm};
pub use export::ExportError;
