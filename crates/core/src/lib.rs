//! Rev-Tee Core - Shared types library.
//!
//! This crate provides the domain types used across all Rev-Tee components:
//! - `dashboard` - Interactive sales dashboard (stores, auth, analytics, console)
//! - `cli` - Command-line tools for user management and reporting
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no file I/O and no
//! logging. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Usernames, password digests, roles, sales records, filters and KPIs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
