//! Console command grammar.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use thiserror::Error;

use revtee_core::{UserRole, parse_record_date};

/// One line typed at the console.
#[derive(Debug, Parser)]
#[command(
    name = "revtee",
    no_binary_name = true,
    disable_version_flag = true,
    about = "Rev-Tee sales dashboard"
)]
pub struct ConsoleLine {
    #[command(subcommand)]
    pub command: ConsoleCommand,
}

/// Which records a command works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    /// Records passing the current date range and product selection
    Filtered,
    /// Every record
    Full,
}

#[derive(Debug, Subcommand)]
pub enum ConsoleCommand {
    /// Log in
    Login {
        /// Account name
        username: String,
        /// Account password
        password: String,
    },
    /// Log out
    Logout,
    /// Set the date range (`range 2024-01-01 2024-01-31`) or go back to the full span (`range reset`)
    Range {
        /// First day, or `reset`
        from: String,
        /// Last day
        to: Option<String>,
    },
    /// Show the product options, or select products (`All` for every product)
    Products {
        /// Products to select
        names: Vec<String>,
        /// Select no product at all
        #[arg(long, conflicts_with = "names")]
        clear: bool,
    },
    /// Show the indicators for the current filter
    Kpis,
    /// Show the chart data for the current filter
    Charts,
    /// Show records as a table
    Show {
        #[arg(value_enum, default_value_t = View::Filtered)]
        view: View,
    },
    /// Add a sales record (admin)
    AddRecord {
        /// Day of the sale (default: today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Product name
        #[arg(long)]
        product: String,
        /// Units sold
        #[arg(long, default_value_t = 0)]
        sales: u64,
        /// Store visitors
        #[arg(long, default_value_t = 0)]
        visitors: u64,
        /// Visitors who bought
        #[arg(long, default_value_t = 0)]
        conversions: u64,
        /// Revenue
        #[arg(long, default_value_t = Decimal::ZERO)]
        revenue: Decimal,
    },
    /// Create a user (admin)
    AddUser {
        /// New account name
        username: String,
        /// New account password
        password: String,
        /// Account role (`admin`, `viewer`)
        #[arg(long, default_value_t = UserRole::Viewer)]
        role: UserRole,
    },
    /// Rename a user and set a new password (admin)
    EditUser {
        /// Current account name
        username: String,
        /// New account name (may equal the current one)
        new_username: String,
        /// New password
        new_password: String,
    },
    /// List users (admin)
    Users,
    /// Write records to a CSV file
    Export {
        #[arg(value_enum)]
        view: View,
        /// Destination (default: in the export directory)
        path: Option<PathBuf>,
    },
    /// Leave the console
    #[command(alias = "exit")]
    Quit,
}

/// Parse a day in any format the data file accepts.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    parse_record_date(raw).ok_or_else(|| format!("'{raw}' is not a date (expected YYYY-MM-DD)"))
}

/// Errors that can occur while splitting a line into words.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    /// A quote was opened but never closed.
    #[error("unclosed {0} quote")]
    UnclosedQuote(char),
}

/// Split a line on whitespace. Single or double quotes group words.
///
/// ```
/// use revtee_dashboard::console::split_words;
///
/// assert_eq!(
///     split_words(r#"products "Tee Noir" Hoodie"#).unwrap(),
///     vec!["products", "Tee Noir", "Hoodie"]
/// );
/// ```
///
/// # Errors
///
/// Returns `SplitError::UnclosedQuote` if a quote is not closed.
pub fn split_words(line: &str) -> Result<Vec<String>, SplitError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(SplitError::UnclosedQuote(q));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
