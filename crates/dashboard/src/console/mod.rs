//! Line-oriented operator console.
//!
//! Reads one command per line, runs it against a [`Dashboard`] and writes
//! the rendered result. Errors are reported and the loop continues; only
//! `quit`, end of input or a failed write ends it.

pub mod command;
pub mod render;

use std::io::{self, BufRead, Write};

use chrono::Local;
use clap::Parser;
use secrecy::SecretString;

use revtee_core::SalesRecord;

use crate::dashboard::Dashboard;
use crate::error::AppError;
use crate::services::auth::LoginForm;

pub use command::{ConsoleCommand, ConsoleLine, SplitError, View, split_words};

const PROMPT: &str = "revtee> ";

/// What the loop does after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print the text and read the next line.
    Continue(String),
    /// Print the text and stop.
    Quit(String),
}

/// Run the console until `quit` or end of input.
///
/// # Errors
///
/// Returns an I/O error if reading `input` or writing `output` fails.
pub fn run<R, W>(dashboard: &mut Dashboard, input: R, mut output: W) -> io::Result<()>
where
    R: BufRead,
    W: Write,
{
    writeln!(
        output,
        "Rev-Tee sales dashboard. Type `help` for commands, `login <user> <password>` to start."
    )?;
    if !dashboard.notices().is_empty() {
        writeln!(output, "{}", render::notices(dashboard.notices()))?;
    }

    write!(output, "{PROMPT}")?;
    output.flush()?;
    for line in input.lines() {
        let line = line?;
        let text = match handle_line(dashboard, &line) {
            Outcome::Continue(text) => text,
            Outcome::Quit(text) => {
                writeln!(output, "{text}")?;
                return Ok(());
            }
        };
        if !text.is_empty() {
            writeln!(output, "{text}")?;
        }
        write!(output, "{PROMPT}")?;
        output.flush()?;
    }
    writeln!(output)?;
    Ok(())
}

/// Parse and run one line.
pub fn handle_line(dashboard: &mut Dashboard, line: &str) -> Outcome {
    let words = match split_words(line) {
        Ok(words) if words.is_empty() => return Outcome::Continue(String::new()),
        Ok(words) => words,
        Err(e) => return Outcome::Continue(format!("error: {e}")),
    };

    let command = match ConsoleLine::try_parse_from(words) {
        Ok(parsed) => parsed.command,
        // Covers `help` as well as usage errors.
        Err(e) => return Outcome::Continue(e.render().to_string().trim_end().to_string()),
    };

    match execute(dashboard, command) {
        Ok(outcome) => outcome,
        Err(e) => Outcome::Continue(e.user_message()),
    }
}

/// Run a parsed command.
///
/// # Errors
///
/// Returns whatever the dashboard operation returned.
pub fn execute(dashboard: &mut Dashboard, command: ConsoleCommand) -> Result<Outcome, AppError> {
    let text = match command {
        ConsoleCommand::Login { username, password } => {
            let user = dashboard.login(&LoginForm::new(username, password))?;
            format!("Welcome, {} ({}).", user.username, user.role)
        }
        ConsoleCommand::Logout => {
            let user = dashboard.logout()?;
            format!("Goodbye, {}.", user.username)
        }
        ConsoleCommand::Range { from, to } => {
            let range = match (from.as_str(), to) {
                ("reset", None) => dashboard.reset_date_range()?,
                (_, None) => {
                    return Err(AppError::BadRequest(
                        "usage: range <from> <to> | range reset".to_string(),
                    ));
                }
                (_, Some(to)) => {
                    let start = command::parse_date(&from).map_err(AppError::BadRequest)?;
                    let end = command::parse_date(&to).map_err(AppError::BadRequest)?;
                    dashboard.set_date_range(start, end)?
                }
            };
            format!("Date range: {range}")
        }
        ConsoleCommand::Products { names, clear } => {
            if clear || !names.is_empty() {
                let selection = dashboard.select_products(names)?;
                format!("Selected: {selection}")
            } else {
                let options = dashboard.product_options()?;
                let available = if options.is_empty() {
                    "(none)".to_string()
                } else {
                    options.join(", ")
                };
                format!(
                    "Selected: {}\nAvailable: {available}",
                    dashboard.selection()
                )
            }
        }
        ConsoleCommand::Kpis => {
            let sets = dashboard.kpis()?;
            let range = dashboard.date_range()?;
            format!(
                "Date range: {range}\n\n{}",
                render::kpis(&sets, dashboard.config())
            )
        }
        ConsoleCommand::Charts => {
            let data = dashboard.charts()?;
            render::charts(&data, dashboard.config())
        }
        ConsoleCommand::Show { view } => match view {
            View::Filtered => render::records(&dashboard.filtered_records()?),
            View::Full => {
                let all: Vec<&SalesRecord> = dashboard.records()?.iter().collect();
                render::records(&all)
            }
        },
        ConsoleCommand::AddRecord {
            date,
            product,
            sales,
            visitors,
            conversions,
            revenue,
        } => {
            let record = SalesRecord {
                date: Some(date.unwrap_or_else(|| Local::now().date_naive())),
                product,
                units_sold: sales,
                visitors,
                conversions,
                revenue,
            };
            let summary = format!(
                "Record added: {} on {}.",
                record.product,
                record.formatted_date()
            );
            dashboard.add_record(record)?;
            summary
        }
        ConsoleCommand::AddUser {
            username,
            password,
            role,
        } => {
            dashboard.add_user(&username, &SecretString::from(password), role)?;
            format!("User {username} added as {role}.")
        }
        ConsoleCommand::EditUser {
            username,
            new_username,
            new_password,
        } => {
            dashboard.edit_user(&username, &new_username, &SecretString::from(new_password))?;
            if username == new_username {
                format!("Password of {username} changed.")
            } else {
                format!("User {username} renamed to {new_username}, password changed.")
            }
        }
        ConsoleCommand::Users => render::users(dashboard.users()?),
        ConsoleCommand::Export { view, path } => {
            let summary = match view {
                View::Filtered => dashboard.export_filtered(path)?,
                View::Full => dashboard.export_full(path)?,
            };
            format!(
                "Exported {} record(s) to {}.",
                summary.rows,
                summary.path.display()
            )
        }
        ConsoleCommand::Quit => return Ok(Outcome::Quit("Bye.".to_string())),
    };
    Ok(Outcome::Continue(text))
}
