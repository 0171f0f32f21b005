//! Rev-Tee CLI - account management and reports on the dashboard files.
//!
//! # Usage
//!
//! ```bash
//! # Create a viewer account (password from the environment)
//! REVTEE_PASSWORD=secret revtee-cli user add -u amina
//!
//! # Create an admin account
//! revtee-cli user add -u ops -p secret -r admin
//!
//! # Rename an account and reset its password
//! revtee-cli user edit -u amina --new-username amina.b -p secret2
//!
//! # KPIs for January, one block per product
//! revtee-cli kpis --from 2024-01-01 --to 2024-01-31 --product Tee --product Hoodie
//!
//! # Export the filtered rows
//! revtee-cli export -o january.csv --from 2024-01-01 --to 2024-01-31
//! ```
//!
//! # Commands
//!
//! - `user add|edit|list` - Manage accounts in the users file
//! - `kpis` - Print indicators for a date range and product selection
//! - `export` - Write a filtered CSV of the data file

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use secrecy::SecretString;

use revtee_core::UserRole;
use revtee_dashboard::console::command::parse_date;
use revtee_dashboard::{DashboardConfig, telemetry};

mod commands;

use commands::report::ReportFilter;

#[derive(Parser)]
#[command(name = "revtee-cli")]
#[command(author, version, about = "Rev-Tee management tools")]
struct Cli {
    /// Users file (overrides REVTEE_USERS_FILE)
    #[arg(long, global = true)]
    users: Option<PathBuf>,

    /// Sales data file (overrides REVTEE_DATA_FILE)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Print KPIs for a date range and product selection
    Kpis {
        #[command(flatten)]
        filter: FilterArgs,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Export filtered records as CSV
    Export {
        /// Destination file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user
    Add {
        /// Account name
        #[arg(short, long)]
        username: String,

        /// Account password
        #[arg(short, long, env = "REVTEE_PASSWORD", hide_env_values = true)]
        password: String,

        /// Account role (`admin`, `viewer`)
        #[arg(short, long, default_value_t = UserRole::Viewer)]
        role: UserRole,
    },
    /// Rename a user and set a new password
    Edit {
        /// Current account name
        #[arg(short, long)]
        username: String,

        /// New account name (default: unchanged)
        #[arg(long)]
        new_username: Option<String>,

        /// New password
        #[arg(short, long, env = "REVTEE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// List users and their roles
    List,
}

#[derive(Args)]
struct FilterArgs {
    /// First day (default: earliest date in the data)
    #[arg(long, value_parser = parse_date)]
    from: Option<NaiveDate>,

    /// Last day (default: latest date in the data)
    #[arg(long, value_parser = parse_date)]
    to: Option<NaiveDate>,

    /// Product to include; repeat for several (default: All)
    #[arg(long = "product")]
    products: Vec<String>,
}

impl From<FilterArgs> for ReportFilter {
    fn from(args: FilterArgs) -> Self {
        Self {
            from: args.from,
            to: args.to,
            products: args.products,
        }
    }
}

fn main() {
    telemetry::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli);

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = DashboardConfig::from_env()?.with_overrides(cli.users, cli.data)?;

    match cli.command {
        Commands::User { action } => match action {
            UserAction::Add {
                username,
                password,
                role,
            } => {
                commands::user::add(&config, &username, &SecretString::from(password), role)?;
            }
            UserAction::Edit {
                username,
                new_username,
                password,
            } => {
                commands::user::edit(
                    &config,
                    &username,
                    new_username.as_deref(),
                    &SecretString::from(password),
                )?;
            }
            UserAction::List => commands::user::list(&config, std::io::stdout().lock())?,
        },
        Commands::Kpis { filter, json } => {
            commands::report::kpis(&config, &filter.into(), json, std::io::stdout().lock())?;
        }
        Commands::Export { output, filter } => {
            commands::report::export(&config, &filter.into(), &output)?;
        }
    }
    Ok(())
}
