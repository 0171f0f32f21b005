//! Rev-Tee dashboard - interactive sales console.
//!
//! Opens the users and data files and reads commands from stdin until
//! `quit` or end of input. See `help` at the prompt for the commands.
//!
//! # Files
//!
//! - Users file (`REVTEE_USERS_FILE`, default `users.csv`), seeded with an
//!   `admin`/`admin` account when missing
//! - Data file (`REVTEE_DATA_FILE`, default `revtee_data.csv`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use revtee_dashboard::{Dashboard, DashboardConfig, console, telemetry};

#[derive(Parser)]
#[command(name = "revtee-dashboard")]
#[command(about = "Rev-Tee internal sales dashboard", long_about = None)]
#[command(version)]
struct Args {
    /// Users file (overrides REVTEE_USERS_FILE)
    #[arg(long)]
    users: Option<PathBuf>,

    /// Sales data file (overrides REVTEE_DATA_FILE)
    #[arg(long)]
    data: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr; the console owns stdout.
    telemetry::init();

    let config = match DashboardConfig::from_env()
        .and_then(|config| config.with_overrides(args.users, args.data))
    {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut dashboard = match Dashboard::open(config) {
        Ok(dashboard) => dashboard,
        Err(e) => {
            tracing::error!("Failed to open dashboard: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        users = %dashboard.config().users_file.display(),
        data = %dashboard.config().data_file.display(),
        "dashboard opened"
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(e) = console::run(&mut dashboard, stdin.lock(), stdout.lock()) {
        tracing::error!("Console failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
