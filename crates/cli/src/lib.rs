pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "roombot",
    about = "Roombot operator CLI",
    long_about = "Inspect roombot configuration, check readiness, and query room availability.",
    after_help = "Examples:\n  roombot doctor --json\n  roombot config\n  \
                  roombot availability --date 2026-10-16 --start 09:00 --end 10:00"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, Slack token readiness, and calendar reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List the meeting rooms free for a time window as JSON")]
    Availability {
        #[arg(long, help = "Day to check (YYYY-MM-DD)")]
        date: String,
        #[arg(long, help = "Window start (HH:MM)")]
        start: String,
        #[arg(long, help = "Window end (HH:MM)")]
        end: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Availability { date, start, end } => {
            commands::availability::run(&date, &start, &end)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
