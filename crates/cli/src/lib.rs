pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "querylane",
    about = "Querylane operator CLI",
    long_about = "Inspect querylane configuration, check integration readiness, and preview query routing.",
    after_help = "Examples:\n  querylane doctor --json\n  querylane config\n  querylane route \"seo pages with 404 status\""
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
    #[command(about = "Validate config, GA4 credentials file, and crawl sheet reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Show which downstream service a query would be routed to")]
    Route {
        #[arg(help = "Natural-language question to route")]
        query: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Route { query } => commands::route::run(&query),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
