pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "claimcheck",
    about = "Claimcheck operator CLI",
    long_about = "Inspect configuration, check agent runtime readiness, \
                  and send test notifications.",
    after_help = "Examples:\n  claimcheck doctor --json\n  claimcheck config\n  \
                  claimcheck test-email --to holder@example.com"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, agent runtime reachability, and approval link base URL")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Render and send a test notification through the configured sender")]
    TestEmail {
        #[arg(long, help = "Recipient address for the test message")]
        to: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::TestEmail { to } => commands::test_email::run(&to),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
