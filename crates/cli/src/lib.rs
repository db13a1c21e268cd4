pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use prospector_core::config::{AppConfig, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "prospector",
    about = "Prospector operator CLI",
    long_about = "Register agents, inspect configuration, and drive entity-discovery runs end to end.",
    after_help = "Examples:\n  prospector profiles\n  prospector build gtm_engineer --delete\n  prospector discover --objective \"find robotics startups\" --entity-type companies --condition hq=\"based in Japan\" --wait"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Register an agent profile with the hosted runtime")]
    Build {
        #[arg(help = "Profile name, see `prospector profiles`")]
        profile: String,
        #[arg(long, help = "Delete an existing agent of the same name first")]
        delete: bool,
    },
    #[command(about = "List available agent profiles")]
    Profiles,
    #[command(about = "Inspect effective configuration values with source attribution and redaction")]
    Config,
    #[command(about = "Create a discovery run and optionally wait for its results")]
    Discover(commands::discover::DiscoverArgs),
}

fn init_logging(config: &AppConfig) {
    use prospector_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Load config and initialize logging before any command runs.
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            let result =
                commands::CommandResult::failure("config_load", "configuration", error.to_string(), 2);
            println!("{}", result.output);
            return ExitCode::from(result.exit_code);
        }
    };
    init_logging(&config);

    let result = match cli.command {
        Command::Build { profile, delete } => commands::build::run(&config, &profile, delete),
        Command::Profiles => commands::profiles::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(&config) }
        }
        Command::Discover(args) => commands::discover::run(&config, args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
