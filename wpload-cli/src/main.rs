//! wpload CLI - key flight-plan profiles into DCS cockpits.
//!
//! This binary is a thin front end over the `wpload` library: it resolves
//! settings from the command line and `config.ini`, installs logging, and
//! runs one command.

mod commands;
mod error;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;

use commands::config::ConfigCommands;
use commands::enter::EnterArgs;
use commands::format::FormatArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "wpload", version, about = "Enter waypoint profiles into DCS cockpits")]
struct Cli {
    /// Increase log detail (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Also write logs to a file (default location when no path is given)
    #[arg(long, global = true, num_args = 0..=1, value_name = "PATH")]
    log_file: Option<Option<PathBuf>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Enter a profile into the simulator
    Enter {
        /// Profile JSON file
        profile: PathBuf,

        /// Airframe to enter for, overriding the profile's own
        #[arg(short, long)]
        airframe: Option<String>,

        /// Simulator host (default from config)
        #[arg(long)]
        host: Option<String>,

        /// Simulator import port (default from config)
        #[arg(long)]
        port: Option<u16>,

        /// Seconds to wait before the first press (default from config)
        #[arg(long)]
        grace: Option<f64>,

        /// Print the commands instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Show how a position is keyed into an airframe
    Format {
        /// Latitude in decimal degrees, south negative
        #[arg(allow_negative_numbers = true)]
        latitude: f64,

        /// Longitude in decimal degrees, west negative
        #[arg(allow_negative_numbers = true)]
        longitude: f64,

        /// Airframe to format for (default from config)
        #[arg(short, long, conflicts_with = "all")]
        airframe: Option<String>,

        /// Format for every supported airframe
        #[arg(long)]
        all: bool,
    },

    /// List supported airframes
    Airframes,

    /// View or change settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .map(|path| path.unwrap_or_else(logging::default_log_path));
    let _guard = match logging::init(cli.verbose, log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{} {}", style("warning:").yellow().bold(), e);
            None
        }
    };

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Enter {
            profile,
            airframe,
            host,
            port,
            grace,
            dry_run,
        } => commands::enter::run(EnterArgs {
            profile,
            airframe,
            host,
            port,
            grace,
            dry_run,
        }),
        Commands::Format {
            latitude,
            longitude,
            airframe,
            all,
        } => commands::format::run(FormatArgs {
            latitude,
            longitude,
            airframe,
            all,
        }),
        Commands::Airframes => commands::airframes::run(),
        Commands::Config { command } => commands::config::run(command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_format_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["wpload", "format", "-33.5", "-70.25", "--all"]).unwrap();
        match cli.command {
            Commands::Format {
                latitude,
                longitude,
                all,
                ..
            } => {
                assert_eq!(latitude, -33.5);
                assert_eq!(longitude, -70.25);
                assert!(all);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_enter_flags() {
        let cli = Cli::try_parse_from([
            "wpload", "-v", "enter", "plan.json", "--airframe", "hornet", "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        assert!(cli.log_file.is_none());
        match cli.command {
            Commands::Enter {
                profile,
                airframe,
                dry_run,
                ..
            } => {
                assert_eq!(profile, PathBuf::from("plan.json"));
                assert_eq!(airframe.as_deref(), Some("hornet"));
                assert!(dry_run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_log_file_without_path() {
        let cli = Cli::try_parse_from(["wpload", "airframes", "--log-file"]).unwrap();
        assert_eq!(cli.log_file, Some(None));
    }
}
