//! CLI error type and exit codes.

use std::fmt;
use std::io;

use wpload::config::ConfigError;
use wpload::drivers::DriverError;
use wpload::geo::PositionError;

/// Errors surfaced to the command line.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded, saved, or edited.
    Config(String),
    /// Coordinates given on the command line were rejected.
    Position(PositionError),
    /// The profile could not be prepared or an airframe is unknown.
    Driver(DriverError),
    /// The entry ran but did not complete.
    EntryFailed(String),
    /// The entry was cancelled by the operator.
    Cancelled,
    /// Logging could not be set up.
    Logging(String),
    /// Any other I/O failure.
    Io(io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            CliError::Position(_) => 3,
            CliError::Driver(DriverError::Profile(_)) => 4,
            CliError::Driver(_) => 5,
            CliError::EntryFailed(_) => 6,
            CliError::Cancelled => 130,
            CliError::Logging(_) | CliError::Io(_) => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Position(e) => write!(f, "Invalid coordinates: {}", e),
            CliError::Driver(DriverError::UndefinedDriver(id)) => write!(
                f,
                "Unknown airframe '{}'. Use 'wpload airframes' to see supported airframes.",
                id
            ),
            CliError::Driver(e) => write!(f, "{}", e),
            CliError::EntryFailed(msg) => write!(f, "Entry failed: {}", msg),
            CliError::Cancelled => write!(f, "Entry cancelled"),
            CliError::Logging(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Position(e) => Some(e),
            CliError::Driver(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<PositionError> for CliError {
    fn from(e: PositionError) -> Self {
        CliError::Position(e)
    }
}

impl From<DriverError> for CliError {
    fn from(e: DriverError) -> Self {
        CliError::Driver(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}
