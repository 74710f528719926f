//! Driver error types.

use std::io;

use thiserror::Error;

use crate::profile::ProfileError;
use crate::progress::Cancelled;

/// Errors that stop an entry sequence.
#[derive(Debug, Error)]
pub enum DriverError {
    /// No driver is registered for the requested airframe.
    #[error("Undefined driver: {0}")]
    UndefinedDriver(String),

    /// The caller requested cancellation.
    #[error("Operation cancelled")]
    Cancelled,

    /// The transport refused a datagram.
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    /// The profile could not be prepared for entry.
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),
}

impl From<Cancelled> for DriverError {
    fn from(_: Cancelled) -> Self {
        DriverError::Cancelled
    }
}

/// Result alias for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;
