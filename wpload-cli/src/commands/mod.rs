//! Command implementations.

pub mod airframes;
pub mod config;
pub mod enter;
pub mod format;
