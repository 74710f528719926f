//! wpload - waypoint sequencer for DCS World cockpits
//!
//! This library turns a flight-plan profile into the timed stream of button
//! presses a pilot would make to key it in by hand, and sends them to the
//! simulator's DCS-BIOS import port.
//!
//! ```text
//! Profile ──▶ DriverRegistry ──▶ AirframeDriver ──▶ CommandChannel ──UDP──▶ DCS
//!                                  │    ▲
//!                      geo::format ┘    └ ProgressController ◀─▶ caller
//! ```
//!
//! Entries normally run on a worker thread through [`session::spawn_entry`].

pub mod channel;
pub mod config;
pub mod drivers;
pub mod geo;
pub mod limits;
pub mod profile;
pub mod progress;
pub mod registry;
pub mod session;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
