//! Geographic positions and cockpit coordinate formatting.
//!
//! Cockpit keypads never accept a signed decimal coordinate. Each device
//! expects a hemisphere key followed by an unsigned run of digits laid out in
//! its own convention (degrees/minutes/seconds or degrees/decimal-minutes, with
//! device-specific zero-fill). This module owns the [`Position`] value type and
//! the pure conversion between positions and those digit runs.
//!
//! # Example
//!
//! ```
//! use wpload::geo::{format_position, CoordinateFormat, Position};
//!
//! let position = Position::new(41.5, -70.25).unwrap();
//! let coords = format_position(&position, &CoordinateFormat::decimal_minutes(3).with_easting_zfill(3));
//!
//! assert_eq!(coords.latitude, "4130.000");
//! assert_eq!(coords.longitude, "07015.000");
//! ```

mod format;
mod types;

pub use format::{
    decode_position, format_position, CoordinateFormat, EntryMode, FormattedCoords,
};
pub use types::{Hemisphere, Position, PositionError, FEET_PER_METER, MAX_LAT, MAX_LON};
