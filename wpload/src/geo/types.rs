//! Position value type and validation errors.

use std::fmt;

use thiserror::Error;

/// Maximum absolute latitude in degrees.
pub const MAX_LAT: f64 = 90.0;

/// Maximum absolute longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Conversion factor used by cockpits that take elevation in meters.
pub const FEET_PER_METER: f64 = 3.2808;

/// Errors raised while building a [`Position`] from caller input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PositionError {
    /// Latitude is not finite or outside -90..=90.
    #[error("Invalid latitude: {0}")]
    InvalidLatitude(f64),

    /// Longitude is not finite or outside -180..=180.
    #[error("Invalid longitude: {0}")]
    InvalidLongitude(f64),

    /// A textual field could not be parsed as a number.
    #[error("Malformed {field}: '{value}'")]
    Malformed {
        field: &'static str,
        value: String,
    },
}

/// Hemisphere of a single coordinate axis.
///
/// Cockpits communicate the sign of a coordinate through which directional
/// key is pressed, never through a minus sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    /// Hemisphere for a signed latitude. Zero counts as north.
    pub fn of_latitude(latitude: f64) -> Self {
        if latitude >= 0.0 {
            Hemisphere::North
        } else {
            Hemisphere::South
        }
    }

    /// Hemisphere for a signed longitude. Zero counts as east.
    pub fn of_longitude(longitude: f64) -> Self {
        if longitude >= 0.0 {
            Hemisphere::East
        } else {
            Hemisphere::West
        }
    }

    /// Whether this hemisphere carries a negative sign.
    pub fn is_negative(self) -> bool {
        matches!(self, Hemisphere::South | Hemisphere::West)
    }

    /// Single-letter designator (N, S, E, W).
    pub fn letter(self) -> char {
        match self {
            Hemisphere::North => 'N',
            Hemisphere::South => 'S',
            Hemisphere::East => 'E',
            Hemisphere::West => 'W',
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A geographic position with an optional elevation.
///
/// Latitude and longitude are signed decimal degrees. Elevation is in feet;
/// `None` means "no elevation" and is distinct from `Some(0)` and from
/// negative values. Positions can only be built through validating
/// constructors, so every `Position` the sequencer sees is representable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    latitude: f64,
    longitude: f64,
    elevation: Option<i32>,
}

impl Position {
    /// Creates a position without elevation.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError`] if either axis is non-finite or out of range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, PositionError> {
        if !latitude.is_finite() || latitude.abs() > MAX_LAT {
            return Err(PositionError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || longitude.abs() > MAX_LON {
            return Err(PositionError::InvalidLongitude(longitude));
        }

        Ok(Self {
            latitude,
            longitude,
            elevation: None,
        })
    }

    /// Returns a copy of this position with the given elevation in feet.
    pub fn with_elevation(mut self, feet: i32) -> Self {
        self.elevation = Some(feet);
        self
    }

    /// Parses a position from decimal-degree strings and an optional
    /// elevation string in whole feet.
    ///
    /// Blank elevation strings are treated as "no elevation".
    pub fn parse(
        latitude: &str,
        longitude: &str,
        elevation: Option<&str>,
    ) -> Result<Self, PositionError> {
        let lat: f64 = latitude
            .trim()
            .parse()
            .map_err(|_| PositionError::Malformed {
                field: "latitude",
                value: latitude.to_string(),
            })?;
        let lon: f64 = longitude
            .trim()
            .parse()
            .map_err(|_| PositionError::Malformed {
                field: "longitude",
                value: longitude.to_string(),
            })?;

        let position = Self::new(lat, lon)?;

        match elevation.map(str::trim).filter(|e| !e.is_empty()) {
            Some(raw) => {
                let feet: i32 = raw.parse().map_err(|_| PositionError::Malformed {
                    field: "elevation",
                    value: raw.to_string(),
                })?;
                Ok(position.with_elevation(feet))
            }
            None => Ok(position),
        }
    }

    /// Signed latitude in decimal degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Signed longitude in decimal degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Elevation in feet, if any.
    pub fn elevation(&self) -> Option<i32> {
        self.elevation
    }

    /// Hemisphere of the latitude axis.
    pub fn latitude_hemisphere(&self) -> Hemisphere {
        Hemisphere::of_latitude(self.latitude)
    }

    /// Hemisphere of the longitude axis.
    pub fn longitude_hemisphere(&self) -> Hemisphere {
        Hemisphere::of_longitude(self.longitude)
    }

    /// Elevation that must be keyed into a device, if any.
    ///
    /// Devices default to ground level when no elevation is entered, so both
    /// "no elevation" and exactly zero feet yield `None`.
    pub fn elevation_entry(&self) -> Option<i32> {
        self.elevation.filter(|feet| *feet != 0)
    }

    /// Elevation converted to whole meters (rounded half away from zero).
    pub fn elevation_meters(&self) -> Option<i32> {
        self.elevation
            .map(|feet| (f64::from(feet) / FEET_PER_METER).round() as i32)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6}{} {:.6}{}",
            self.latitude.abs(),
            self.latitude_hemisphere(),
            self.longitude.abs(),
            self.longitude_hemisphere()
        )?;
        if let Some(feet) = self.elevation {
            write!(f, " {}ft", feet)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_out_of_range_latitude() {
        let result = Position::new(90.5, 0.0);
        assert!(matches!(result, Err(PositionError::InvalidLatitude(_))));
    }

    #[test]
    fn test_new_rejects_non_finite_longitude() {
        let result = Position::new(0.0, f64::NAN);
        assert!(matches!(result, Err(PositionError::InvalidLongitude(_))));
    }

    #[test]
    fn test_parse_with_negative_elevation() {
        let position = Position::parse("36.2", "-115.03", Some("-12")).unwrap();
        assert_eq!(position.elevation(), Some(-12));
        assert_eq!(position.elevation_entry(), Some(-12));
    }

    #[test]
    fn test_parse_blank_elevation_is_none() {
        let position = Position::parse("36.2", "-115.03", Some("  ")).unwrap();
        assert_eq!(position.elevation(), None);
    }

    #[test]
    fn test_parse_malformed_latitude() {
        let result = Position::parse("36,2", "-115.03", None);
        assert!(matches!(
            result,
            Err(PositionError::Malformed {
                field: "latitude",
                ..
            })
        ));
    }

    #[test]
    fn test_parse_malformed_elevation() {
        let result = Position::parse("36.2", "-115.03", Some("12ft"));
        assert!(matches!(
            result,
            Err(PositionError::Malformed {
                field: "elevation",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_elevation_is_not_entered() {
        let position = Position::new(10.0, 10.0).unwrap().with_elevation(0);
        assert_eq!(position.elevation(), Some(0));
        assert_eq!(position.elevation_entry(), None);
    }

    #[test]
    fn test_elevation_meters_rounds() {
        let position = Position::new(10.0, 10.0).unwrap().with_elevation(1000);
        // 1000 / 3.2808 = 304.8
        assert_eq!(position.elevation_meters(), Some(305));
    }

    #[test]
    fn test_hemispheres() {
        let position = Position::new(-33.9, 151.2).unwrap();
        assert_eq!(position.latitude_hemisphere(), Hemisphere::South);
        assert_eq!(position.longitude_hemisphere(), Hemisphere::East);
        assert!(Hemisphere::West.is_negative());
        assert!(!Hemisphere::North.is_negative());
    }
}
