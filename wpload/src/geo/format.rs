//! Conversion between positions and cockpit digit strings.

use super::types::{Hemisphere, Position, PositionError};

/// Raw seconds fractions smaller than this are treated as exactly zero.
const ZERO_FRACTION_EPSILON: f64 = 1e-9;

/// Numeric entry convention of a cockpit device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    /// Degrees, minutes, seconds (`DDMMSS.ss`).
    DegreesMinutesSeconds,
    /// Degrees and decimal minutes (`DDMM.mmmm`).
    DecimalMinutes,
}

/// Per-airframe formatting configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateFormat {
    /// Entry convention.
    pub mode: EntryMode,
    /// Width the longitude degree field is zero-filled to (2 or 3).
    pub easting_zfill: usize,
    /// Width the integer minutes field is zero-filled to.
    pub minutes_zfill: usize,
    /// Collapse seconds to their tens digit (DMS mode only).
    pub one_digit_seconds: bool,
    /// Fractional minute digits (decimal-minutes mode only).
    pub precision: usize,
}

impl Default for CoordinateFormat {
    fn default() -> Self {
        Self {
            mode: EntryMode::DegreesMinutesSeconds,
            easting_zfill: 2,
            minutes_zfill: 2,
            one_digit_seconds: false,
            precision: 4,
        }
    }
}

impl CoordinateFormat {
    /// Degrees/minutes/seconds with default zero-fill.
    pub fn dms() -> Self {
        Self::default()
    }

    /// Degrees/decimal-minutes with the given number of fractional digits.
    pub fn decimal_minutes(precision: usize) -> Self {
        Self {
            mode: EntryMode::DecimalMinutes,
            precision,
            ..Self::default()
        }
    }

    /// Set the longitude degree zero-fill width.
    pub fn with_easting_zfill(mut self, width: usize) -> Self {
        self.easting_zfill = width;
        self
    }

    /// Set the minutes zero-fill width.
    pub fn with_minutes_zfill(mut self, width: usize) -> Self {
        self.minutes_zfill = width;
        self
    }

    /// Enable or disable one-digit seconds.
    pub fn with_one_digit_seconds(mut self, enabled: bool) -> Self {
        self.one_digit_seconds = enabled;
        self
    }
}

/// Unsigned digit strings for both axes, plus the hemisphere keys to press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedCoords {
    pub latitude: String,
    pub longitude: String,
    pub latitude_hemisphere: Hemisphere,
    pub longitude_hemisphere: Hemisphere,
}

/// Formats a position into the digit strings a device expects.
///
/// The returned strings never carry a sign; the hemisphere of each axis is
/// reported separately. Rounding carries propagate upward, so a value such as
/// 59.99999 minutes becomes the next whole degree instead of "60" minutes.
pub fn format_position(position: &Position, format: &CoordinateFormat) -> FormattedCoords {
    FormattedCoords {
        latitude: format_axis(position.latitude(), 0, format),
        longitude: format_axis(position.longitude(), format.easting_zfill, format),
        latitude_hemisphere: position.latitude_hemisphere(),
        longitude_hemisphere: position.longitude_hemisphere(),
    }
}

fn format_axis(value: f64, degree_zfill: usize, format: &CoordinateFormat) -> String {
    let abs = value.abs();
    let mz = format.minutes_zfill;

    match format.mode {
        EntryMode::DegreesMinutesSeconds if format.one_digit_seconds => {
            let total = (abs * 3600.0).round() as u64;
            let (degrees, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
            format!(
                "{:0dz$}{:0mz$}{}",
                degrees,
                minutes,
                seconds / 10,
                dz = degree_zfill,
                mz = mz
            )
        }
        EntryMode::DegreesMinutesSeconds => {
            let raw_fraction = (abs * 3600.0).fract();
            let has_fraction = raw_fraction > ZERO_FRACTION_EPSILON
                && raw_fraction < 1.0 - ZERO_FRACTION_EPSILON;

            // Work in hundredths of a second so rounding carries cleanly.
            let total = (abs * 360_000.0).round() as u64;
            let degrees = total / 360_000;
            let minutes = (total % 360_000) / 6_000;
            let seconds = (total % 6_000) / 100;
            let hundredths = total % 100;

            let mut out = format!(
                "{:0dz$}{:0mz$}{:02}",
                degrees,
                minutes,
                seconds,
                dz = degree_zfill,
                mz = mz
            );
            if has_fraction {
                out.push_str(&format!(".{:02}", hundredths));
            }
            out
        }
        EntryMode::DecimalMinutes => {
            let units = 10u64.pow(format.precision as u32);
            let per_degree = 60 * units;
            let total = (abs * per_degree as f64).round() as u64;
            let degrees = total / per_degree;
            let whole_minutes = (total % per_degree) / units;
            let fraction = total % units;

            if format.precision == 0 {
                format!(
                    "{:0dz$}{:0mz$}",
                    degrees,
                    whole_minutes,
                    dz = degree_zfill,
                    mz = mz
                )
            } else {
                format!(
                    "{:0dz$}{:0mz$}.{:0p$}",
                    degrees,
                    whole_minutes,
                    fraction,
                    dz = degree_zfill,
                    mz = mz,
                    p = format.precision
                )
            }
        }
    }
}

/// Decodes digit strings produced by [`format_position`] back into a position.
///
/// Used to verify that a format round-trips within its declared precision.
pub fn decode_position(
    latitude: &str,
    longitude: &str,
    latitude_hemisphere: Hemisphere,
    longitude_hemisphere: Hemisphere,
    format: &CoordinateFormat,
) -> Result<Position, PositionError> {
    let lat = decode_axis(latitude, "latitude", format)?;
    let lon = decode_axis(longitude, "longitude", format)?;

    let lat = if latitude_hemisphere.is_negative() { -lat } else { lat };
    let lon = if longitude_hemisphere.is_negative() { -lon } else { lon };

    Position::new(lat, lon)
}

fn decode_axis(
    digits: &str,
    field: &'static str,
    format: &CoordinateFormat,
) -> Result<f64, PositionError> {
    let malformed = || PositionError::Malformed {
        field,
        value: digits.to_string(),
    };

    let (integer, fraction) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    if !integer.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let fraction_value = match fraction {
        Some(f) if !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()) => {
            format!("0.{}", f).parse::<f64>().map_err(|_| malformed())?
        }
        Some(_) => return Err(malformed()),
        None => 0.0,
    };

    let seconds_width = match format.mode {
        EntryMode::DegreesMinutesSeconds if format.one_digit_seconds => 1,
        EntryMode::DegreesMinutesSeconds => 2,
        EntryMode::DecimalMinutes => 0,
    };
    let tail = format.minutes_zfill + seconds_width;
    if integer.len() <= tail {
        return Err(malformed());
    }

    let (deg_str, rest) = integer.split_at(integer.len() - tail);
    let (min_str, sec_str) = rest.split_at(format.minutes_zfill);

    let degrees: f64 = deg_str.parse().map_err(|_| malformed())?;
    let minutes: f64 = min_str.parse().map_err(|_| malformed())?;

    let value = match format.mode {
        EntryMode::DecimalMinutes => degrees + (minutes + fraction_value) / 60.0,
        EntryMode::DegreesMinutesSeconds => {
            let mut seconds: f64 = sec_str.parse().map_err(|_| malformed())?;
            if format.one_digit_seconds {
                seconds *= 10.0;
            }
            degrees + minutes / 60.0 + (seconds + fraction_value) / 3600.0
        }
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(lat: f64, lon: f64) -> Position {
        Position::new(lat, lon).unwrap()
    }

    #[test]
    fn test_dms_with_fractional_seconds() {
        // 36°14'10.50" N, 115°02'03.25" W
        let lat = 36.0 + 14.0 / 60.0 + 10.5 / 3600.0;
        let lon = -(115.0 + 2.0 / 60.0 + 3.25 / 3600.0);
        let coords = format_position(&pos(lat, lon), &CoordinateFormat::dms());

        assert_eq!(coords.latitude, "361410.50");
        assert_eq!(coords.longitude, "1150203.25");
        assert_eq!(coords.latitude_hemisphere, Hemisphere::North);
        assert_eq!(coords.longitude_hemisphere, Hemisphere::West);
    }

    #[test]
    fn test_dms_whole_seconds_omit_fraction() {
        // 41.5 degrees is exactly 41°30'00"
        let coords = format_position(&pos(41.5, 7.25), &CoordinateFormat::dms());
        assert_eq!(coords.latitude, "413000");
        assert_eq!(coords.longitude, "071500");
    }

    #[test]
    fn test_dms_three_digit_easting() {
        let coords = format_position(
            &pos(41.5, 7.25),
            &CoordinateFormat::dms().with_easting_zfill(3),
        );
        assert_eq!(coords.longitude, "0071500");
    }

    #[test]
    fn test_dms_latitude_is_not_zero_filled() {
        let coords = format_position(&pos(5.5, 7.25), &CoordinateFormat::dms());
        assert_eq!(coords.latitude, "53000");
    }

    #[test]
    fn test_one_digit_seconds_truncates_to_tens() {
        // 42°10'37" -> seconds 37 -> "3"
        let lat = 42.0 + 10.0 / 60.0 + 37.0 / 3600.0;
        let coords = format_position(
            &pos(lat, -lat),
            &CoordinateFormat::dms().with_one_digit_seconds(true),
        );
        assert_eq!(coords.latitude, "42103");
        assert_eq!(coords.longitude, "42103");
    }

    #[test]
    fn test_one_digit_seconds_carries_into_minutes() {
        // 10°05'59.7" rounds to 10°06'00"
        let lat = 10.0 + 5.0 / 60.0 + 59.7 / 3600.0;
        let coords = format_position(
            &pos(lat, 0.0),
            &CoordinateFormat::dms().with_one_digit_seconds(true),
        );
        assert_eq!(coords.latitude, "10060");
    }

    #[test]
    fn test_decimal_minutes_precision() {
        // 36°14.1234' N
        let lat = 36.0 + 14.1234 / 60.0;
        let coords = format_position(&pos(lat, 0.0), &CoordinateFormat::decimal_minutes(4));
        assert_eq!(coords.latitude, "3614.1234");

        let coords = format_position(&pos(lat, 0.0), &CoordinateFormat::decimal_minutes(3));
        assert_eq!(coords.latitude, "3614.123");
    }

    #[test]
    fn test_decimal_minutes_zero_fills_minutes() {
        let lat = 36.0 + 4.5 / 60.0;
        let coords = format_position(&pos(lat, 0.0), &CoordinateFormat::decimal_minutes(2));
        assert_eq!(coords.latitude, "3604.50");
    }

    #[test]
    fn test_decimal_minutes_carry_into_degrees() {
        let lat = 35.0 + 59.99996 / 60.0;
        let coords = format_position(&pos(lat, 0.0), &CoordinateFormat::decimal_minutes(4));
        assert_eq!(coords.latitude, "3600.0000");
    }

    #[test]
    fn test_decimal_minutes_zero_precision_has_no_point() {
        let coords = format_position(&pos(36.5, 0.0), &CoordinateFormat::decimal_minutes(0));
        assert_eq!(coords.latitude, "3630");
    }

    #[test]
    fn test_decode_dms() {
        let format = CoordinateFormat::dms().with_easting_zfill(3);
        let position = decode_position(
            "361410.50",
            "1150203.25",
            Hemisphere::North,
            Hemisphere::West,
            &format,
        )
        .unwrap();

        let lat = 36.0 + 14.0 / 60.0 + 10.5 / 3600.0;
        assert!((position.latitude() - lat).abs() < 1e-9);
        assert!(position.longitude() < 0.0);
    }

    #[test]
    fn test_decode_rejects_short_input() {
        let result = decode_position(
            "12",
            "0071500",
            Hemisphere::North,
            Hemisphere::East,
            &CoordinateFormat::dms(),
        );
        assert!(matches!(result, Err(PositionError::Malformed { .. })));
    }

    #[test]
    fn test_decode_rejects_signed_digits() {
        let result = decode_position(
            "-3614.1234",
            "00000.0000",
            Hemisphere::North,
            Hemisphere::East,
            &CoordinateFormat::decimal_minutes(4),
        );
        assert!(matches!(result, Err(PositionError::Malformed { .. })));
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn roundtrip(lat: f64, lon: f64, format: &CoordinateFormat) -> (f64, f64) {
            let coords = format_position(&pos(lat, lon), format);
            let decoded = decode_position(
                &coords.latitude,
                &coords.longitude,
                coords.latitude_hemisphere,
                coords.longitude_hemisphere,
                format,
            )
            .unwrap();
            (decoded.latitude(), decoded.longitude())
        }

        proptest! {
            #[test]
            fn test_dms_roundtrip_property(
                lat in -89.9..89.9_f64,
                lon in -179.9..179.9_f64,
                easting in 2usize..=3
            ) {
                let format = CoordinateFormat::dms().with_easting_zfill(easting);
                let (dlat, dlon) = roundtrip(lat, lon, &format);

                // Half a hundredth of a second, plus float noise
                let tolerance = 0.005 / 3600.0 + 1e-9;
                prop_assert!((dlat - lat).abs() <= tolerance, "lat {} -> {}", lat, dlat);
                prop_assert!((dlon - lon).abs() <= tolerance, "lon {} -> {}", lon, dlon);
            }

            #[test]
            fn test_decimal_minutes_roundtrip_property(
                lat in -89.9..89.9_f64,
                lon in -179.9..179.9_f64,
                precision in 2usize..=4,
                easting in 2usize..=3
            ) {
                let format = CoordinateFormat::decimal_minutes(precision)
                    .with_easting_zfill(easting);
                let (dlat, dlon) = roundtrip(lat, lon, &format);

                let tolerance = 0.5 * 10f64.powi(-(precision as i32)) / 60.0 + 1e-9;
                prop_assert!((dlat - lat).abs() <= tolerance, "lat {} -> {}", lat, dlat);
                prop_assert!((dlon - lon).abs() <= tolerance, "lon {} -> {}", lon, dlon);
            }

            #[test]
            fn test_hemisphere_follows_sign(
                lat in -89.9..89.9_f64,
                lon in -179.9..179.9_f64
            ) {
                let coords = format_position(&pos(lat, lon), &CoordinateFormat::dms());
                prop_assert_eq!(coords.latitude_hemisphere.is_negative(), lat < 0.0);
                prop_assert_eq!(coords.longitude_hemisphere.is_negative(), lon < 0.0);
                prop_assert!(!coords.latitude.contains('-'));
                prop_assert!(!coords.longitude.contains('-'));
            }
        }
    }
}
