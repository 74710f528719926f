//! Waypoint and mission point types.

use std::fmt;
use std::str::FromStr;

use crate::geo::Position;

use super::ProfileError;

/// Kind tag of a waypoint.
///
/// `Waypoint` is the general navigation point every airframe supports. The
/// remaining tags are airframe-specific slots (the Tomcat's fix, initial,
/// surface target, defend, hostile area, and home base points), plus `Mission`
/// for station-bound target points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WaypointKind {
    Waypoint,
    Mission,
    FixPoint,
    InitialPoint,
    SurfaceTarget,
    DefendPoint,
    HostileArea,
    HomeBase,
}

impl WaypointKind {
    /// All kinds, in declaration order.
    pub const ALL: [WaypointKind; 8] = [
        WaypointKind::Waypoint,
        WaypointKind::Mission,
        WaypointKind::FixPoint,
        WaypointKind::InitialPoint,
        WaypointKind::SurfaceTarget,
        WaypointKind::DefendPoint,
        WaypointKind::HostileArea,
        WaypointKind::HomeBase,
    ];

    /// Short tag used in profiles and cockpit labels.
    pub fn tag(self) -> &'static str {
        match self {
            WaypointKind::Waypoint => "WP",
            WaypointKind::Mission => "MSN",
            WaypointKind::FixPoint => "FP",
            WaypointKind::InitialPoint => "IP",
            WaypointKind::SurfaceTarget => "ST",
            WaypointKind::DefendPoint => "DP",
            WaypointKind::HostileArea => "HA",
            WaypointKind::HomeBase => "HB",
        }
    }
}

impl FromStr for WaypointKind {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WaypointKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProfileError::UnknownKind(s.to_string()))
    }
}

impl fmt::Display for WaypointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A single point of a profile.
///
/// Mission points are waypoints of kind [`WaypointKind::Mission`] that also
/// carry a weapon station. `number` is the 1-based display number; the owning
/// [`Profile`](super::Profile) recomputes it on every change, per kind for
/// waypoints and per station for missions.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    /// Kind tag.
    pub kind: WaypointKind,
    /// 1-based display number (recomputed by the profile).
    pub number: u32,
    /// Free-text name, possibly empty.
    pub name: String,
    /// Sequence id, 0 when not part of a sequence.
    pub sequence: u32,
    /// Weapon station (missions only, 0 otherwise).
    pub station: u8,
    /// Where the point is.
    pub position: Position,
}

impl Waypoint {
    /// Creates a waypoint of the given kind.
    pub fn new(kind: WaypointKind, position: Position) -> Self {
        Self {
            kind,
            number: 0,
            name: String::new(),
            sequence: 0,
            station: 0,
            position,
        }
    }

    /// Creates a navigation waypoint (`WP`).
    pub fn navigation(position: Position) -> Self {
        Self::new(WaypointKind::Waypoint, position)
    }

    /// Creates a mission point bound to a weapon station.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::MissingStation`] when `station` is zero.
    pub fn mission(station: u8, position: Position) -> Result<Self, ProfileError> {
        if station == 0 {
            return Err(ProfileError::MissingStation);
        }
        Ok(Self {
            station,
            ..Self::new(WaypointKind::Mission, position)
        })
    }

    /// Set the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the sequence id.
    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    /// Whether this is a station-bound mission point.
    pub fn is_mission(&self) -> bool {
        self.kind == WaypointKind::Mission
    }
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind, self.number)?;
        if self.is_mission() {
            write!(f, " | STA{}", self.station)?;
        } else if self.kind == WaypointKind::Waypoint && self.sequence != 0 {
            write!(f, " | SEQ{}", self.sequence)?;
        }
        if !self.name.is_empty() {
            write!(f, " | {}", self.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn here() -> Position {
        Position::new(36.0, -115.0).unwrap()
    }

    #[test]
    fn test_kind_from_tag() {
        assert_eq!("wp".parse::<WaypointKind>().unwrap(), WaypointKind::Waypoint);
        assert_eq!("HB".parse::<WaypointKind>().unwrap(), WaypointKind::HomeBase);
        assert!(matches!(
            "XX".parse::<WaypointKind>(),
            Err(ProfileError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_mission_requires_station() {
        assert!(matches!(
            Waypoint::mission(0, here()),
            Err(ProfileError::MissingStation)
        ));
        assert_eq!(Waypoint::mission(8, here()).unwrap().station, 8);
    }

    #[test]
    fn test_display() {
        let mut wp = Waypoint::navigation(here())
            .with_name("Nellis")
            .with_sequence(2);
        wp.number = 3;
        assert_eq!(wp.to_string(), "WP3 | SEQ2 | Nellis");

        let mut msn = Waypoint::mission(7, here()).unwrap();
        msn.number = 1;
        assert_eq!(msn.to_string(), "MSN1 | STA7");
    }
}
