//! Flight-plan profiles handed to the sequencer.
//!
//! A [`Profile`] is an ordered collection of waypoints and mission points for
//! one airframe, plus an optional [`AvionicsSetup`]. The sequencer only reads
//! profiles; storing them is the surrounding application's job.

mod avionics;
mod file;
mod waypoint;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::geo::PositionError;

pub use avionics::{
    AvionicsSetup, DispenserProgram, MasterMode, MfdFormats, TacanBand, TacanRole,
    TacanYardstick, KEY_CMDS_CHAFF, KEY_CMDS_FLARE, KEY_TACAN_YARD,
};
pub use file::{ProfileDocument, WaypointRecord};
pub use waypoint::{Waypoint, WaypointKind};

/// Errors raised while building a profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Unknown waypoint kind tag.
    #[error("Unknown waypoint type '{0}'")]
    UnknownKind(String),

    /// A mission point without a weapon station.
    #[error("Mission point has no station")]
    MissingStation,

    /// A waypoint record carried an unusable position.
    #[error("Waypoint {index}: {source}")]
    Position {
        index: usize,
        #[source]
        source: PositionError,
    },

    /// A waypoint record carried an elevation that does not fit in whole feet.
    #[error("Waypoint {index}: elevation {value} is out of range")]
    Elevation { index: usize, value: f64 },

    /// An avionics setup value could not be parsed.
    #[error("Invalid avionics setup value for '{key}' ('{value}'): {reason}")]
    InvalidAvionics {
        key: String,
        value: String,
        reason: String,
    },

    /// The profile document is not valid JSON.
    #[error("Invalid profile document: {0}")]
    Json(#[from] serde_json::Error),

    /// The profile document could not be read.
    #[error("Failed to read profile: {0}")]
    Io(#[from] std::io::Error),
}

/// An ordered flight-plan profile for one airframe.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    name: String,
    aircraft: String,
    points: Vec<Waypoint>,
    avionics_name: Option<String>,
    avionics: Option<AvionicsSetup>,
}

impl Profile {
    /// Creates an empty profile for the given airframe identifier.
    pub fn new(name: impl Into<String>, aircraft: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aircraft: aircraft.into(),
            ..Self::default()
        }
    }

    /// Creates a profile from a list of points.
    pub fn with_points(
        name: impl Into<String>,
        aircraft: impl Into<String>,
        points: impl IntoIterator<Item = Waypoint>,
    ) -> Result<Self, ProfileError> {
        let mut profile = Self::new(name, aircraft);
        for point in points {
            profile.check(&point)?;
            profile.points.push(point);
        }
        profile.renumber();
        Ok(profile)
    }

    /// Appends a waypoint or mission point and recomputes numbers.
    pub fn push(&mut self, point: Waypoint) -> Result<(), ProfileError> {
        self.check(&point)?;
        self.points.push(point);
        self.renumber();
        Ok(())
    }

    /// Attaches a named avionics setup.
    pub fn set_avionics(&mut self, name: impl Into<String>, setup: AvionicsSetup) {
        self.avionics_name = Some(name.into());
        self.avionics = Some(setup);
    }

    fn check(&self, point: &Waypoint) -> Result<(), ProfileError> {
        if point.is_mission() && point.station == 0 {
            return Err(ProfileError::MissingStation);
        }
        Ok(())
    }

    /// Profile name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Airframe identifier (e.g. "viper").
    pub fn aircraft(&self) -> &str {
        &self.aircraft
    }

    /// Name of the attached avionics setup, if any.
    pub fn avionics_name(&self) -> Option<&str> {
        self.avionics_name.as_deref()
    }

    /// Attached avionics setup, if any.
    pub fn avionics(&self) -> Option<&AvionicsSetup> {
        self.avionics.as_ref()
    }

    /// Every point in profile order.
    pub fn points(&self) -> &[Waypoint] {
        &self.points
    }

    /// Non-mission points in profile order.
    pub fn waypoints(&self) -> impl Iterator<Item = &Waypoint> {
        self.points.iter().filter(|p| !p.is_mission())
    }

    /// Mission points in profile order.
    pub fn missions(&self) -> impl Iterator<Item = &Waypoint> {
        self.points.iter().filter(|p| p.is_mission())
    }

    /// Sequence id to the ordered 1-based indices of its members in
    /// [`waypoints`](Self::waypoints).
    pub fn sequences(&self) -> BTreeMap<u32, Vec<usize>> {
        sequence_slots(self.waypoints())
    }

    /// Recomputes display numbers: per station for missions, per kind for
    /// everything else.
    fn renumber(&mut self) {
        let mut per_station: BTreeMap<u8, u32> = BTreeMap::new();
        let mut per_kind: BTreeMap<WaypointKind, u32> = BTreeMap::new();

        for point in &mut self.points {
            let counter = if point.is_mission() {
                per_station.entry(point.station).or_insert(0)
            } else {
                per_kind.entry(point.kind).or_insert(0)
            };
            *counter += 1;
            point.number = *counter;
        }
    }
}

/// Groups sequenced navigation waypoints by sequence id. Each slot is the
/// 1-based position of the waypoint in `waypoints`.
pub(crate) fn sequence_slots<'a>(
    waypoints: impl IntoIterator<Item = &'a Waypoint>,
) -> BTreeMap<u32, Vec<usize>> {
    let mut sequences: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, wp) in waypoints.into_iter().enumerate() {
        if wp.kind == WaypointKind::Waypoint && wp.sequence != 0 {
            sequences.entry(wp.sequence).or_default().push(i + 1);
        }
    }
    sequences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Position;

    fn at(lat: f64) -> Position {
        Position::new(lat, 10.0).unwrap()
    }

    fn sample() -> Profile {
        Profile::with_points(
            "test",
            "hornet",
            vec![
                Waypoint::navigation(at(1.0)).with_sequence(1),
                Waypoint::mission(8, at(2.0)).unwrap(),
                Waypoint::navigation(at(3.0)),
                Waypoint::new(WaypointKind::FixPoint, at(4.0)),
                Waypoint::navigation(at(5.0)).with_sequence(1),
                Waypoint::mission(8, at(6.0)).unwrap(),
                Waypoint::mission(2, at(7.0)).unwrap(),
                Waypoint::navigation(at(8.0)).with_sequence(2),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_numbers_per_kind_and_station() {
        let profile = sample();
        let numbers: Vec<(String, u32)> = profile
            .points()
            .iter()
            .map(|p| (p.kind.tag().to_string(), p.number))
            .collect();

        assert_eq!(
            numbers,
            vec![
                ("WP".to_string(), 1),
                ("MSN".to_string(), 1),
                ("WP".to_string(), 2),
                ("FP".to_string(), 1),
                ("WP".to_string(), 3),
                ("MSN".to_string(), 2),
                ("MSN".to_string(), 1),
                ("WP".to_string(), 4),
            ]
        );
    }

    #[test]
    fn test_sequences_index_into_waypoints() {
        let profile = sample();
        let sequences = profile.sequences();

        // Waypoints (non-missions): WP1, WP2, FP1, WP3, WP4
        assert_eq!(sequences.get(&1), Some(&vec![1, 4]));
        assert_eq!(sequences.get(&2), Some(&vec![5]));
        assert_eq!(sequences.len(), 2);
    }

    #[test]
    fn test_push_renumbers() {
        let mut profile = Profile::new("p", "viper");
        profile.push(Waypoint::navigation(at(1.0))).unwrap();
        profile.push(Waypoint::navigation(at(2.0))).unwrap();
        assert_eq!(profile.points()[1].number, 2);
    }

    #[test]
    fn test_push_rejects_stationless_mission() {
        let mut profile = Profile::new("p", "hornet");
        let bogus = Waypoint::new(WaypointKind::Mission, at(1.0));
        assert!(matches!(
            profile.push(bogus),
            Err(ProfileError::MissingStation)
        ));
    }
}
