//! JSON profile interchange.
//!
//! ```text
//! {
//!   "name": "Nellis CAS",
//!   "aircraft": "hornet",
//!   "av_setup_name": null,
//!   "av_setup": { "tacan_yard": "41,X,W" },
//!   "waypoints": [
//!     { "latitude": 36.2, "longitude": -115.0, "elevation": 1870,
//!       "name": "Nellis", "sequence": 1, "wp_type": "WP", "station": 0 }
//!   ]
//! }
//! ```
//!
//! Documents are only ever read here. Every record is validated before the
//! profile is built, so a bad coordinate fails the whole load instead of
//! surfacing half-way through an entry.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::geo::Position;

use super::{AvionicsSetup, Profile, ProfileError, Waypoint, WaypointKind};

/// Raw profile document as found on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_aircraft")]
    pub aircraft: String,
    #[serde(default)]
    pub av_setup_name: Option<String>,
    #[serde(default)]
    pub av_setup: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub waypoints: Vec<WaypointRecord>,
}

/// One waypoint entry of a [`ProfileDocument`].
#[derive(Debug, Clone, Deserialize)]
pub struct WaypointRecord {
    pub latitude: f64,
    pub longitude: f64,
    /// Feet. Fractional values are rounded to the nearest foot.
    #[serde(default)]
    pub elevation: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sequence: Option<u32>,
    #[serde(default = "default_kind")]
    pub wp_type: String,
    #[serde(default)]
    pub station: Option<u8>,
}

fn default_aircraft() -> String {
    "viper".to_string()
}

fn default_kind() -> String {
    "WP".to_string()
}

impl WaypointRecord {
    fn into_waypoint(self, index: usize) -> Result<Waypoint, ProfileError> {
        let mut position = Position::new(self.latitude, self.longitude)
            .map_err(|source| ProfileError::Position { index, source })?;
        if let Some(feet) = self.elevation {
            position = position.with_elevation(whole_feet(feet, index)?);
        }

        let kind: WaypointKind = self.wp_type.parse()?;
        let waypoint = if kind == WaypointKind::Mission {
            Waypoint::mission(self.station.unwrap_or(0), position)?
        } else {
            Waypoint::new(kind, position).with_sequence(self.sequence.unwrap_or(0))
        };

        Ok(waypoint.with_name(self.name.unwrap_or_default()))
    }
}

fn whole_feet(value: f64, index: usize) -> Result<i32, ProfileError> {
    let rounded = value.round();
    if rounded.is_finite() && (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&rounded) {
        Ok(rounded as i32)
    } else {
        Err(ProfileError::Elevation { index, value })
    }
}

impl ProfileDocument {
    /// Validates the document and builds a [`Profile`].
    pub fn into_profile(self) -> Result<Profile, ProfileError> {
        let points = self
            .waypoints
            .into_iter()
            .enumerate()
            .map(|(i, record)| record.into_waypoint(i))
            .collect::<Result<Vec<_>, _>>()?;

        let mut profile = Profile::with_points(self.name, self.aircraft, points)?;

        if !self.av_setup.is_empty() {
            let values: BTreeMap<String, String> = self
                .av_setup
                .into_iter()
                .filter_map(|(key, value)| match value {
                    serde_json::Value::Null => None,
                    serde_json::Value::String(s) => Some((key, s)),
                    other => Some((key, other.to_string())),
                })
                .collect();
            let setup = AvionicsSetup::from_map(&values)?;
            let setup_name = self
                .av_setup_name
                .unwrap_or_else(|| format!("{} avionics", profile.name()));
            profile.set_avionics(setup_name, setup);
        } else if let Some(name) = self.av_setup_name {
            debug!(setup = %name, "Avionics setup named but no values supplied, ignoring");
        }

        Ok(profile)
    }
}

impl Profile {
    /// Parses a profile from its JSON representation.
    pub fn from_json(text: &str) -> Result<Self, ProfileError> {
        serde_json::from_str::<ProfileDocument>(text)?.into_profile()
    }

    /// Parses a profile from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ProfileError> {
        serde_json::from_reader::<_, ProfileDocument>(reader)?.into_profile()
    }

    /// Loads a profile from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
