//! Per-airframe entry state machines.
//!
//! Every driver walks the same outer sequence, implemented once by
//! [`AirframeDriver::enter_all`]:
//!
//! ```text
//!   Profile ──▶ EntryPlan::build ──▶ estimate_steps ──▶ size_for
//!                (validate + sort)                         │
//!                                                          ▼
//!   EntryOutcome ◀── finish ◀── enter_plan (airframe specific, advance per item)
//! ```
//!
//! `enter_plan` is the only piece an airframe provides. It navigates cockpit
//! pages through the driver's [`CommandChannel`], calls
//! [`ProgressController::advance`] once per waypoint, mission, or avionics
//! item, and returns on the first transport error or cancellation. Errors are
//! logged and folded into an [`EntryOutcome`]; they never escape `enter_all`.

mod error;
mod harrier;
mod hornet;
mod mirage;
mod tomcat;
mod viper;
mod warthog;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use tracing::{error, info, warn};

use crate::channel::CommandChannel;
use crate::geo::{FormattedCoords, Hemisphere, Position};
use crate::limits::{validate_all, AirframeLimits, Limit};
use crate::profile::{sequence_slots, AvionicsSetup, Profile, Waypoint, WaypointKind};
use crate::progress::ProgressController;

pub use error::{DriverError, DriverResult};
pub use harrier::HarrierDriver;
pub use hornet::HornetDriver;
pub use mirage::MirageDriver;
pub use tomcat::TomcatDriver;
pub use viper::ViperDriver;
pub use warthog::WarthogDriver;

// =============================================================================
// Airframe
// =============================================================================

/// Supported airframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Airframe {
    Hornet,
    Harrier,
    Mirage,
    Tomcat,
    Warthog,
    Viper,
}

impl Airframe {
    /// Every supported airframe.
    pub const ALL: [Airframe; 6] = [
        Airframe::Hornet,
        Airframe::Harrier,
        Airframe::Mirage,
        Airframe::Tomcat,
        Airframe::Warthog,
        Airframe::Viper,
    ];

    /// Identifier used in profiles and preferences.
    pub fn id(self) -> &'static str {
        match self {
            Airframe::Hornet => "hornet",
            Airframe::Harrier => "harrier",
            Airframe::Mirage => "mirage",
            Airframe::Tomcat => "tomcat",
            Airframe::Warthog => "warthog",
            Airframe::Viper => "viper",
        }
    }

    /// Human-readable aircraft name.
    pub fn display_name(self) -> &'static str {
        match self {
            Airframe::Hornet => "F/A-18C Hornet",
            Airframe::Harrier => "AV-8B Harrier",
            Airframe::Mirage => "M-2000C",
            Airframe::Tomcat => "F-14 Tomcat",
            Airframe::Warthog => "A-10C Warthog",
            Airframe::Viper => "F-16C Viper",
        }
    }

    /// How many points of each kind the airframe stores.
    pub fn limits(self) -> AirframeLimits {
        let limits = AirframeLimits::new();
        match self {
            Airframe::Hornet => limits
                .with(WaypointKind::Waypoint, Limit::Unbounded)
                .with(WaypointKind::Mission, Limit::Max(6)),
            Airframe::Harrier => limits.with(WaypointKind::Waypoint, Limit::Unbounded),
            Airframe::Mirage => limits.with(WaypointKind::Waypoint, Limit::Max(9)),
            Airframe::Tomcat => limits
                .with(WaypointKind::Waypoint, Limit::Max(3))
                .with(WaypointKind::FixPoint, Limit::Max(1))
                .with(WaypointKind::InitialPoint, Limit::Max(1))
                .with(WaypointKind::SurfaceTarget, Limit::Max(1))
                .with(WaypointKind::HostileArea, Limit::Max(1))
                .with(WaypointKind::DefendPoint, Limit::Max(1))
                .with(WaypointKind::HomeBase, Limit::Max(1)),
            Airframe::Warthog => limits.with(WaypointKind::Waypoint, Limit::Max(99)),
            Airframe::Viper => limits.with(WaypointKind::Waypoint, Limit::Max(127)),
        }
    }

    /// Builds this airframe's driver over an open channel.
    pub fn driver(self, channel: CommandChannel) -> Box<dyn AirframeDriver> {
        match self {
            Airframe::Hornet => Box::new(HornetDriver::new(channel)),
            Airframe::Harrier => Box::new(HarrierDriver::new(channel)),
            Airframe::Mirage => Box::new(MirageDriver::new(channel)),
            Airframe::Tomcat => Box::new(TomcatDriver::new(channel)),
            Airframe::Warthog => Box::new(WarthogDriver::new(channel)),
            Airframe::Viper => Box::new(ViperDriver::new(channel)),
        }
    }

    /// The digit strings this airframe would key in for a position, labelled
    /// by entry page.
    pub fn preview(self, position: &Position) -> Vec<(&'static str, FormattedCoords)> {
        match self {
            Airframe::Hornet => vec![
                ("waypoint", hornet::waypoint_coords(position)),
                ("pp mission", hornet::mission_coords(position)),
            ],
            Airframe::Harrier => vec![("waypoint", harrier::coords(position))],
            Airframe::Mirage => vec![("waypoint", mirage::coords(position))],
            Airframe::Tomcat => vec![("waypoint", tomcat::coords(position))],
            Airframe::Warthog => vec![("waypoint", warthog::coords(position))],
            Airframe::Viper => vec![("steerpoint", viper::coords(position))],
        }
    }
}

impl FromStr for Airframe {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Airframe::ALL
            .iter()
            .copied()
            .find(|a| a.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DriverError::UndefinedDriver(s.to_string()))
    }
}

impl fmt::Display for Airframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

// =============================================================================
// Entry plan and outcome
// =============================================================================

/// How an entry ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Completed,
    Cancelled,
    /// Aborted by an error; carries its description.
    Failed(String),
}

/// Everything a driver keys in, already filtered to the airframe's limits.
#[derive(Debug, Clone, Default)]
pub struct EntryPlan {
    /// Non-mission points that fit, ordered by kind tag.
    pub waypoints: Vec<Waypoint>,
    /// Mission points that fit, in profile order.
    pub missions: Vec<Waypoint>,
    /// Sequence id to 1-based slots in `waypoints`.
    pub sequences: BTreeMap<u32, Vec<usize>>,
    pub avionics: Option<AvionicsSetup>,
}

impl EntryPlan {
    /// Validates a profile against an airframe's limits.
    ///
    /// Sequence slots refer to positions in the validated waypoint list,
    /// which is the order the device stores them in.
    pub fn build(profile: &Profile, limits: &AirframeLimits) -> Self {
        let waypoints = validate_all(profile.waypoints(), limits);
        let missions = validate_all(profile.missions(), limits);

        let sequences = sequence_slots(&waypoints);

        Self {
            waypoints,
            missions,
            sequences,
            avionics: profile.avionics().cloned(),
        }
    }

    /// Missions grouped by station, each group in profile order.
    pub fn stations(&self) -> BTreeMap<u8, Vec<&Waypoint>> {
        let mut stations: BTreeMap<u8, Vec<&Waypoint>> = BTreeMap::new();
        for msn in &self.missions {
            stations.entry(msn.station).or_default().push(msn);
        }
        stations
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
            && self.missions.is_empty()
            && self.avionics.as_ref().map_or(true, AvionicsSetup::is_empty)
    }
}

// =============================================================================
// Driver trait
// =============================================================================

/// A cockpit entry state machine for one airframe.
pub trait AirframeDriver: Send {
    /// Airframe this driver keys data into.
    fn airframe(&self) -> Airframe;

    /// The channel presses go through.
    fn channel(&self) -> &CommandChannel;

    /// Storage limits applied before entry.
    fn limits(&self) -> AirframeLimits {
        self.airframe().limits()
    }

    /// Avionics items this airframe keys in. Airframes without avionics
    /// pages consume none.
    fn avionics_steps(&self, _setup: &AvionicsSetup) -> usize {
        0
    }

    /// Number of `advance` calls `enter_plan` will make.
    fn estimate_steps(&self, plan: &EntryPlan) -> usize {
        plan.waypoints.len()
            + plan.missions.len()
            + plan
                .avionics
                .as_ref()
                .map_or(0, |setup| self.avionics_steps(setup))
    }

    /// Keys in a validated plan.
    fn enter_plan(&self, plan: &EntryPlan, progress: &mut ProgressController) -> DriverResult<()>;

    /// Runs a complete entry and reports how it ended.
    ///
    /// Always finishes `progress`, so the caller sees `Percent(100)` and
    /// `Done` exactly once whatever the outcome.
    fn enter_all(&self, profile: &Profile, progress: &mut ProgressController) -> EntryOutcome {
        let airframe = self.airframe();
        if !profile.aircraft().eq_ignore_ascii_case(airframe.id()) {
            warn!(
                profile = profile.name(),
                profile_aircraft = profile.aircraft(),
                airframe = %airframe,
                "Profile was built for a different airframe"
            );
        }

        let plan = EntryPlan::build(profile, &self.limits());
        let steps = self.estimate_steps(&plan);
        progress.size_for(steps);

        info!(
            airframe = %airframe,
            profile = profile.name(),
            waypoints = plan.waypoints.len(),
            missions = plan.missions.len(),
            steps,
            "Starting entry"
        );

        let result = self.enter_plan(&plan, progress);
        progress.finish();

        match result {
            Ok(()) => {
                info!(airframe = %airframe, "Entry complete");
                EntryOutcome::Completed
            }
            Err(DriverError::Cancelled) => {
                warn!(airframe = %airframe, "Entry cancelled");
                EntryOutcome::Cancelled
            }
            Err(e) => {
                error!(airframe = %airframe, error = %e, "Entry failed");
                EntryOutcome::Failed(e.to_string())
            }
        }
    }
}

/// Keypad digit for a hemisphere on phone-style keypads (2 N, 8 S, 6 E, 4 W).
pub(crate) fn keypad_hemisphere(hemisphere: Hemisphere) -> char {
    match hemisphere {
        Hemisphere::North => '2',
        Hemisphere::South => '8',
        Hemisphere::East => '6',
        Hemisphere::West => '4',
    }
}

/// Digits of `text`, skipping everything else.
pub(crate) fn digits(text: &str) -> impl Iterator<Item = char> + '_ {
    text.chars().filter(char::is_ascii_digit)
}

/// Non-negative whole feet; devices have no minus key.
pub(crate) fn clamp_elevation(feet: i32) -> u32 {
    feet.max(0) as u32
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::channel::{InstantSleeper, PressTiming, RecordingTransport};
    use crate::geo::Position;

    /// Channel over recording doubles plus handles to inspect them.
    pub(crate) fn recording_channel() -> (CommandChannel, RecordingTransport, InstantSleeper) {
        let transport = RecordingTransport::new();
        let sleeper = InstantSleeper::new();
        let channel = CommandChannel::new(
            transport.clone(),
            sleeper.clone(),
            PressTiming::default(),
        );
        (channel, transport, sleeper)
    }

    pub(crate) fn position(lat: f64, lon: f64) -> Position {
        Position::new(lat, lon).unwrap()
    }

    #[test]
    fn test_airframe_lookup() {
        assert_eq!("Viper".parse::<Airframe>().unwrap(), Airframe::Viper);
        assert!(matches!(
            "spitfire".parse::<Airframe>(),
            Err(DriverError::UndefinedDriver(name)) if name == "spitfire"
        ));
    }

    #[test]
    fn test_driver_reports_its_airframe() {
        for airframe in Airframe::ALL {
            let (channel, _, _) = recording_channel();
            assert_eq!(airframe.driver(channel).airframe(), airframe);
        }
    }

    #[test]
    fn test_plan_sequences_follow_validated_order() {
        let profile = Profile::with_points(
            "p",
            "hornet",
            vec![
                Waypoint::navigation(position(1.0, 1.0)),
                Waypoint::new(WaypointKind::FixPoint, position(2.0, 2.0)),
                Waypoint::navigation(position(3.0, 3.0)).with_sequence(1),
            ],
        )
        .unwrap();

        let plan = EntryPlan::build(&profile, &Airframe::Hornet.limits());

        // FP is dropped on the Hornet, so the sequenced waypoint is slot 2.
        assert_eq!(plan.waypoints.len(), 2);
        assert_eq!(plan.sequences.get(&1), Some(&vec![2]));
    }

    #[test]
    fn test_enter_all_empty_profile_completes() {
        let (channel, transport, _) = recording_channel();
        let driver = Airframe::Warthog.driver(channel);
        let mut progress = ProgressController::detached();

        let outcome = driver.enter_all(&Profile::new("empty", "warthog"), &mut progress);

        assert_eq!(outcome, EntryOutcome::Completed);
        assert!(progress.is_finished());
        // Only the page navigation is sent.
        assert_eq!(transport.presses(), vec!["CDU_WP", "CDU_LSK_3L"]);
    }

    #[test]
    fn test_clamp_elevation() {
        assert_eq!(clamp_elevation(-20), 0);
        assert_eq!(clamp_elevation(1500), 1500);
    }
}
