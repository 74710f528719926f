//! F-14 Tomcat.
//!
//! The RIO keys points into the CAP on the TAC DATA category. Each waypoint
//! kind has a dedicated CAP button; navigation waypoints use buttons 1-3.

use tracing::{info, warn};

use crate::channel::CommandChannel;
use crate::geo::{format_position, CoordinateFormat, FormattedCoords, Hemisphere, Position};
use crate::profile::{Waypoint, WaypointKind};
use crate::progress::ProgressController;

use super::{clamp_elevation, digits, Airframe, AirframeDriver, DriverResult, EntryPlan};

mod keys {
    pub const ENTER: &str = "RIO_CAP_ENTER";
    pub const CLEAR: &str = "RIO_CAP_CLEAR";
    pub const NORTH_EAST: &str = "RIO_CAP_NE";
    pub const SOUTH_WEST: &str = "RIO_CAP_SW";

    /// Category selector (the misspelling is the exported control id).
    pub const CATEGORY: &str = "RIO_CAP_CATRGORY";
    /// TAC DATA category position.
    pub const CATEGORY_TAC: u8 = 3;

    /// Digit keys double as function keys and carry both names.
    pub fn digit(d: char) -> String {
        let prefix = match d {
            '0' => "BRG_",
            '1' => "LAT_",
            '2' => "NBR_",
            '3' => "SPD_",
            '4' => "ALT_",
            '5' => "RNG_",
            '6' => "LONG_",
            '8' => "HDG_",
            _ => "",
        };
        format!("RIO_CAP_{}{}", prefix, d)
    }

    pub fn button(n: u32) -> String {
        format!("RIO_CAP_BTN_{}", n)
    }
}

pub(crate) fn coords(position: &Position) -> FormattedCoords {
    format_position(position, &CoordinateFormat::dms().with_one_digit_seconds(true))
}

/// CAP button that selects a point's storage slot.
fn slot_button(wp: &Waypoint) -> Option<u32> {
    match wp.kind {
        WaypointKind::Waypoint => Some(wp.number),
        WaypointKind::FixPoint => Some(4),
        WaypointKind::InitialPoint => Some(5),
        WaypointKind::HomeBase => Some(6),
        WaypointKind::DefendPoint => Some(7),
        WaypointKind::HostileArea => Some(8),
        WaypointKind::SurfaceTarget => Some(9),
        WaypointKind::Mission => None,
    }
}

/// Tomcat entry driver.
#[derive(Debug)]
pub struct TomcatDriver {
    channel: CommandChannel,
}

impl TomcatDriver {
    pub fn new(channel: CommandChannel) -> Self {
        Self { channel }
    }

    fn cap(&self, control: &str) -> DriverResult<()> {
        self.channel.press(control)?;
        Ok(())
    }

    fn hemisphere(&self, hemisphere: Hemisphere) -> DriverResult<()> {
        let key = if hemisphere.is_negative() {
            keys::SOUTH_WEST
        } else {
            keys::NORTH_EAST
        };
        let timing = self.channel.timing();
        self.channel.press_with_delay(key, timing.medium, timing.short)?;
        Ok(())
    }

    fn enter_number(&self, number: &str) -> DriverResult<()> {
        for d in digits(number) {
            self.cap(&keys::digit(d))?;
        }
        self.cap(keys::ENTER)
    }

    fn enter_coords(&self, position: &Position) -> DriverResult<()> {
        let coords = coords(position);
        info!(lat = %coords.latitude, lon = %coords.longitude, "Entering coords string");

        self.cap(&keys::digit('1'))?;
        self.hemisphere(coords.latitude_hemisphere)?;
        self.enter_number(&coords.latitude)?;

        self.cap(&keys::digit('6'))?;
        self.hemisphere(coords.longitude_hemisphere)?;
        self.enter_number(&coords.longitude)?;

        if let Some(feet) = position.elevation_entry() {
            self.cap(&keys::digit('3'))?;
            self.enter_number(&clamp_elevation(feet).to_string())?;
        }
        Ok(())
    }
}

impl AirframeDriver for TomcatDriver {
    fn airframe(&self) -> Airframe {
        Airframe::Tomcat
    }

    fn channel(&self) -> &CommandChannel {
        &self.channel
    }

    fn enter_plan(&self, plan: &EntryPlan, progress: &mut ProgressController) -> DriverResult<()> {
        self.channel.set_state(keys::CATEGORY, keys::CATEGORY_TAC)?;

        for wp in &plan.waypoints {
            progress.advance()?;

            let Some(button) = slot_button(wp) else {
                warn!(waypoint = %wp, "No CAP slot for waypoint, skipping");
                continue;
            };
            info!(waypoint = %wp, button, "Entering waypoint");

            self.cap(&keys::button(button))?;
            self.enter_coords(&wp.position)?;
            self.cap(keys::CLEAR)?;
        }
        Ok(())
    }
}
