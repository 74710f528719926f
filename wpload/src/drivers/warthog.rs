//! A-10C Warthog.
//!
//! Waypoints are created on the CDU WAYPOINT page: name, then latitude and
//! longitude in decimal minutes, then elevation.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use crate::channel::CommandChannel;
use crate::geo::{format_position, CoordinateFormat, FormattedCoords, Position};
use crate::profile::Waypoint;
use crate::progress::ProgressController;

use super::{clamp_elevation, digits, Airframe, AirframeDriver, DriverResult, EntryPlan};

mod keys {
    pub const CLR: &str = "CDU_CLR";
    pub const WP: &str = "CDU_WP";
    pub const LSK_3L: &str = "CDU_LSK_3L";
    pub const LSK_3R: &str = "CDU_LSK_3R";
    pub const LSK_5L: &str = "CDU_LSK_5L";
    pub const LSK_7L: &str = "CDU_LSK_7L";
    pub const LSK_7R: &str = "CDU_LSK_7R";
    pub const LSK_9L: &str = "CDU_LSK_9L";

    pub fn key(c: char) -> String {
        format!("CDU_{}", c)
    }
}

pub(crate) fn coords(position: &Position) -> FormattedCoords {
    format_position(
        position,
        &CoordinateFormat::decimal_minutes(3).with_easting_zfill(3),
    )
}

fn name_filter() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-9]").expect("name filter pattern is valid"))
}

/// Name the CDU accepts: alphanumerics only, `WP<n>` when nothing is left.
pub(crate) fn cdu_name(wp: &Waypoint) -> String {
    let cleaned = name_filter().replace_all(&wp.name, "");
    if cleaned.is_empty() {
        format!("WP{}", wp.number)
    } else {
        cleaned.to_uppercase()
    }
}

/// Warthog entry driver.
#[derive(Debug)]
pub struct WarthogDriver {
    channel: CommandChannel,
}

impl WarthogDriver {
    pub fn new(channel: CommandChannel) -> Self {
        Self { channel }
    }

    fn cdu(&self, control: &str) -> DriverResult<()> {
        self.channel.press(control)?;
        Ok(())
    }

    fn clear_input(&self, times: usize) -> DriverResult<()> {
        for _ in 0..times {
            self.cdu(keys::CLR)?;
        }
        Ok(())
    }

    fn enter_number(&self, number: &str) -> DriverResult<()> {
        for d in digits(number) {
            self.cdu(&keys::key(d))?;
        }
        Ok(())
    }

    fn enter_name(&self, wp: &Waypoint) -> DriverResult<()> {
        let name = cdu_name(wp);
        debug!(name = %name, "Waypoint name");

        self.clear_input(3)?;
        for c in name.chars() {
            self.cdu(&keys::key(c))?;
        }
        self.cdu(keys::LSK_3R)
    }

    fn enter_coords(&self, position: &Position) -> DriverResult<()> {
        let coords = coords(position);
        info!(lat = %coords.latitude, lon = %coords.longitude, "Entering coords string");

        self.clear_input(2)?;
        self.cdu(&keys::key(coords.latitude_hemisphere.letter()))?;
        self.enter_number(&coords.latitude)?;
        self.cdu(keys::LSK_7L)?;
        self.clear_input(2)?;

        self.cdu(&keys::key(coords.longitude_hemisphere.letter()))?;
        self.enter_number(&coords.longitude)?;
        self.cdu(keys::LSK_9L)?;
        self.clear_input(2)
    }

    fn enter_elevation(&self, feet: i32) -> DriverResult<()> {
        self.clear_input(2)?;
        self.enter_number(&clamp_elevation(feet).to_string())?;
        self.cdu(keys::LSK_5L)?;
        self.clear_input(2)
    }
}

impl AirframeDriver for WarthogDriver {
    fn airframe(&self) -> Airframe {
        Airframe::Warthog
    }

    fn channel(&self) -> &CommandChannel {
        &self.channel
    }

    fn enter_plan(&self, plan: &EntryPlan, progress: &mut ProgressController) -> DriverResult<()> {
        let timing = self.channel.timing();
        self.channel.press_settle(keys::WP, timing.short)?;
        self.channel.press_settle(keys::LSK_3L, timing.medium)?;
        debug!(count = plan.waypoints.len(), "Number of waypoints");

        for wp in &plan.waypoints {
            progress.advance()?;
            info!(waypoint = %wp, "Entering waypoint");

            self.channel.press_settle(keys::LSK_7R, timing.short)?;
            self.enter_name(wp)?;
            self.enter_coords(&wp.position)?;

            match wp.position.elevation_entry() {
                Some(feet) => self.enter_elevation(feet)?,
                None => debug!("Not entering elevation, CDU defaults to ground level"),
            }
        }
        Ok(())
    }
}
