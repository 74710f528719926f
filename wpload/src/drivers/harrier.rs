//! AV-8B Harrier.
//!
//! Waypoints are keyed through the UFC with ODU option selects for the
//! latitude, longitude, and elevation fields.

use tracing::info;

use crate::channel::CommandChannel;
use crate::geo::{format_position, CoordinateFormat, FormattedCoords, Position};
use crate::progress::ProgressController;

use super::{
    clamp_elevation, keypad_hemisphere, Airframe, AirframeDriver, DriverResult, EntryPlan,
};

mod keys {
    pub const UFC_ENTER: &str = "UFC_ENTER";

    pub fn ufc(digit: char) -> String {
        format!("UFC_B{}", digit)
    }

    pub fn odu(option: u8) -> String {
        format!("ODU_OPT{}", option)
    }

    pub fn left_mpcd(pb: u8) -> String {
        format!("MPCD_L_{}", pb)
    }
}

pub(crate) fn coords(position: &Position) -> FormattedCoords {
    format_position(position, &CoordinateFormat::dms().with_easting_zfill(3))
}

/// Harrier entry driver.
#[derive(Debug)]
pub struct HarrierDriver {
    channel: CommandChannel,
}

impl HarrierDriver {
    pub fn new(channel: CommandChannel) -> Self {
        Self { channel }
    }

    fn ufc(&self, digit: char) -> DriverResult<()> {
        self.channel.press(&keys::ufc(digit))?;
        Ok(())
    }

    fn ufc_hold(&self, control: &str) -> DriverResult<()> {
        let timing = self.channel.timing();
        self.channel
            .press_with_delay(control, timing.medium, timing.short)?;
        Ok(())
    }

    fn odu(&self, option: u8) -> DriverResult<()> {
        self.channel.press(&keys::odu(option))?;
        Ok(())
    }

    /// Whole part only; the UFC drops anything after the decimal point.
    fn enter_number(&self, number: &str) -> DriverResult<()> {
        for digit in number.chars().take_while(|c| *c != '.') {
            self.ufc(digit)?;
        }
        self.ufc_hold(keys::UFC_ENTER)
    }

    fn enter_coords(&self, position: &Position) -> DriverResult<()> {
        let coords = coords(position);
        info!(lat = %coords.latitude, lon = %coords.longitude, "Entering coords string");

        self.ufc_hold(&keys::ufc(keypad_hemisphere(coords.latitude_hemisphere)))?;
        self.enter_number(&coords.latitude)?;
        self.odu(2)?;

        self.ufc_hold(&keys::ufc(keypad_hemisphere(coords.longitude_hemisphere)))?;
        self.enter_number(&coords.longitude)?;
        self.odu(2)?;

        if let Some(feet) = position.elevation_entry() {
            self.odu(3)?;
            self.enter_number(&clamp_elevation(feet).to_string())?;
        }
        Ok(())
    }
}

impl AirframeDriver for HarrierDriver {
    fn airframe(&self) -> Airframe {
        Airframe::Harrier
    }

    fn channel(&self) -> &CommandChannel {
        &self.channel
    }

    fn enter_plan(&self, plan: &EntryPlan, progress: &mut ProgressController) -> DriverResult<()> {
        self.channel.press(&keys::left_mpcd(2))?;

        for wp in &plan.waypoints {
            progress.advance()?;
            info!(waypoint = %wp, "Entering waypoint");

            self.ufc('7')?;
            self.ufc('7')?;
            self.ufc_hold(keys::UFC_ENTER)?;
            self.odu(2)?;
            self.enter_coords(&wp.position)?;
            self.odu(1)?;
        }

        self.channel.press(&keys::left_mpcd(2))?;
        Ok(())
    }
}
