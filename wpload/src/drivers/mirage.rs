//! M-2000C Mirage.
//!
//! Waypoints are keyed on the INS PCN panel in decimal minutes, two digits of
//! minute fraction. The Mirage stores no waypoint elevation.

use tracing::info;

use crate::channel::CommandChannel;
use crate::geo::{format_position, CoordinateFormat, FormattedCoords, Position};
use crate::progress::ProgressController;

use super::{digits, keypad_hemisphere, Airframe, AirframeDriver, DriverResult, EntryPlan};

mod keys {
    pub const ENTER: &str = "INS_ENTER_BTN";
    pub const PREP: &str = "INS_PREP_SW";

    pub fn pcn(digit: char) -> String {
        format!("INS_BTN_{}", digit)
    }
}

/// Minute fraction digits the PCN accepts.
const FRACTION_DIGITS: usize = 2;

pub(crate) fn coords(position: &Position) -> FormattedCoords {
    let mut coords = format_position(
        position,
        &CoordinateFormat::decimal_minutes(4).with_easting_zfill(3),
    );
    for field in [&mut coords.latitude, &mut coords.longitude] {
        let keep = field.len().saturating_sub(4 - FRACTION_DIGITS);
        field.truncate(keep);
    }
    coords
}

/// Mirage entry driver.
#[derive(Debug)]
pub struct MirageDriver {
    channel: CommandChannel,
}

impl MirageDriver {
    pub fn new(channel: CommandChannel) -> Self {
        Self { channel }
    }

    fn pcn(&self, digit: char) -> DriverResult<()> {
        self.channel.press(&keys::pcn(digit))?;
        Ok(())
    }

    fn pcn_hold(&self, digit: char) -> DriverResult<()> {
        let timing = self.channel.timing();
        self.channel
            .press_with_delay(&keys::pcn(digit), timing.medium, timing.short)?;
        Ok(())
    }

    fn enter_number(&self, number: &str) -> DriverResult<()> {
        for digit in digits(number) {
            self.pcn(digit)?;
        }
        self.channel.press(keys::ENTER)?;
        Ok(())
    }

    fn enter_coords(&self, position: &Position) -> DriverResult<()> {
        let coords = coords(position);
        info!(lat = %coords.latitude, lon = %coords.longitude, "Entering coords string");

        self.pcn('1')?;
        self.pcn_hold(keypad_hemisphere(coords.latitude_hemisphere))?;
        self.enter_number(&coords.latitude)?;

        self.pcn('3')?;
        self.pcn_hold(keypad_hemisphere(coords.longitude_hemisphere))?;
        self.enter_number(&coords.longitude)
    }
}

impl AirframeDriver for MirageDriver {
    fn airframe(&self) -> Airframe {
        Airframe::Mirage
    }

    fn channel(&self) -> &CommandChannel {
        &self.channel
    }

    fn enter_plan(&self, plan: &EntryPlan, progress: &mut ProgressController) -> DriverResult<()> {
        for (slot, wp) in (1u32..).zip(&plan.waypoints) {
            progress.advance()?;
            info!(slot, waypoint = %wp, "Entering waypoint");

            self.channel.press(keys::PREP)?;
            self.pcn('0')?;
            for digit in slot.to_string().chars() {
                self.pcn(digit)?;
            }
            self.enter_coords(&wp.position)?;
            self.channel.press(keys::ENTER)?;
        }
        Ok(())
    }
}
