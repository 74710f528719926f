//! F/A-18C Hornet.
//!
//! Waypoints go in through the UFC on the AMPCD HSI data page, in decimal
//! minutes. Pre-planned (PP) missions go in through the left DDI stores page,
//! in degrees/minutes/seconds, station by station. Sequences are built on the
//! AMPCD SEQ page after all waypoints are stored.

use std::time::Duration;

use tracing::info;

use crate::channel::CommandChannel;
use crate::geo::{format_position, CoordinateFormat, FormattedCoords, Position};
use crate::progress::ProgressController;

use super::{
    clamp_elevation, keypad_hemisphere, Airframe, AirframeDriver, DriverResult, EntryPlan,
};
use crate::profile::Waypoint;

/// Control ids.
mod keys {
    pub const UFC_ENT: &str = "UFC_ENT";
    pub const UFC_CLR: &str = "UFC_CLR";
    pub const UFC_OS1: &str = "UFC_OS1";
    pub const UFC_OS3: &str = "UFC_OS3";
    pub const UFC_OS4: &str = "UFC_OS4";

    pub fn ufc(digit: char) -> String {
        format!("UFC_{}", digit)
    }

    pub fn left_ddi(pb: u32) -> String {
        format!("LEFT_DDI_PB_{:02}", pb)
    }

    pub fn ampcd(pb: u32) -> String {
        format!("AMPCD_PB_{:02}", pb)
    }
}

/// Stations are entered in this order; any other station follows, ascending.
const STATION_PRIORITY: [u8; 4] = [8, 2, 7, 3];

/// Pause after each coordinate axis while the UFC scratchpad updates.
const AXIS_PAUSE: Duration = Duration::from_millis(500);

/// Pause between the mission and waypoint passes.
const PHASE_PAUSE: Duration = Duration::from_secs(1);

pub(crate) fn waypoint_coords(position: &Position) -> FormattedCoords {
    format_position(position, &CoordinateFormat::decimal_minutes(4))
}

/// PP coordinates always carry a decimal point so the two-enter pattern
/// has a second field to key.
pub(crate) fn mission_coords(position: &Position) -> FormattedCoords {
    let mut coords = format_position(position, &CoordinateFormat::dms());
    for field in [&mut coords.latitude, &mut coords.longitude] {
        if !field.contains('.') {
            field.push_str(".0");
        }
    }
    coords
}

fn station_rank(station: u8) -> (usize, u8) {
    match STATION_PRIORITY.iter().position(|s| *s == station) {
        Some(rank) => (rank, 0),
        None => (STATION_PRIORITY.len(), station),
    }
}

/// Hornet entry driver.
#[derive(Debug)]
pub struct HornetDriver {
    channel: CommandChannel,
}

impl HornetDriver {
    pub fn new(channel: CommandChannel) -> Self {
        Self { channel }
    }

    fn press(&self, control: &str) -> DriverResult<()> {
        self.channel.press(control)?;
        Ok(())
    }

    fn ufc(&self, digit: char) -> DriverResult<()> {
        self.press(&keys::ufc(digit))
    }

    fn left_ddi(&self, pb: u32) -> DriverResult<()> {
        self.press(&keys::left_ddi(pb))
    }

    fn ampcd(&self, pb: u32) -> DriverResult<()> {
        self.press(&keys::ampcd(pb))
    }

    fn clear(&self, times: usize) -> DriverResult<()> {
        for _ in 0..times {
            self.press(keys::UFC_CLR)?;
        }
        Ok(())
    }

    fn hemisphere(&self, digit: char) -> DriverResult<()> {
        let timing = self.channel.timing();
        self.channel
            .press_with_delay(&keys::ufc(digit), timing.medium, timing.short)?;
        Ok(())
    }

    fn enter(&self) -> DriverResult<()> {
        let timing = self.channel.timing();
        self.channel
            .press_with_delay(keys::UFC_ENT, timing.long, timing.medium)?;
        Ok(())
    }

    /// Keys the digits before the decimal point and ENT. With `two_enters`,
    /// the digits after the point follow with a second ENT.
    fn enter_number(&self, number: &str, two_enters: bool) -> DriverResult<()> {
        let (whole, fraction) = match number.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (number, None),
        };

        for digit in whole.chars() {
            self.ufc(digit)?;
        }
        self.enter()?;

        if let (true, Some(fraction)) = (two_enters, fraction) {
            for digit in fraction.chars() {
                self.ufc(digit)?;
            }
            self.enter()?;
        }
        Ok(())
    }

    fn enter_waypoint_coords(&self, position: &Position) -> DriverResult<()> {
        let coords = waypoint_coords(position);
        info!(lat = %coords.latitude, lon = %coords.longitude, "Entering coords string (W)");

        self.hemisphere(keypad_hemisphere(coords.latitude_hemisphere))?;
        self.enter_number(&coords.latitude, true)?;
        self.channel.pause(AXIS_PAUSE);

        self.hemisphere(keypad_hemisphere(coords.longitude_hemisphere))?;
        self.enter_number(&coords.longitude, true)?;
        self.channel.pause(AXIS_PAUSE);

        if let Some(feet) = position.elevation_entry() {
            self.press(keys::UFC_OS3)?;
            self.press(keys::UFC_OS1)?;
            self.enter_number(&clamp_elevation(feet).to_string(), false)?;
        }
        Ok(())
    }

    fn enter_mission_coords(&self, position: &Position) -> DriverResult<()> {
        let coords = mission_coords(position);
        info!(lat = %coords.latitude, lon = %coords.longitude, "Entering coords string (M)");

        self.press(keys::UFC_OS1)?;
        self.hemisphere(keypad_hemisphere(coords.latitude_hemisphere))?;
        self.enter_number(&coords.latitude, true)?;

        self.press(keys::UFC_OS3)?;
        self.hemisphere(keypad_hemisphere(coords.longitude_hemisphere))?;
        self.enter_number(&coords.longitude, true)?;

        self.left_ddi(14)?;
        self.left_ddi(14)?;

        if position.elevation_entry().is_some() {
            let meters = position.elevation_meters().unwrap_or(0).max(0);
            self.press(keys::UFC_OS4)?;
            self.press(keys::UFC_OS4)?;
            self.enter_number(&meters.to_string(), false)?;
        }
        Ok(())
    }

    fn enter_mission(&self, mission: &Waypoint, n: u32) -> DriverResult<()> {
        info!(station = mission.station, number = n, name = %mission.name, "Entering PP mission");

        if n > 1 {
            self.left_ddi(n + 5)?;
        }
        self.left_ddi(14)?;
        self.press(keys::UFC_OS3)?;

        self.enter_mission_coords(&mission.position)?;
        self.clear(2)
    }

    fn enter_missions(&self, plan: &EntryPlan, progress: &mut ProgressController) -> DriverResult<()> {
        if plan.missions.is_empty() {
            return Ok(());
        }

        let mut stations: Vec<_> = plan.stations().into_iter().collect();
        stations.sort_by_key(|(station, _)| station_rank(*station));

        self.left_ddi(19)?;
        self.left_ddi(4)?;

        for (_, missions) in stations {
            for (n, mission) in (1..).zip(missions) {
                progress.advance()?;
                self.enter_mission(mission, n)?;
            }
            self.left_ddi(13)?;
        }
        Ok(())
    }

    fn enter_waypoints(&self, plan: &EntryPlan, progress: &mut ProgressController) -> DriverResult<()> {
        if plan.waypoints.is_empty() {
            return Ok(());
        }

        self.ampcd(10)?;
        self.ampcd(19)?;
        self.clear(2)?;

        for (i, wp) in plan.waypoints.iter().enumerate() {
            progress.advance()?;
            info!(number = i + 1, name = %wp.name, "Entering waypoint");

            self.ampcd(12)?;
            self.ampcd(5)?;
            self.press(keys::UFC_OS1)?;
            self.enter_waypoint_coords(&wp.position)?;
            self.clear(1)?;
        }

        for (sequence, slots) in &plan.sequences {
            // Sequence 1 starts from waypoint 0.
            let mut entries: Vec<usize> = Vec::with_capacity(slots.len() + 1);
            if *sequence == 1 {
                entries.push(0);
            } else {
                self.ampcd(15)?;
                self.ampcd(15)?;
            }
            entries.extend(slots);

            self.ampcd(1)?;
            for slot in entries {
                progress.checkpoint()?;
                self.press(keys::UFC_OS4)?;
                self.enter_number(&slot.to_string(), false)?;
            }
        }

        self.clear(3)?;
        self.ampcd(19)?;
        self.ampcd(10)?;
        Ok(())
    }
}

impl AirframeDriver for HornetDriver {
    fn airframe(&self) -> Airframe {
        Airframe::Hornet
    }

    fn channel(&self) -> &CommandChannel {
        &self.channel
    }

    fn enter_plan(&self, plan: &EntryPlan, progress: &mut ProgressController) -> DriverResult<()> {
        self.enter_missions(plan, progress)?;
        progress.checkpoint()?;
        self.channel.pause(PHASE_PAUSE);
        self.enter_waypoints(plan, progress)
    }
}
