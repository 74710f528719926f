//! F-16C Viper.
//!
//! Steerpoints are keyed through the ICP into the DED STPT page, followed by
//! the avionics presets: air-to-air TACAN yardstick, MFD format assignments
//! per master mode, and CMDS chaff/flare programs.
//!
//! The DED is navigated with the spring-loaded DCS (dobber) and DED
//! switches, which are flipped to a position and released back to center.

use std::time::Duration;

use tracing::info;

use crate::channel::CommandChannel;
use crate::geo::{format_position, CoordinateFormat, FormattedCoords, Position};
use crate::profile::{
    AvionicsSetup, DispenserProgram, MasterMode, MfdFormats, TacanBand, TacanYardstick,
};
use crate::progress::ProgressController;

use super::{digits, keypad_hemisphere, Airframe, AirframeDriver, DriverResult, EntryPlan};

mod keys {
    pub const ENTR: &str = "ICP_ENTR_BTN";
    pub const AA_MODE: &str = "ICP_AA_MODE_BTN";
    pub const AG_MODE: &str = "ICP_AG_MODE_BTN";
    pub const LIST: &str = "ICP_LIST_BTN";
    pub const EHSI_MODE: &str = "EHSI_MODE";

    pub const DED_SW: &str = "ICP_DED_SW";
    pub const DATA_UP_DN_SW: &str = "ICP_DATA_UP_DN_SW";
    pub const DATA_RTN_SEQ_SW: &str = "ICP_DATA_RTN_SEQ_SW";
    /// Throttle dogfight switch: 2 dogfight, 1 center.
    pub const DGFT_SW: &str = "HOTAS_DGFT_SW";
    pub const DGFT_ON: u8 = 2;
    pub const DGFT_CENTER: u8 = 1;

    /// Center position of the spring-loaded ICP switches.
    pub const SWITCH_REST: u8 = 1;

    pub fn icp(digit: char) -> String {
        format!("ICP_BTN_{}", digit)
    }

    pub fn mfd(side: char, osb: u8) -> String {
        format!("MFD_{}_{}", side, osb)
    }
}

/// DED navigation directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dobber {
    Up,
    Down,
    Return,
    Sequence,
}

impl Dobber {
    fn control(self) -> (&'static str, u8) {
        match self {
            Dobber::Up => (keys::DATA_UP_DN_SW, 2),
            Dobber::Down => (keys::DATA_UP_DN_SW, 0),
            Dobber::Return => (keys::DATA_RTN_SEQ_SW, 0),
            Dobber::Sequence => (keys::DATA_RTN_SEQ_SW, 2),
        }
    }
}

/// ICP key that selects the T-ILS page.
const TILS_KEY: char = '1';
/// ICP key that selects the STPT page.
const STPT_KEY: char = '4';
/// ICP key that selects CMDS from the LIST page.
const CMDS_KEY: char = '7';

const PAGE_SETTLE: Duration = Duration::from_secs(1);
const TILS_SETTLE: Duration = Duration::from_millis(250);
const FIELD_SETTLE: Duration = Duration::from_millis(100);

pub(crate) fn coords(position: &Position) -> FormattedCoords {
    format_position(
        position,
        &CoordinateFormat::decimal_minutes(3).with_easting_zfill(3),
    )
}

/// Viper entry driver.
#[derive(Debug)]
pub struct ViperDriver {
    channel: CommandChannel,
}

impl ViperDriver {
    pub fn new(channel: CommandChannel) -> Self {
        Self { channel }
    }

    fn press(&self, control: &str) -> DriverResult<()> {
        self.channel.press(control)?;
        Ok(())
    }

    fn press_settle(&self, control: &str, settle: Duration) -> DriverResult<()> {
        self.channel.press_settle(control, settle)?;
        Ok(())
    }

    fn icp(&self, digit: char) -> DriverResult<()> {
        self.press(&keys::icp(digit))
    }

    fn entr(&self) -> DriverResult<()> {
        self.press(keys::ENTR)
    }

    fn enter_number(&self, number: &str) -> DriverResult<()> {
        for d in digits(number) {
            self.icp(d)?;
        }
        Ok(())
    }

    fn dobber(&self, direction: Dobber) -> DriverResult<()> {
        self.dobber_settle(direction, self.channel.timing().short)
    }

    fn dobber_settle(&self, direction: Dobber, settle: Duration) -> DriverResult<()> {
        let (control, position) = direction.control();
        let hold = self.channel.timing().short;
        self.channel
            .flip(control, position, keys::SWITCH_REST, hold, settle)?;
        Ok(())
    }

    fn ded(&self, up: bool) -> DriverResult<()> {
        let timing = self.channel.timing();
        let position = if up { 2 } else { 0 };
        self.channel.flip(
            keys::DED_SW,
            position,
            keys::SWITCH_REST,
            timing.short,
            timing.short,
        )?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Steerpoints
    // -------------------------------------------------------------------------

    fn enter_coords(&self, position: &Position) -> DriverResult<()> {
        let coords = coords(position);
        info!(lat = %coords.latitude, lon = %coords.longitude, "Entering coords string");

        self.icp(keypad_hemisphere(coords.latitude_hemisphere))?;
        self.enter_number(&coords.latitude)?;
        self.entr()?;
        self.dobber(Dobber::Down)?;

        self.icp(keypad_hemisphere(coords.longitude_hemisphere))?;
        self.enter_number(&coords.longitude)?;
        self.entr()?;
        self.dobber(Dobber::Down)
    }

    /// The ICP "0" key doubles as the minus sign.
    fn enter_elevation(&self, feet: i32) -> DriverResult<()> {
        if feet < 0 {
            self.icp('0')?;
        }
        self.enter_number(&feet.unsigned_abs().to_string())?;
        self.entr()
    }

    fn enter_waypoints(&self, plan: &EntryPlan, progress: &mut ProgressController) -> DriverResult<()> {
        if plan.waypoints.is_empty() {
            return Ok(());
        }

        self.dobber(Dobber::Return)?;
        self.press_settle(&keys::icp(STPT_KEY), PAGE_SETTLE)?;
        self.dobber_settle(Dobber::Down, PAGE_SETTLE)?;

        for wp in &plan.waypoints {
            progress.advance()?;
            info!(waypoint = %wp, "Entering steerpoint");

            self.enter_coords(&wp.position)?;
            if let Some(feet) = wp.position.elevation_entry() {
                self.enter_elevation(feet)?;
            }

            self.dobber(Dobber::Up)?;
            self.dobber(Dobber::Up)?;
            self.ded(true)?;
        }

        self.ded(false)?;
        self.dobber(Dobber::Return)
    }

    // -------------------------------------------------------------------------
    // Avionics
    // -------------------------------------------------------------------------

    fn enter_tacan(&self, yardstick: &TacanYardstick, progress: &mut ProgressController) -> DriverResult<()> {
        progress.advance()?;
        self.dobber(Dobber::Return)?;

        let channel = yardstick.entry_channel();
        info!(channel, band = ?yardstick.band, role = ?yardstick.role, "Entering TACAN yardstick");

        self.press_settle(&keys::icp(TILS_KEY), TILS_SETTLE)?;
        if yardstick.band == TacanBand::Y {
            self.icp('0')?;
            self.entr()?;
        }
        self.dobber(Dobber::Down)?;

        self.enter_number(&channel.to_string())?;
        self.press_settle(keys::ENTR, FIELD_SETTLE)?;
        // REC -> T/R -> A/A TR
        self.dobber_settle(Dobber::Sequence, FIELD_SETTLE)?;
        self.dobber_settle(Dobber::Sequence, FIELD_SETTLE)?;
        self.dobber_settle(Dobber::Return, FIELD_SETTLE)?;

        self.press(keys::EHSI_MODE)?;
        self.press(keys::EHSI_MODE)?;

        self.dobber(Dobber::Return)
    }

    fn select_master_mode(&self, mode: MasterMode, entering: bool) -> DriverResult<()> {
        match mode {
            MasterMode::Nav => Ok(()),
            MasterMode::AirToAir => self.press(keys::AA_MODE),
            MasterMode::AirToGround => self.press(keys::AG_MODE),
            MasterMode::Dogfight => {
                let state = if entering {
                    keys::DGFT_ON
                } else {
                    keys::DGFT_CENTER
                };
                self.channel.set_state(keys::DGFT_SW, state)?;
                Ok(())
            }
        }
    }

    /// Assigns a format to one MFD slot. The slot must not be the
    /// selected one, or the second press leaves the format menu.
    fn enter_mfd_format(&self, side: char, osb: u8, format: u8) -> DriverResult<()> {
        let slot = keys::mfd(side, osb);
        self.press(&slot)?;
        self.press_settle(&slot, FIELD_SETTLE)?;
        self.press_settle(&keys::mfd(side, format), FIELD_SETTLE)
    }

    fn enter_mfd(&self, mode: MasterMode, formats: &MfdFormats, progress: &mut ProgressController) -> DriverResult<()> {
        progress.advance()?;
        info!(?mode, left = ?formats.left, right = ?formats.right, "Entering MFD formats");

        self.select_master_mode(mode, true)?;

        // No master mode starts with OSB 12 selected, so begin there on each
        // display. OSB 14 ends up selected on both.
        let [r14, r13, r12] = formats.right;
        let [l14, l13, l12] = formats.left;
        for (side, osb, format) in [
            ('R', 12, r12),
            ('R', 13, r13),
            ('R', 14, r14),
            ('L', 12, l12),
            ('L', 13, l13),
            ('L', 14, l14),
        ] {
            self.enter_mfd_format(side, osb, format)?;
        }

        self.select_master_mode(mode, false)
    }

    fn enter_cmds_program(
        &self,
        label: &str,
        page: usize,
        program: &DispenserProgram,
        progress: &mut ProgressController,
    ) -> DriverResult<()> {
        progress.advance()?;
        info!(program = label, ?program, "Entering CMDS program");

        self.dobber(Dobber::Return)?;
        self.press(keys::LIST)?;
        self.press_settle(&keys::icp(CMDS_KEY), FIELD_SETTLE)?;
        for _ in 0..page {
            self.dobber(Dobber::Sequence)?;
        }

        let fields = [
            program.burst_quantity.to_string(),
            format!("{:03}", program.burst_interval_ms),
            program.salvo_quantity.to_string(),
            format!("{:02}", program.salvo_interval_ms / 10),
        ];
        for field in &fields {
            self.enter_number(field)?;
            self.entr()?;
            self.dobber(Dobber::Down)?;
        }

        self.dobber(Dobber::Return)
    }

    fn enter_avionics(&self, setup: &AvionicsSetup, progress: &mut ProgressController) -> DriverResult<()> {
        if let Some(yardstick) = &setup.tacan_yard {
            self.enter_tacan(yardstick, progress)?;
        }
        for mode in MasterMode::ALL {
            if let Some(formats) = setup.mfd(mode) {
                self.enter_mfd(mode, formats, progress)?;
            }
        }
        if let Some(chaff) = &setup.chaff_program {
            self.enter_cmds_program("chaff", 0, chaff, progress)?;
        }
        if let Some(flare) = &setup.flare_program {
            self.enter_cmds_program("flare", 1, flare, progress)?;
        }
        Ok(())
    }
}

impl AirframeDriver for ViperDriver {
    fn airframe(&self) -> Airframe {
        Airframe::Viper
    }

    fn channel(&self) -> &CommandChannel {
        &self.channel
    }

    fn avionics_steps(&self, setup: &AvionicsSetup) -> usize {
        setup.item_count()
    }

    fn enter_plan(&self, plan: &EntryPlan, progress: &mut ProgressController) -> DriverResult<()> {
        self.enter_waypoints(plan, progress)?;
        if let Some(setup) = &plan.avionics {
            self.enter_avionics(setup, progress)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::drivers::tests::{position, recording_channel};
    use crate::profile::{Profile, Waypoint};

    fn setup(pairs: &[(&str, &str)]) -> AvionicsSetup {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AvionicsSetup::from_map(&map).unwrap()
    }

    fn buttons(presses: Vec<String>) -> Vec<String> {
        presses.into_iter().filter(|p| !p.ends_with("_SW")).collect()
    }

    fn switches(datagrams: Vec<String>) -> Vec<String> {
        datagrams
            .into_iter()
            .filter(|d| d.starts_with("ICP_DATA") || d.starts_with("ICP_DED"))
            .collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_steerpoint_keying() {
        let (channel, transport, _) = recording_channel();
        let driver = ViperDriver::new(channel);
        let profile = Profile::with_points(
            "p",
            "viper",
            vec![Waypoint::navigation(position(36.25, -115.5).with_elevation(-50))],
        )
        .unwrap();

        driver.enter_all(&profile, &mut ProgressController::detached());

        assert_eq!(
            buttons(transport.presses()),
            strings(&[
                "ICP_BTN_4", "ICP_BTN_2", "ICP_BTN_3", "ICP_BTN_6", "ICP_BTN_1", "ICP_BTN_5",
                "ICP_BTN_0", "ICP_BTN_0", "ICP_BTN_0", "ICP_ENTR_BTN", "ICP_BTN_4",
                "ICP_BTN_1", "ICP_BTN_1", "ICP_BTN_5", "ICP_BTN_3", "ICP_BTN_0", "ICP_BTN_0",
                "ICP_BTN_0", "ICP_BTN_0", "ICP_ENTR_BTN", "ICP_BTN_0", "ICP_BTN_5",
                "ICP_BTN_0", "ICP_ENTR_BTN",
            ])
        );
        assert_eq!(
            switches(transport.datagrams()),
            strings(&[
                "ICP_DATA_RTN_SEQ_SW 0", "ICP_DATA_RTN_SEQ_SW 1",
                "ICP_DATA_UP_DN_SW 0", "ICP_DATA_UP_DN_SW 1",
                "ICP_DATA_UP_DN_SW 0", "ICP_DATA_UP_DN_SW 1",
                "ICP_DATA_UP_DN_SW 0", "ICP_DATA_UP_DN_SW 1",
                "ICP_DATA_UP_DN_SW 2", "ICP_DATA_UP_DN_SW 1",
                "ICP_DATA_UP_DN_SW 2", "ICP_DATA_UP_DN_SW 1",
                "ICP_DED_SW 2", "ICP_DED_SW 1",
                "ICP_DED_SW 0", "ICP_DED_SW 1",
                "ICP_DATA_RTN_SEQ_SW 0", "ICP_DATA_RTN_SEQ_SW 1",
            ])
        );
    }

    #[test]
    fn test_tacan_wingman_y_band() {
        let (channel, transport, _) = recording_channel();
        let driver = ViperDriver::new(channel);
        let mut profile = Profile::new("p", "viper");
        profile.set_avionics("yard", setup(&[("tacan_yard", "12,Y,W")]));

        driver.enter_all(&profile, &mut ProgressController::detached());

        assert_eq!(
            buttons(transport.presses()),
            strings(&[
                "ICP_BTN_1", "ICP_BTN_0", "ICP_ENTR_BTN", "ICP_BTN_7", "ICP_BTN_5",
                "ICP_ENTR_BTN", "EHSI_MODE", "EHSI_MODE",
            ])
        );
    }

    #[test]
    fn test_mfd_slot_order() {
        let (channel, transport, _) = recording_channel();
        let driver = ViperDriver::new(channel);
        let mut profile = Profile::new("p", "viper");
        profile.set_avionics("mfd", setup(&[("f16_mfd_setup_air", "1,2,3,4,5,6")]));

        driver.enter_all(&profile, &mut ProgressController::detached());

        assert_eq!(
            transport.presses(),
            strings(&[
                "ICP_AA_MODE_BTN",
                "MFD_R_12", "MFD_R_12", "MFD_R_6",
                "MFD_R_13", "MFD_R_13", "MFD_R_5",
                "MFD_R_14", "MFD_R_14", "MFD_R_4",
                "MFD_L_12", "MFD_L_12", "MFD_L_3",
                "MFD_L_13", "MFD_L_13", "MFD_L_2",
                "MFD_L_14", "MFD_L_14", "MFD_L_1",
                "ICP_AA_MODE_BTN",
            ])
        );
    }

    #[test]
    fn test_dogfight_uses_switch() {
        let (channel, transport, _) = recording_channel();
        let driver = ViperDriver::new(channel);
        let mut profile = Profile::new("p", "viper");
        profile.set_avionics("mfd", setup(&[("f16_mfd_setup_dog", "1,2,3,4,5,6")]));

        driver.enter_all(&profile, &mut ProgressController::detached());

        let datagrams = transport.datagrams();
        assert_eq!(datagrams.first().map(String::as_str), Some("HOTAS_DGFT_SW 2"));
        assert_eq!(datagrams.last().map(String::as_str), Some("HOTAS_DGFT_SW 1"));
    }

    #[test]
    fn test_cmds_flare_program() {
        let (channel, transport, _) = recording_channel();
        let driver = ViperDriver::new(channel);
        let mut profile = Profile::new("p", "viper");
        profile.set_avionics("cmds", setup(&[("f16_cmds_setup_flare", "2,0.05,4,1.5")]));

        driver.enter_all(&profile, &mut ProgressController::detached());

        assert_eq!(
            buttons(transport.presses()),
            strings(&[
                "ICP_LIST_BTN", "ICP_BTN_7",
                "ICP_BTN_2", "ICP_ENTR_BTN",
                "ICP_BTN_0", "ICP_BTN_5", "ICP_BTN_0", "ICP_ENTR_BTN",
                "ICP_BTN_4", "ICP_ENTR_BTN",
                "ICP_BTN_1", "ICP_BTN_5", "ICP_BTN_0", "ICP_ENTR_BTN",
            ])
        );
        // Flare page is one SEQ away from chaff.
        let seq = transport
            .datagrams()
            .iter()
            .filter(|d| *d == "ICP_DATA_RTN_SEQ_SW 2")
            .count();
        assert_eq!(seq, 1);
    }

    #[test]
    fn test_avionics_steps_counted() {
        let (channel, _, _) = recording_channel();
        let driver = ViperDriver::new(channel);
        let mut profile = Profile::with_points(
            "p",
            "viper",
            vec![Waypoint::navigation(position(1.0, 1.0))],
        )
        .unwrap();
        profile.set_avionics(
            "full",
            setup(&[
                ("tacan_yard", "1,X,L"),
                ("f16_mfd_setup_nav", "1,2,3,4,5,6"),
                ("f16_cmds_setup_chaff", "1,0.02,1,1"),
            ]),
        );

        let plan = EntryPlan::build(&profile, &driver.limits());
        assert_eq!(driver.estimate_steps(&plan), 4);
    }
}
