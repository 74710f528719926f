//! Avionics setup bundle entered after the waypoints.
//!
//! The setup arrives as a flat key/value dictionary (the shape the profile
//! store hands over). Every value is parsed and range-checked here so that a
//! malformed preset is rejected before a single key is pressed.

use std::collections::BTreeMap;
use std::str::FromStr;

use tracing::debug;

use super::ProfileError;

/// Dictionary key for the TACAN yardstick.
pub const KEY_TACAN_YARD: &str = "tacan_yard";
/// Dictionary key for the chaff dispenser program.
pub const KEY_CMDS_CHAFF: &str = "f16_cmds_setup_chaff";
/// Dictionary key for the flare dispenser program.
pub const KEY_CMDS_FLARE: &str = "f16_cmds_setup_flare";

/// Highest TACAN channel usable as a yardstick.
pub const MAX_TACAN_YARD_CHANNEL: u8 = 63;

/// Highest MFD option select button number.
pub const MAX_MFD_OSB: u8 = 20;

/// TACAN band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TacanBand {
    X,
    Y,
}

/// Role within the flight, which selects the yardstick channel offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TacanRole {
    Lead,
    Wingman,
}

/// Air-to-air TACAN yardstick, serialized as `"chan,X|Y,L|W"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TacanYardstick {
    pub channel: u8,
    pub band: TacanBand,
    pub role: TacanRole,
}

impl TacanYardstick {
    /// Channel to key in: wingmen sit 63 channels above the lead.
    pub fn entry_channel(&self) -> u8 {
        match self.role {
            TacanRole::Lead => self.channel,
            TacanRole::Wingman => self.channel + MAX_TACAN_YARD_CHANNEL,
        }
    }
}

impl FromStr for TacanYardstick {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(',').map(str::trim).collect();
        let [chan, band, role] = fields[..] else {
            return Err(format!("expected 3 fields, found {}", fields.len()));
        };

        let channel: u8 = chan
            .parse()
            .map_err(|_| format!("channel '{}' is not a number", chan))?;
        if !(1..=MAX_TACAN_YARD_CHANNEL).contains(&channel) {
            return Err(format!(
                "channel {} outside 1..={}",
                channel, MAX_TACAN_YARD_CHANNEL
            ));
        }

        let band = match band {
            "X" | "x" => TacanBand::X,
            "Y" | "y" => TacanBand::Y,
            other => return Err(format!("unknown band '{}'", other)),
        };
        let role = match role {
            "L" | "l" => TacanRole::Lead,
            "W" | "w" => TacanRole::Wingman,
            other => return Err(format!("unknown role '{}'", other)),
        };

        Ok(Self {
            channel,
            band,
            role,
        })
    }
}

/// Master mode a display-format assignment applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MasterMode {
    Nav,
    AirToAir,
    AirToGround,
    Dogfight,
}

impl MasterMode {
    /// Entry order of the per-mode format assignments.
    pub const ALL: [MasterMode; 4] = [
        MasterMode::Nav,
        MasterMode::AirToAir,
        MasterMode::AirToGround,
        MasterMode::Dogfight,
    ];

    /// Dictionary key holding this mode's format list.
    pub fn setup_key(self) -> &'static str {
        match self {
            MasterMode::Nav => "f16_mfd_setup_nav",
            MasterMode::AirToAir => "f16_mfd_setup_air",
            MasterMode::AirToGround => "f16_mfd_setup_gnd",
            MasterMode::Dogfight => "f16_mfd_setup_dog",
        }
    }
}

/// Display formats for the three format slots of both MFDs.
///
/// Each entry is the OSB that selects the format in the format menu. Slots are
/// listed OSB 14, 13, 12 for each display; the serialized form is six
/// comma-separated numbers, left display first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MfdFormats {
    pub left: [u8; 3],
    pub right: [u8; 3],
}

impl FromStr for MfdFormats {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let osbs = s
            .split(',')
            .map(|field| {
                let field = field.trim();
                let osb: u8 = field
                    .parse()
                    .map_err(|_| format!("OSB '{}' is not a number", field))?;
                if !(1..=MAX_MFD_OSB).contains(&osb) {
                    return Err(format!("OSB {} outside 1..={}", osb, MAX_MFD_OSB));
                }
                Ok(osb)
            })
            .collect::<Result<Vec<u8>, String>>()?;

        match osbs[..] {
            [l14, l13, l12, r14, r13, r12] => Ok(Self {
                left: [l14, l13, l12],
                right: [r14, r13, r12],
            }),
            _ => Err(format!("expected 6 OSBs, found {}", osbs.len())),
        }
    }
}

/// Countermeasure dispenser program, serialized as
/// `"burst qty,burst interval s,salvo qty,salvo interval s"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispenserProgram {
    pub burst_quantity: u8,
    pub burst_interval_ms: u32,
    pub salvo_quantity: u8,
    pub salvo_interval_ms: u32,
}

impl FromStr for DispenserProgram {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(',').map(str::trim).collect();
        let [bq, bi, sq, si] = fields[..] else {
            return Err(format!("expected 4 fields, found {}", fields.len()));
        };

        fn quantity(raw: &str) -> Result<u8, String> {
            match raw.parse::<u8>() {
                Ok(q) if (1..=99).contains(&q) => Ok(q),
                _ => Err(format!("quantity '{}' outside 1..=99", raw)),
            }
        }

        fn interval_ms(raw: &str) -> Result<u32, String> {
            match raw.parse::<f64>() {
                Ok(secs) if secs.is_finite() && secs > 0.0 && secs < 100.0 => {
                    Ok((secs * 1000.0).round() as u32)
                }
                _ => Err(format!("interval '{}' is not a positive number of seconds", raw)),
            }
        }

        Ok(Self {
            burst_quantity: quantity(bq)?,
            burst_interval_ms: interval_ms(bi)?,
            salvo_quantity: quantity(sq)?,
            salvo_interval_ms: interval_ms(si)?,
        })
    }
}

/// Parsed avionics setup. Absent items leave the device configuration as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvionicsSetup {
    pub tacan_yard: Option<TacanYardstick>,
    pub mfd_formats: BTreeMap<MasterMode, MfdFormats>,
    pub chaff_program: Option<DispenserProgram>,
    pub flare_program: Option<DispenserProgram>,
}

impl AvionicsSetup {
    /// Parses a setup dictionary.
    ///
    /// Unrecognized keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::InvalidAvionics`] for any malformed value.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, ProfileError> {
        fn parse<T: FromStr<Err = String>>(key: &str, value: &str) -> Result<T, ProfileError> {
            value.parse().map_err(|reason| ProfileError::InvalidAvionics {
                key: key.to_string(),
                value: value.to_string(),
                reason,
            })
        }

        let mut setup = AvionicsSetup::default();

        for (key, value) in map {
            match key.as_str() {
                KEY_TACAN_YARD => setup.tacan_yard = Some(parse(key, value)?),
                KEY_CMDS_CHAFF => setup.chaff_program = Some(parse(key, value)?),
                KEY_CMDS_FLARE => setup.flare_program = Some(parse(key, value)?),
                other => match MasterMode::ALL.iter().find(|m| m.setup_key() == other) {
                    Some(mode) => {
                        setup.mfd_formats.insert(*mode, parse(key, value)?);
                    }
                    None => debug!(key = other, "Ignoring unknown avionics setup key"),
                },
            }
        }

        Ok(setup)
    }

    /// Format assignment for a master mode, if configured.
    pub fn mfd(&self, mode: MasterMode) -> Option<&MfdFormats> {
        self.mfd_formats.get(&mode)
    }

    /// Number of configured items.
    pub fn item_count(&self) -> usize {
        usize::from(self.tacan_yard.is_some())
            + self.mfd_formats.len()
            + usize::from(self.chaff_program.is_some())
            + usize::from(self.flare_program.is_some())
    }

    /// Whether nothing is configured.
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }
}
