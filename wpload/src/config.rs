//! Preferences file.
//!
//! Settings live in an INI file under the platform config directory:
//!
//! ```ini
//! [dcs]
//! host = 127.0.0.1
//! port = 7778
//!
//! [timing]
//! short_delay = 0.15
//! medium_delay = 0.40
//! grace_period = 5
//!
//! [profile]
//! default_airframe = viper
//! ```
//!
//! Missing keys take their defaults. Values are validated on load and on
//! every `set`, so a [`ConfigFile`] in hand is always usable.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::{debug, info};

use crate::channel::{PressTiming, UdpTransport};
use crate::drivers::Airframe;

/// Directory name under the platform config directory.
const APP_DIR: &str = "wpload";
/// File name of the preferences file.
const CONFIG_FILE: &str = "config.ini";

/// Errors from loading, saving, or editing preferences.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Failed to access config file: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Path of the preferences file.
///
/// Falls back to the working directory when the platform has no config
/// directory.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Typed preferences.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Host running the simulator's command import.
    pub host: String,
    /// UDP import port.
    pub port: u16,
    /// Short press delay in seconds.
    pub short_delay: f64,
    /// Medium press delay in seconds.
    pub medium_delay: f64,
    /// Seconds to wait before the first press.
    pub grace_period: f64,
    /// Airframe used by commands that name none.
    pub default_airframe: Airframe,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: UdpTransport::DEFAULT_PORT,
            short_delay: PressTiming::DEFAULT_SHORT_SECS,
            medium_delay: PressTiming::DEFAULT_MEDIUM_SECS,
            grace_period: Self::DEFAULT_GRACE_SECS,
            default_airframe: Airframe::Viper,
        }
    }
}

impl ConfigFile {
    /// Default pre-entry grace period in seconds.
    pub const DEFAULT_GRACE_SECS: f64 = 5.0;
    /// Longest accepted press delay in seconds.
    pub const MAX_DELAY_SECS: f64 = 10.0;
    /// Longest accepted grace period in seconds.
    pub const MAX_GRACE_SECS: f64 = 600.0;

    /// Set the simulator host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the import port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the short and medium press delays in seconds.
    pub fn with_delays(mut self, short: f64, medium: f64) -> Self {
        self.short_delay = short;
        self.medium_delay = medium;
        self
    }

    /// Set the grace period in seconds.
    pub fn with_grace_period(mut self, seconds: f64) -> Self {
        self.grace_period = seconds;
        self
    }

    /// Set the default airframe.
    pub fn with_default_airframe(mut self, airframe: Airframe) -> Self {
        self.default_airframe = airframe;
        self
    }

    /// Press timing derived from the configured delays.
    ///
    /// The builders do not validate, so the delays are checked here.
    pub fn timing(&self) -> ConfigResult<PressTiming> {
        ConfigKey::TimingShortDelay.validate(self)?;
        ConfigKey::TimingMediumDelay.validate(self)?;
        Ok(PressTiming::from_secs_f64(self.short_delay, self.medium_delay))
    }

    /// Pre-entry grace period.
    pub fn grace_period(&self) -> ConfigResult<Duration> {
        ConfigKey::TimingGracePeriod.validate(self)?;
        Ok(Duration::from_secs_f64(self.grace_period))
    }

    /// Checks every value.
    pub fn validate(&self) -> ConfigResult<()> {
        for key in ConfigKey::all() {
            key.validate(self)?;
        }
        Ok(())
    }

    /// Loads from the default path, or defaults when the file is absent.
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&config_file_path())
    }

    /// Loads from `path`, or defaults when the file is absent.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut config = Self::default();
        for key in ConfigKey::all() {
            if let Some(value) = ini
                .section(Some(key.section()))
                .and_then(|section| section.get(key.key_name()))
            {
                key.set(&mut config, value)?;
            }
        }

        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Saves to the default path.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&config_file_path())
    }

    /// Saves to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini.write_to_file(path)?;

        info!(path = %path.display(), "Saved config");
        Ok(())
    }
}

/// A single addressable setting, named `section.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    DcsHost,
    DcsPort,
    TimingShortDelay,
    TimingMediumDelay,
    TimingGracePeriod,
    ProfileDefaultAirframe,
}

impl ConfigKey {
    /// Every key in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::DcsHost,
            ConfigKey::DcsPort,
            ConfigKey::TimingShortDelay,
            ConfigKey::TimingMediumDelay,
            ConfigKey::TimingGracePeriod,
            ConfigKey::ProfileDefaultAirframe,
        ]
    }

    /// INI section holding the key.
    pub fn section(self) -> &'static str {
        match self {
            ConfigKey::DcsHost | ConfigKey::DcsPort => "dcs",
            ConfigKey::TimingShortDelay
            | ConfigKey::TimingMediumDelay
            | ConfigKey::TimingGracePeriod => "timing",
            ConfigKey::ProfileDefaultAirframe => "profile",
        }
    }

    /// Key name within its section.
    pub fn key_name(self) -> &'static str {
        match self {
            ConfigKey::DcsHost => "host",
            ConfigKey::DcsPort => "port",
            ConfigKey::TimingShortDelay => "short_delay",
            ConfigKey::TimingMediumDelay => "medium_delay",
            ConfigKey::TimingGracePeriod => "grace_period",
            ConfigKey::ProfileDefaultAirframe => "default_airframe",
        }
    }

    /// Full `section.key` name.
    pub fn name(self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as text.
    pub fn get(self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::DcsHost => config.host.clone(),
            ConfigKey::DcsPort => config.port.to_string(),
            ConfigKey::TimingShortDelay => config.short_delay.to_string(),
            ConfigKey::TimingMediumDelay => config.medium_delay.to_string(),
            ConfigKey::TimingGracePeriod => config.grace_period.to_string(),
            ConfigKey::ProfileDefaultAirframe => config.default_airframe.id().to_string(),
        }
    }

    /// Parses and stores a value.
    pub fn set(self, config: &mut ConfigFile, value: &str) -> ConfigResult<()> {
        let value = value.trim();
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        let mut updated = config.clone();
        match self {
            ConfigKey::DcsHost => {
                if value.is_empty() {
                    return Err(invalid("host must not be empty"));
                }
                updated.host = value.to_string();
            }
            ConfigKey::DcsPort => {
                updated.port = value.parse().map_err(|_| invalid("not a port number"))?;
            }
            ConfigKey::TimingShortDelay => {
                updated.short_delay = value.parse().map_err(|_| invalid("not a number"))?;
            }
            ConfigKey::TimingMediumDelay => {
                updated.medium_delay = value.parse().map_err(|_| invalid("not a number"))?;
            }
            ConfigKey::TimingGracePeriod => {
                updated.grace_period = value.parse().map_err(|_| invalid("not a number"))?;
            }
            ConfigKey::ProfileDefaultAirframe => {
                updated.default_airframe =
                    value.parse().map_err(|_| invalid("unknown airframe"))?;
            }
        }

        self.validate(&updated)?;
        *config = updated;
        Ok(())
    }

    fn validate(self, config: &ConfigFile) -> ConfigResult<()> {
        let check = |value: f64, ok: bool, reason: &str| {
            if ok {
                Ok(())
            } else {
                Err(ConfigError::InvalidValue {
                    key: self.name(),
                    value: value.to_string(),
                    reason: reason.to_string(),
                })
            }
        };

        let check_delay = |v: f64| {
            check(
                v,
                v > 0.0 && v <= ConfigFile::MAX_DELAY_SECS,
                "delay must be positive and at most 10 seconds",
            )
        };

        match self {
            ConfigKey::TimingShortDelay => check_delay(config.short_delay),
            ConfigKey::TimingMediumDelay => check_delay(config.medium_delay),
            ConfigKey::TimingGracePeriod => {
                let v = config.grace_period;
                check(
                    v,
                    (0.0..=ConfigFile::MAX_GRACE_SECS).contains(&v),
                    "grace period must be between 0 and 600 seconds",
                )
            }
            ConfigKey::DcsHost
            | ConfigKey::DcsPort
            | ConfigKey::ProfileDefaultAirframe => Ok(()),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == s.trim())
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}
