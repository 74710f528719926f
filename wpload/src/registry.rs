//! Airframe driver registry.
//!
//! Maps airframe identifiers to their drivers and tracks which one is
//! active. Lookup by string only happens here; everything past the registry
//! works with [`Airframe`].

use std::collections::HashMap;
use std::io;

use tracing::{debug, info};

use crate::channel::{CommandChannel, PressTiming};
use crate::drivers::{Airframe, AirframeDriver, DriverError, DriverResult, EntryOutcome};
use crate::profile::Profile;
use crate::progress::ProgressController;

/// Drivers by airframe plus the active selection.
pub struct DriverRegistry {
    drivers: HashMap<Airframe, Box<dyn AirframeDriver>>,
    active: Option<Airframe>,
}

impl DriverRegistry {
    /// Airframe selected when a registry is first populated.
    pub const DEFAULT_AIRFRAME: Airframe = Airframe::Hornet;

    /// An empty registry.
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
            active: None,
        }
    }

    /// Builds every driver, each over its own channel from `open`.
    pub fn with_channels<F>(mut open: F) -> io::Result<Self>
    where
        F: FnMut(Airframe) -> io::Result<CommandChannel>,
    {
        let mut registry = Self::new();
        for airframe in Airframe::ALL {
            registry.register(airframe.driver(open(airframe)?));
        }
        registry.active = Some(Self::DEFAULT_AIRFRAME);
        Ok(registry)
    }

    /// Builds every driver with a UDP channel to `host:port`.
    pub fn connect(host: &str, port: u16, timing: PressTiming) -> io::Result<Self> {
        info!(host, port, "Opening cockpit channels");
        Self::with_channels(|_| CommandChannel::udp(host, port, timing))
    }

    /// Adds or replaces a driver, returning the one it replaced.
    pub fn register(&mut self, driver: Box<dyn AirframeDriver>) -> Option<Box<dyn AirframeDriver>> {
        let airframe = driver.airframe();
        debug!(%airframe, "Registering driver");
        if self.active.is_none() {
            self.active = Some(airframe);
        }
        self.drivers.insert(airframe, driver)
    }

    /// Makes the driver for `id` active.
    ///
    /// # Errors
    ///
    /// [`DriverError::UndefinedDriver`] when `id` names no registered driver.
    pub fn select(&mut self, id: &str) -> DriverResult<Airframe> {
        let airframe: Airframe = id.parse()?;
        if !self.drivers.contains_key(&airframe) {
            return Err(DriverError::UndefinedDriver(id.to_string()));
        }
        if self.active != Some(airframe) {
            info!(%airframe, "Driver selected");
        }
        self.active = Some(airframe);
        Ok(airframe)
    }

    /// Currently selected airframe.
    pub fn active_airframe(&self) -> Option<Airframe> {
        self.active
    }

    /// Currently selected driver.
    pub fn active(&self) -> Option<&dyn AirframeDriver> {
        self.active.and_then(|a| self.get(a))
    }

    /// Driver for an airframe, if registered.
    pub fn get(&self, airframe: Airframe) -> Option<&dyn AirframeDriver> {
        self.drivers.get(&airframe).map(|d| d.as_ref())
    }

    /// Registered airframes in declaration order.
    pub fn airframes(&self) -> Vec<Airframe> {
        let mut airframes: Vec<Airframe> = self.drivers.keys().copied().collect();
        airframes.sort();
        airframes
    }

    /// Runs a profile through the active driver.
    pub fn enter_all(
        &self,
        profile: &Profile,
        progress: &mut ProgressController,
    ) -> DriverResult<EntryOutcome> {
        let driver = self
            .active()
            .ok_or_else(|| DriverError::UndefinedDriver("<none selected>".to_string()))?;
        info!(aircraft = profile.aircraft(), "Entering waypoints");
        Ok(driver.enter_all(profile, progress))
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("airframes", &self.airframes())
            .field("active", &self.active)
            .finish()
    }
}
