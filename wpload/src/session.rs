//! Background entry sessions.
//!
//! An entry can run for minutes, so it is executed on a dedicated worker
//! thread. The caller keeps the two queue ends:
//!
//! ```text
//!          ┌──────────── EntrySession ─────────────┐
//! caller ──┤ cancel()  ──ControlCommand──▶ worker  │
//!          │ events()  ◀──ProgressEvent── worker   │
//!          │ join()    ◀──EntryOutcome── worker    │
//!          └───────────────────────────────────────┘
//! ```
//!
//! The registry is locked for the whole entry, so at most one entry runs at
//! a time.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::drivers::{Airframe, DriverError, DriverResult, EntryOutcome};
use crate::profile::Profile;
use crate::progress::{ControlCommand, ProgressController, ProgressEvent};
use crate::registry::DriverRegistry;

/// Registry shared between the caller and entry workers.
pub type SharedRegistry = Arc<Mutex<DriverRegistry>>;

/// Wraps a registry for use with [`spawn_entry`].
pub fn share(registry: DriverRegistry) -> SharedRegistry {
    Arc::new(Mutex::new(registry))
}

/// Handle to a running entry.
#[derive(Debug)]
pub struct EntrySession {
    events: Receiver<ProgressEvent>,
    control: Sender<ControlCommand>,
    handle: JoinHandle<EntryOutcome>,
}

impl EntrySession {
    /// Progress events, ending with `Percent(100)` then `Done`.
    pub fn events(&self) -> &Receiver<ProgressEvent> {
        &self.events
    }

    /// A sender that cancels this entry, for use from other threads.
    pub fn canceller(&self) -> Sender<ControlCommand> {
        self.control.clone()
    }

    /// Requests cancellation at the next step boundary.
    pub fn cancel(&self) {
        if self.control.send(ControlCommand::Cancel).is_err() {
            debug!("Entry already finished, cancel ignored");
        }
    }

    /// Waits for the worker and returns how the entry ended.
    pub fn join(self) -> EntryOutcome {
        match self.handle.join() {
            Ok(outcome) => outcome,
            Err(_) => EntryOutcome::Failed("entry worker panicked".to_string()),
        }
    }
}

/// Loads a profile and selects the driver for it.
///
/// `airframe` overrides the profile's own airframe identifier.
pub fn prepare_entry(
    registry: &SharedRegistry,
    path: &Path,
    airframe: Option<&str>,
) -> DriverResult<Profile> {
    let profile = Profile::load(path)?;
    let id = airframe.unwrap_or(profile.aircraft());
    registry.lock().select(id)?;
    Ok(profile)
}

/// Starts entering `profile` with the registry's active driver.
///
/// The worker first waits `grace` so the operator can bring the simulator
/// to the foreground, then runs the entry.
pub fn spawn_entry(
    registry: SharedRegistry,
    profile: Profile,
    grace: Duration,
) -> DriverResult<EntrySession> {
    let airframe = registry
        .lock()
        .active_airframe()
        .ok_or_else(|| DriverError::UndefinedDriver("<none selected>".to_string()))?;

    let (events_tx, events_rx) = mpsc::channel();
    let (control_tx, control_rx) = mpsc::channel();

    let handle = thread::Builder::new()
        .name("wpload-entry".to_string())
        .spawn(move || run_entry(registry, profile, airframe, grace, events_tx, control_rx))?;

    Ok(EntrySession {
        events: events_rx,
        control: control_tx,
        handle,
    })
}

fn run_entry(
    registry: SharedRegistry,
    profile: Profile,
    airframe: Airframe,
    grace: Duration,
    events: Sender<ProgressEvent>,
    control: Receiver<ControlCommand>,
) -> EntryOutcome {
    let mut progress = ProgressController::new(Some(events), Some(control));
    let registry = registry.lock();

    let Some(driver) = registry.get(airframe) else {
        progress.finish();
        return EntryOutcome::Failed(DriverError::UndefinedDriver(airframe.to_string()).to_string());
    };

    info!(
        %airframe,
        profile = profile.name(),
        grace_secs = grace.as_secs_f64(),
        "Entry starting after grace period"
    );
    driver.channel().pause(grace);

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        driver.enter_all(&profile, &mut progress)
    }));

    match result {
        Ok(outcome) => outcome,
        Err(_) => {
            error!(%airframe, "Entry worker panicked");
            progress.finish();
            EntryOutcome::Failed("entry worker panicked".to_string())
        }
    }
}
