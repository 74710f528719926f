//! Outbound cockpit command channel.
//!
//! Every cockpit interaction is encoded as an ASCII datagram:
//!
//! ```text
//! press:      "<ID> 1\n"  wait hold   "<ID> 0\n"  wait settle
//! set state:  "<ID> <STATE>\n"        wait settle
//! raw:        "<TOKEN>\n"             wait settle
//! ```
//!
//! The channel owns its [`Transport`] and [`Sleeper`]. Both are trait objects
//! so tests and dry runs can swap in recording doubles.

mod clock;
mod transport;

use std::fmt::Display;
use std::io;
use std::time::Duration;

use tracing::{trace, warn};

pub use clock::{InstantSleeper, Sleeper, ThreadSleeper};
pub use transport::{RecordingTransport, Transport, UdpTransport};

/// Press and settle delays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressTiming {
    /// Default hold and settle for ordinary keys.
    pub short: Duration,
    /// Used where the cockpit needs longer to react (page changes, sign keys).
    pub medium: Duration,
    /// Always twice `medium`.
    pub long: Duration,
}

impl PressTiming {
    /// Default short delay in seconds.
    pub const DEFAULT_SHORT_SECS: f64 = 0.15;
    /// Default medium delay in seconds.
    pub const DEFAULT_MEDIUM_SECS: f64 = 0.40;

    pub fn new(short: Duration, medium: Duration) -> Self {
        Self {
            short,
            medium,
            long: medium * 2,
        }
    }

    /// Builds timing from delays in seconds.
    ///
    /// # Panics
    ///
    /// Panics if either delay is negative, not finite, or overflows
    /// `Duration`. Validate untrusted values first, as
    /// [`ConfigFile::timing`](crate::config::ConfigFile::timing) does.
    pub fn from_secs_f64(short: f64, medium: f64) -> Self {
        Self::new(Duration::from_secs_f64(short), Duration::from_secs_f64(medium))
    }
}

impl Default for PressTiming {
    fn default() -> Self {
        Self::from_secs_f64(Self::DEFAULT_SHORT_SECS, Self::DEFAULT_MEDIUM_SECS)
    }
}

/// A datagram channel to the cockpit with press pacing.
pub struct CommandChannel {
    transport: Box<dyn Transport>,
    sleeper: Box<dyn Sleeper>,
    timing: PressTiming,
}

impl CommandChannel {
    /// Creates a channel over the given transport and sleeper.
    pub fn new(
        transport: impl Transport + 'static,
        sleeper: impl Sleeper + 'static,
        timing: PressTiming,
    ) -> Self {
        Self {
            transport: Box::new(transport),
            sleeper: Box::new(sleeper),
            timing,
        }
    }

    /// Opens a UDP channel to `host:port` paced by real sleeps.
    pub fn udp(host: &str, port: u16, timing: PressTiming) -> io::Result<Self> {
        Ok(Self::new(UdpTransport::open(host, port)?, ThreadSleeper, timing))
    }

    /// Configured delays.
    pub fn timing(&self) -> PressTiming {
        self.timing
    }

    /// Presses a control with the short hold and settle.
    pub fn press(&self, control: &str) -> io::Result<bool> {
        self.press_with_delay(control, self.timing.short, self.timing.short)
    }

    /// Presses a control and lets the cockpit settle for `settle`.
    pub fn press_settle(&self, control: &str, settle: Duration) -> io::Result<bool> {
        self.press_with_delay(control, self.timing.short, settle)
    }

    /// Down, wait `hold`, up, wait `settle`.
    ///
    /// Returns `Ok(false)` when the transport accepted fewer bytes than
    /// encoded; the caller carries on regardless. An empty control id is
    /// not sent at all.
    pub fn press_with_delay(
        &self,
        control: &str,
        hold: Duration,
        settle: Duration,
    ) -> io::Result<bool> {
        if control.is_empty() {
            return Ok(false);
        }

        let down = self.send(&format!("{} 1\n", control))?;
        self.sleeper.sleep(hold);
        let up = self.send(&format!("{} 0\n", control))?;
        self.sleeper.sleep(settle);

        Ok(down && up)
    }

    /// Sends a bare token with no state suffix.
    pub fn send_raw(&self, token: &str, settle: Duration) -> io::Result<bool> {
        if token.is_empty() {
            return Ok(false);
        }
        let sent = self.send(&format!("{}\n", token))?;
        self.sleeper.sleep(settle);
        Ok(sent)
    }

    /// Puts a multi-position control into `state` and waits the short delay.
    pub fn set_state(&self, control: &str, state: impl Display) -> io::Result<bool> {
        if control.is_empty() {
            return Ok(false);
        }
        let sent = self.send(&format!("{} {}\n", control, state))?;
        self.sleeper.sleep(self.timing.short);
        Ok(sent)
    }

    /// Moves a spring-loaded switch to `position`, holds, and releases it
    /// back to `rest`.
    pub fn flip(
        &self,
        control: &str,
        position: u8,
        rest: u8,
        hold: Duration,
        settle: Duration,
    ) -> io::Result<bool> {
        if control.is_empty() {
            return Ok(false);
        }
        let moved = self.send(&format!("{} {}\n", control, position))?;
        self.sleeper.sleep(hold);
        let released = self.send(&format!("{} {}\n", control, rest))?;
        self.sleeper.sleep(settle);
        Ok(moved && released)
    }

    /// Pacing pause.
    pub fn pause(&self, duration: Duration) {
        self.sleeper.sleep(duration);
    }

    fn send(&self, payload: &str) -> io::Result<bool> {
        let sent = self.transport.send(payload.as_bytes())?;
        trace!(datagram = payload.trim_end(), bytes = sent, "Sent");
        if sent != payload.len() {
            warn!(
                datagram = payload.trim_end(),
                sent,
                expected = payload.len(),
                "Short send to cockpit"
            );
            return Ok(false);
        }
        Ok(true)
    }
}

impl std::fmt::Debug for CommandChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandChannel")
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}
