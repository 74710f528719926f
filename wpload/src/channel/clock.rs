//! Pacing seam.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

/// Blocking pause between commands.
pub trait Sleeper: Send {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

/// Returns immediately and records what would have been slept.
#[derive(Debug, Clone, Default)]
pub struct InstantSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl InstantSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every requested pause, in order.
    pub fn pauses(&self) -> Vec<Duration> {
        self.slept.lock().clone()
    }
}

impl Sleeper for InstantSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept.lock().push(duration);
    }
}
