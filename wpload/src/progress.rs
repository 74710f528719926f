//! Progress reporting and cooperative cancellation for a running entry.
//!
//! Two one-directional queues connect an entry to its caller:
//!
//! ```text
//!   caller ──ControlCommand::Cancel──▶ driver   (polled at step boundaries)
//!   caller ◀──ProgressEvent──────────── driver   (Percent(0..=99)*, Percent(100), Done)
//! ```
//!
//! The percentage never decreases and reaches 100 exactly once, whether the
//! entry completes, is cancelled, or fails.

use std::sync::mpsc::{Receiver, Sender, TryRecvError};

use thiserror::Error;
use tracing::{debug, trace};

/// Message from a running entry to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Completion percentage.
    Percent(u8),
    /// Terminal marker, sent once right after `Percent(100)`.
    Done,
}

/// Message from the caller to a running entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Stop at the next step boundary.
    Cancel,
}

/// Raised at a step boundary once cancellation has been requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Operation cancelled")]
pub struct Cancelled;

/// Step counter that reports percentages and polls for cancellation.
#[derive(Debug)]
pub struct ProgressController {
    progress: Option<Sender<ProgressEvent>>,
    control: Option<Receiver<ControlCommand>>,
    counter: u32,
    increment: f64,
    cancelled: bool,
    finished: bool,
}

impl ProgressController {
    /// Creates a controller over optional progress and control queues.
    pub fn new(
        progress: Option<Sender<ProgressEvent>>,
        control: Option<Receiver<ControlCommand>>,
    ) -> Self {
        Self {
            progress,
            control,
            counter: 0,
            increment: 100.0,
            cancelled: false,
            finished: false,
        }
    }

    /// A controller with no caller attached.
    pub fn detached() -> Self {
        Self::new(None, None)
    }

    /// Sizes the per-step increment for an estimated number of steps.
    ///
    /// One extra step is reserved so non-terminal reports stay below 100.
    pub fn size_for(&mut self, estimated_steps: usize) {
        self.counter = 0;
        self.increment = 100.0 / (estimated_steps as f64 + 1.0);
        debug!(
            steps = estimated_steps,
            increment = self.increment,
            "Progress sized"
        );
    }

    /// Completes one step: polls for cancellation, then reports progress.
    pub fn advance(&mut self) -> Result<(), Cancelled> {
        self.checkpoint()?;
        self.counter += 1;
        let percent = self.percent();
        self.emit(ProgressEvent::Percent(percent));
        Ok(())
    }

    /// Polls for cancellation without counting a step.
    pub fn checkpoint(&mut self) -> Result<(), Cancelled> {
        self.poll();
        if self.cancelled {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Reports 100 and `Done`. Later calls do nothing.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.emit(ProgressEvent::Percent(100));
        self.emit(ProgressEvent::Done);
    }

    /// Current non-terminal percentage.
    pub fn percent(&self) -> u8 {
        if self.finished {
            return 100;
        }
        let raw = (f64::from(self.counter) * self.increment).floor();
        raw.clamp(0.0, 99.0) as u8
    }

    /// Whether cancellation has been observed.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Whether the terminal events have been sent.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn poll(&mut self) {
        if self.cancelled {
            return;
        }
        let Some(control) = &self.control else {
            return;
        };
        loop {
            match control.try_recv() {
                Ok(ControlCommand::Cancel) => {
                    debug!("Cancellation requested");
                    self.cancelled = true;
                    break;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    // Caller went away; nobody can cancel any more.
                    self.control = None;
                    break;
                }
            }
        }
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(progress) = &self.progress {
            if progress.send(event).is_err() {
                trace!(?event, "Progress receiver gone");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn drain(rx: &Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_reports_increasing_percent() {
        let (tx, rx) = mpsc::channel();
        let mut progress = ProgressController::new(Some(tx), None);
        progress.size_for(3);

        for _ in 0..3 {
            progress.advance().unwrap();
        }
        progress.finish();

        assert_eq!(
            drain(&rx),
            vec![
                ProgressEvent::Percent(25),
                ProgressEvent::Percent(50),
                ProgressEvent::Percent(75),
                ProgressEvent::Percent(100),
                ProgressEvent::Done,
            ]
        );
    }

    #[test]
    fn test_underestimate_caps_at_99() {
        let (tx, rx) = mpsc::channel();
        let mut progress = ProgressController::new(Some(tx), None);
        progress.size_for(1);

        for _ in 0..5 {
            progress.advance().unwrap();
        }

        assert!(drain(&rx)
            .iter()
            .all(|e| matches!(e, ProgressEvent::Percent(p) if *p <= 99)));
    }

    #[test]
    fn test_finish_once() {
        let (tx, rx) = mpsc::channel();
        let mut progress = ProgressController::new(Some(tx), None);
        progress.size_for(0);
        progress.finish();
        progress.finish();

        assert_eq!(
            drain(&rx),
            vec![ProgressEvent::Percent(100), ProgressEvent::Done]
        );
    }

    #[test]
    fn test_cancellation_is_sticky() {
        let (ctl_tx, ctl_rx) = mpsc::channel();
        let mut progress = ProgressController::new(None, Some(ctl_rx));
        progress.size_for(10);

        progress.advance().unwrap();
        ctl_tx.send(ControlCommand::Cancel).unwrap();

        assert_eq!(progress.advance(), Err(Cancelled));
        assert_eq!(progress.checkpoint(), Err(Cancelled));
        assert!(progress.is_cancelled());
    }

    #[test]
    fn test_dropped_control_sender_does_not_cancel() {
        let (ctl_tx, ctl_rx) = mpsc::channel::<ControlCommand>();
        let mut progress = ProgressController::new(None, Some(ctl_rx));
        drop(ctl_tx);
        assert!(progress.advance().is_ok());
    }

    #[test]
    fn test_dropped_progress_receiver_is_ignored() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut progress = ProgressController::new(Some(tx), None);
        progress.size_for(2);
        assert!(progress.advance().is_ok());
        progress.finish();
        assert!(progress.is_finished());
    }
}
