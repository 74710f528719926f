//! Enter command - key a profile into the running simulator.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;
use wpload::channel::{CommandChannel, InstantSleeper, PressTiming, RecordingTransport};
use wpload::config::ConfigFile;
use wpload::drivers::EntryOutcome;
use wpload::progress::ProgressEvent;
use wpload::registry::DriverRegistry;
use wpload::session::{self, EntrySession};

use crate::error::CliError;

/// How often the progress loop checks for Ctrl+C.
const INTERRUPT_POLL: Duration = Duration::from_millis(100);

/// Arguments for the enter command.
pub struct EnterArgs {
    pub profile: PathBuf,
    pub airframe: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub grace: Option<f64>,
    pub dry_run: bool,
}

/// Run the enter command.
pub fn run(args: EnterArgs) -> Result<(), CliError> {
    let config = match ConfigFile::load() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable config, using defaults");
            ConfigFile::default()
        }
    };

    let host = args.host.unwrap_or_else(|| config.host.clone());
    let port = args.port.unwrap_or(config.port);
    let grace = resolve_grace(args.grace, &config)?;
    let timing = config.timing()?;

    let recorder = args.dry_run.then(RecordingTransport::new);
    let registry = match &recorder {
        Some(recorder) => recording_registry(recorder, timing)?,
        None => DriverRegistry::connect(&host, port, timing)?,
    };
    let registry = session::share(registry);

    let profile = session::prepare_entry(&registry, &args.profile, args.airframe.as_deref())?;
    let airframe = registry.lock().active_airframe();

    println!("wpload v{}", wpload::VERSION);
    println!("==========");
    println!();
    println!("Profile:   {}", profile.name());
    if let Some(airframe) = airframe {
        println!("Airframe:  {}", airframe.display_name());
    }
    println!(
        "Points:    {} waypoints, {} missions, {} sequences",
        profile.waypoints().count(),
        profile.missions().count(),
        profile.sequences().len()
    );
    if recorder.is_some() {
        println!("Target:    dry run (nothing is sent)");
    } else {
        println!("Target:    {}:{}", host, port);
        println!();
        println!(
            "Switch to the simulator now. Entry starts in {:.1}s.",
            grace.as_secs_f64()
        );
    }
    println!("Press Ctrl+C to cancel");
    println!();

    // Installed before the worker starts so a failure here sends nothing.
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::SeqCst);
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let entry = session::spawn_entry(registry, profile, grace)?;

    let bar = progress_bar();
    follow(&entry, &bar, &interrupted);
    let outcome = entry.join();
    bar.finish_and_clear();

    if let Some(recorder) = recorder {
        for datagram in recorder.datagrams() {
            println!("{}", datagram);
        }
        println!();
        println!(
            "Dry run: {} datagrams, {} presses",
            recorder.len(),
            recorder.presses().len()
        );
    }

    report(outcome)
}

/// Grace period from the command line, else from the config.
fn resolve_grace(cli: Option<f64>, config: &ConfigFile) -> Result<Duration, CliError> {
    match cli {
        Some(secs) if (0.0..=ConfigFile::MAX_GRACE_SECS).contains(&secs) => {
            Ok(Duration::from_secs_f64(secs))
        }
        Some(secs) => Err(CliError::Config(format!(
            "Grace period must be between 0 and {} seconds, got {}",
            ConfigFile::MAX_GRACE_SECS,
            secs
        ))),
        None => config.grace_period().map_err(CliError::from),
    }
}

/// Registry whose drivers all record into `recorder` and never sleep.
fn recording_registry(
    recorder: &RecordingTransport,
    timing: PressTiming,
) -> Result<DriverRegistry, CliError> {
    let registry = DriverRegistry::with_channels(|_| {
        Ok(CommandChannel::new(
            recorder.clone(),
            InstantSleeper::new(),
            timing,
        ))
    })?;
    Ok(registry)
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template("{msg} [{bar:40.cyan/blue}] {pos:>3}%")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ");
    bar.set_style(style);
    bar.set_message("Entering");
    bar
}

/// Mirrors progress events onto the bar until the entry reports done,
/// forwarding an interrupt as a cancel request.
fn follow(entry: &EntrySession, bar: &ProgressBar, interrupted: &AtomicBool) {
    loop {
        if interrupted.swap(false, Ordering::SeqCst) {
            bar.set_message("Cancelling");
            entry.cancel();
        }

        match entry.events().recv_timeout(INTERRUPT_POLL) {
            Ok(ProgressEvent::Percent(percent)) => bar.set_position(u64::from(percent)),
            Ok(ProgressEvent::Done) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
}

fn report(outcome: EntryOutcome) -> Result<(), CliError> {
    match outcome {
        EntryOutcome::Completed => {
            println!("{}", style("Entry complete").green().bold());
            Ok(())
        }
        EntryOutcome::Cancelled => Err(CliError::Cancelled),
        EntryOutcome::Failed(reason) => Err(CliError::EntryFailed(reason)),
    }
}
