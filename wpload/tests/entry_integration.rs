//! Integration tests for complete entry runs.
//!
//! These drive real airframe drivers over a recording transport and check
//! the emitted command stream and progress events end to end:
//! - mission, waypoint, and sequence ordering on the Hornet
//! - cancellation stops at the next step boundary
//! - a transport failure aborts the entry without further sends
//! - progress is monotonic and terminates exactly once
//! - airframe limits and elevation skipping
//!
//! Run with: `cargo test --test entry_integration`

use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wpload::channel::{CommandChannel, InstantSleeper, PressTiming, RecordingTransport, Transport};
use wpload::drivers::{Airframe, EntryOutcome, EntryPlan};
use wpload::geo::Position;
use wpload::profile::{Profile, Waypoint};
use wpload::progress::{ControlCommand, ProgressController, ProgressEvent};
use wpload::registry::DriverRegistry;
use wpload::session;

// ============================================================================
// Helper Functions
// ============================================================================

fn at(lat: f64, lon: f64) -> Position {
    Position::new(lat, lon).unwrap()
}

fn recording_channel() -> (CommandChannel, RecordingTransport) {
    let transport = RecordingTransport::new();
    let channel = CommandChannel::new(
        transport.clone(),
        InstantSleeper::new(),
        PressTiming::default(),
    );
    (channel, transport)
}

fn progress_pair() -> (ProgressController, Receiver<ProgressEvent>) {
    let (tx, rx) = mpsc::channel();
    (ProgressController::new(Some(tx), None), rx)
}

fn percents(events: &[ProgressEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Percent(p) => Some(*p),
            ProgressEvent::Done => None,
        })
        .collect()
}

/// Records datagrams and requests cancellation once `after` have been sent.
struct CancelAfter {
    inner: RecordingTransport,
    after: usize,
    cancel: Mutex<Option<Sender<ControlCommand>>>,
}

impl Transport for CancelAfter {
    fn send(&self, datagram: &[u8]) -> io::Result<usize> {
        let sent = self.inner.send(datagram)?;
        if self.inner.len() == self.after {
            if let Some(cancel) = self.cancel.lock().unwrap().take() {
                cancel.send(ControlCommand::Cancel).unwrap();
            }
        }
        Ok(sent)
    }
}

/// Records datagrams until `ok` have gone out, then refuses every send.
struct FailAfter {
    inner: RecordingTransport,
    ok: usize,
    attempts: Arc<AtomicUsize>,
}

impl Transport for FailAfter {
    fn send(&self, datagram: &[u8]) -> io::Result<usize> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt >= self.ok {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "simulator unreachable",
            ));
        }
        self.inner.send(datagram)
    }
}

// ============================================================================
// Integration Tests
// ============================================================================

/// Two navigation waypoints (the second in sequence 1) and one mission on
/// station 8: the mission is keyed first and the sequence starts from 0.
#[test]
fn test_hornet_missions_waypoints_and_sequence() {
    let (channel, transport) = recording_channel();
    let driver = Airframe::Hornet.driver(channel);
    let profile = Profile::with_points(
        "scenario",
        "hornet",
        vec![
            Waypoint::navigation(at(36.0, -115.0)),
            Waypoint::navigation(at(36.5, -115.5)).with_sequence(1),
            Waypoint::mission(8, at(37.0, -116.0)).unwrap(),
        ],
    )
    .unwrap();

    let plan = EntryPlan::build(&profile, &driver.limits());
    assert_eq!(driver.estimate_steps(&plan), 3);

    let (mut progress, events) = progress_pair();
    let outcome = driver.enter_all(&profile, &mut progress);
    assert_eq!(outcome, EntryOutcome::Completed);

    let presses = transport.presses();
    let first_mission = presses.iter().position(|p| p == "LEFT_DDI_PB_19").unwrap();
    let first_waypoint = presses.iter().position(|p| p == "AMPCD_PB_10").unwrap();
    assert!(first_mission < first_waypoint);

    let seq_page = presses.iter().position(|p| p == "AMPCD_PB_01").unwrap();
    assert_eq!(
        &presses[seq_page + 1..seq_page + 7],
        &["UFC_OS4", "UFC_0", "UFC_ENT", "UFC_OS4", "UFC_2", "UFC_ENT"]
    );

    let events: Vec<ProgressEvent> = events.try_iter().collect();
    assert_eq!(
        events,
        vec![
            ProgressEvent::Percent(25),
            ProgressEvent::Percent(50),
            ProgressEvent::Percent(75),
            ProgressEvent::Percent(100),
            ProgressEvent::Done,
        ]
    );
}

/// A cancel arriving mid-waypoint lets that waypoint finish and stops
/// before the next one.
#[test]
fn test_cancellation_stops_at_step_boundary() {
    let (cancel_tx, cancel_rx) = mpsc::channel();
    let recorder = RecordingTransport::new();
    let transport = CancelAfter {
        inner: recorder.clone(),
        after: 30,
        cancel: Mutex::new(Some(cancel_tx)),
    };
    let channel = CommandChannel::new(transport, InstantSleeper::new(), PressTiming::default());
    let driver = Airframe::Viper.driver(channel);

    let points = (0..10).map(|i| Waypoint::navigation(at(1.0 + f64::from(i), 1.0)));
    let profile = Profile::with_points("long", "viper", points).unwrap();

    let (events_tx, events_rx) = mpsc::channel();
    let mut progress = ProgressController::new(Some(events_tx), Some(cancel_rx));
    let outcome = driver.enter_all(&profile, &mut progress);

    assert_eq!(outcome, EntryOutcome::Cancelled);

    let datagrams = recorder.datagrams();
    let completed = datagrams.iter().filter(|d| *d == "ICP_DED_SW 2").count();
    assert_eq!(completed, 1);
    // The closing page navigation is never sent.
    assert!(!datagrams.iter().any(|d| d == "ICP_DED_SW 0"));

    let events: Vec<ProgressEvent> = events_rx.try_iter().collect();
    assert_eq!(percents(&events).iter().filter(|p| **p < 100).count(), 1);
    assert_eq!(
        &events[events.len() - 2..],
        &[ProgressEvent::Percent(100), ProgressEvent::Done]
    );
}

/// A transport error mid-waypoint aborts the entry without further sends
/// and still delivers the terminal progress events.
#[test]
fn test_transport_failure_mid_entry() {
    let recorder = RecordingTransport::new();
    let attempts = Arc::new(AtomicUsize::new(0));
    let transport = FailAfter {
        inner: recorder.clone(),
        ok: 10,
        attempts: attempts.clone(),
    };
    let channel = CommandChannel::new(transport, InstantSleeper::new(), PressTiming::default());
    let driver = Airframe::Warthog.driver(channel);

    let points = (0..3).map(|i| Waypoint::navigation(at(40.0 + f64::from(i), 40.0)));
    let profile = Profile::with_points("partial", "warthog", points).unwrap();

    let (mut progress, events) = progress_pair();
    let outcome = driver.enter_all(&profile, &mut progress);

    match outcome {
        EntryOutcome::Failed(reason) => assert!(reason.contains("simulator unreachable")),
        other => panic!("expected failure, got {:?}", other),
    }

    // The refused send is the last one attempted.
    assert_eq!(recorder.len(), 10);
    assert_eq!(attempts.load(Ordering::SeqCst), 11);

    let events: Vec<ProgressEvent> = events.try_iter().collect();
    assert_eq!(
        events,
        vec![
            ProgressEvent::Percent(25),
            ProgressEvent::Percent(100),
            ProgressEvent::Done,
        ]
    );
}

#[test]
fn test_progress_is_monotonic_and_terminates_once() {
    let (channel, _) = recording_channel();
    let driver = Airframe::Viper.driver(channel);
    let mut profile = Profile::with_points(
        "full",
        "viper",
        (0..7).map(|i| Waypoint::navigation(at(f64::from(i), f64::from(i)))),
    )
    .unwrap();
    let setup: BTreeMap<String, String> = [
        ("tacan_yard", "20,X,L"),
        ("f16_mfd_setup_nav", "8,6,4,8,6,4"),
        ("f16_mfd_setup_gnd", "8,6,4,8,6,4"),
        ("f16_cmds_setup_chaff", "2,0.02,2,1"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    profile.set_avionics(
        "full",
        wpload::profile::AvionicsSetup::from_map(&setup).unwrap(),
    );

    let (mut progress, events) = progress_pair();
    assert_eq!(driver.enter_all(&profile, &mut progress), EntryOutcome::Completed);

    let events: Vec<ProgressEvent> = events.try_iter().collect();
    let values = percents(&events);
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(values.iter().filter(|p| **p == 100).count(), 1);
    assert_eq!(events.last(), Some(&ProgressEvent::Done));
    // 7 waypoints + TACAN + 2 MFD modes + chaff
    assert_eq!(values.len(), 11 + 1);
}

#[test]
fn test_hornet_mission_cap_per_station() {
    let (channel, transport) = recording_channel();
    let driver = Airframe::Hornet.driver(channel);
    let missions = (0..8).map(|i| Waypoint::mission(8, at(f64::from(i), 10.0)).unwrap());
    let profile = Profile::with_points("msn", "hornet", missions).unwrap();

    let (mut progress, events) = progress_pair();
    driver.enter_all(&profile, &mut progress);

    let events: Vec<ProgressEvent> = events.try_iter().collect();
    assert_eq!(percents(&events).iter().filter(|p| **p < 100).count(), 6);

    let presses = transport.presses();
    assert!(presses.iter().any(|p| p == "LEFT_DDI_PB_11"));
    assert!(!presses.iter().any(|p| p == "LEFT_DDI_PB_12"));
}

#[test]
fn test_zero_elevation_matches_no_elevation() {
    for airframe in [Airframe::Viper, Airframe::Warthog, Airframe::Harrier, Airframe::Tomcat] {
        let transcript = |position: Position| {
            let (channel, transport) = recording_channel();
            let driver = airframe.driver(channel);
            let profile = Profile::with_points(
                "elev",
                airframe.id(),
                vec![Waypoint::navigation(position)],
            )
            .unwrap();
            driver.enter_all(&profile, &mut ProgressController::detached());
            transport.datagrams()
        };

        assert_eq!(
            transcript(at(10.0, 20.0).with_elevation(0)),
            transcript(at(10.0, 20.0)),
            "{} keyed a zero elevation",
            airframe
        );
        assert_ne!(
            transcript(at(10.0, 20.0).with_elevation(100)),
            transcript(at(10.0, 20.0)),
            "{} ignored a real elevation",
            airframe
        );
    }
}

#[test]
fn test_profile_file_through_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.json");
    std::fs::write(
        &path,
        r#"{
            "name": "Batumi",
            "aircraft": "warthog",
            "waypoints": [
                {"latitude": 41.6, "longitude": 41.6, "elevation": 30,
                 "name": "Batumi", "sequence": 0, "wp_type": "WP"}
            ]
        }"#,
    )
    .unwrap();

    let transport = RecordingTransport::new();
    let registry = DriverRegistry::with_channels(|_| {
        Ok(CommandChannel::new(
            transport.clone(),
            InstantSleeper::new(),
            PressTiming::default(),
        ))
    })
    .unwrap();
    let registry = session::share(registry);

    let profile = session::prepare_entry(&registry, &path, None).unwrap();
    let entry = session::spawn_entry(registry, profile, Duration::from_secs(5)).unwrap();

    let events: Vec<ProgressEvent> = entry.events().iter().collect();
    assert_eq!(entry.join(), EntryOutcome::Completed);
    assert_eq!(events.last(), Some(&ProgressEvent::Done));

    let presses = transport.presses();
    let name: String = presses
        .iter()
        .skip_while(|p| *p != "CDU_LSK_7R")
        .skip(4)
        .take(6)
        .map(|p| p.trim_start_matches("CDU_").to_string())
        .collect();
    assert_eq!(name, "BATUMI");
}
