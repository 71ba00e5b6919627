use super::{messages, quiet_session};
use crate::error::SessionError;
use crate::net::DeviceId;
use crate::session::Severity;
use crate::sim::SimTime;
use crate::traffic::TransmissionPhase;

fn power_off(session: &mut crate::session::NetworkSession, ids: &[usize]) {
    for &n in ids {
        session
            .set_power(DeviceId(n), false, SimTime::ZERO)
            .expect("known device");
    }
}

#[test]
fn bulk_traffic_needs_two_online_devices() {
    let (mut sim, mut session) = quiet_session();
    power_off(&mut session, &[2, 3, 4, 5, 6]);
    assert_eq!(session.devices().online_count(), 1);

    let err = session.run_bulk_traffic(&mut sim).expect_err("only one online");
    assert!(matches!(
        err,
        SessionError::InsufficientOnlineDevices { online: 1 }
    ));
    assert!(!session.is_bulk_running());
    assert!(messages(&session, Severity::Error)
        .iter()
        .any(|m| m.contains("at least 2 online PCs")));
}

#[test]
fn second_start_while_running_is_rejected() {
    let (mut sim, mut session) = quiet_session();
    session.run_bulk_traffic(&mut sim).expect("first start");
    let err = session.run_bulk_traffic(&mut sim).expect_err("already running");
    assert!(matches!(err, SessionError::AlreadyRunning));
}

#[test]
fn full_run_sends_min_of_eight_and_twice_online_count() {
    let (mut sim, mut session) = quiet_session();
    session.run_bulk_traffic(&mut sim).expect("starts");
    assert!(session.is_bulk_running());
    sim.run(&mut session);

    assert!(!session.is_bulk_running());
    assert_eq!(session.stats().packets_sent, 8);
    assert_eq!(session.transmissions().count(), 8);
    assert!(session
        .transmissions()
        .all(|t| t.sender != t.receiver && t.bulk_run == Some(0)));
    let success = messages(&session, Severity::Success);
    assert_eq!(
        success.last().map(String::as_str),
        Some("Network traffic simulation completed")
    );
}

#[test]
fn two_online_devices_give_four_transmissions() {
    let (mut sim, mut session) = quiet_session();
    power_off(&mut session, &[3, 4, 5, 6]);
    session.run_bulk_traffic(&mut sim).expect("starts");
    sim.run(&mut session);
    assert_eq!(session.stats().packets_sent, 4);
}

#[test]
fn transmissions_are_serial() {
    let (mut sim, mut session) = quiet_session();
    session.run_bulk_traffic(&mut sim).expect("starts");
    sim.run(&mut session);

    let mut spans = session
        .transmissions()
        .map(|t| (t.started_at, t.finished_at.expect("finished")))
        .collect::<Vec<_>>();
    spans.sort();
    for w in spans.windows(2) {
        let gap = w[1].0.saturating_sub(w[0].1);
        assert!(
            gap >= SimTime::from_millis(1_000) && gap <= SimTime::from_millis(3_000),
            "pause between transmissions out of range: {gap:?}"
        );
    }
}

#[test]
fn devices_that_go_offline_are_skipped() {
    let (mut sim, mut session) = quiet_session();
    power_off(&mut session, &[4, 5, 6]);
    session.run_bulk_traffic(&mut sim).expect("starts");
    session
        .set_power(DeviceId(3), false, sim.now())
        .expect("known device");
    sim.run(&mut session);

    assert!(!session.is_bulk_running());
    assert!(session.stats().packets_sent <= 6);
    assert!(session
        .transmissions()
        .all(|t| t.sender != DeviceId(3) && t.receiver != DeviceId(3)));
}

#[test]
fn reset_stops_a_running_bulk_simulation() {
    let (mut sim, mut session) = quiet_session();
    session.run_bulk_traffic(&mut sim).expect("starts");
    sim.run_until(SimTime::from_millis(3_000), &mut session);
    session.reset(&mut sim);
    assert!(!session.is_bulk_running());
    let sent_at_reset = session.stats().packets_sent;

    sim.run(&mut session);
    assert_eq!(session.stats().packets_sent, sent_at_reset);
    assert!(sent_at_reset < 8);
    assert!(!messages(&session, Severity::Success)
        .iter()
        .any(|m| m == "Network traffic simulation completed"));
    assert!(session
        .transmissions()
        .all(|t| !t.phase.is_in_flight()));
    assert!(session
        .transmissions()
        .any(|t| matches!(t.phase, TransmissionPhase::Completed)));
}

#[test]
fn bulk_run_survives_hub_failure_and_reports_errors() {
    let (mut sim, mut session) = quiet_session();
    session.run_bulk_traffic(&mut sim).expect("starts");
    sim.run_until(SimTime::from_millis(100), &mut session);
    session.fail_hub(&mut sim);
    sim.run(&mut session);

    assert!(!session.is_bulk_running());
    assert_eq!(session.stats().packets_sent, 0);
    assert!(messages(&session, Severity::Error)
        .iter()
        .any(|m| m.contains("Hub is down")));
}
