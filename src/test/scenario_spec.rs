use super::{messages, quiet_session};
use crate::demo::demo_scenario;
use crate::net::{DeviceId, HubStatus};
use crate::session::{Action, ScenarioError, ScenarioSpec, Severity};
use crate::sim::SimTime;

const SCENARIO: &str = r#"{
  "schema_version": 1,
  "meta": { "name": "two-clicks" },
  "session": { "devices": 4, "seed": 9, "ambient_jitter": false },
  "steps": [
    { "at_ms": 0, "action": "click_device", "device": 1 },
    { "at_ms": 200, "action": "click_device", "device": 4 },
    { "at_ms": 5000, "action": "toggle_hub_failure" },
    { "at_ms": 5100, "action": "transmit", "from": 2, "to": 3 },
    { "at_ms": 6000, "action": "set_speed", "speed": 5 }
  ]
}"#;

#[test]
fn parses_actions_and_session_overrides() {
    let spec = ScenarioSpec::from_json(SCENARIO).expect("valid scenario");
    assert_eq!(spec.steps.len(), 5);
    assert_eq!(
        spec.steps[1].action,
        Action::ClickDevice { device: DeviceId(4) }
    );
    assert_eq!(
        spec.steps[3].action,
        Action::Transmit {
            from: DeviceId(2),
            to: DeviceId(3)
        }
    );
    let cfg = spec.session.as_ref().expect("session block");
    assert_eq!(cfg.devices, 4);
    assert_eq!(cfg.seed, 9);
    assert!(!cfg.ambient_jitter);
    // 未给出的字段取默认值
    assert_eq!(cfg.speed, 3);
    assert_eq!(cfg.timing.recovery_step_pct, 10);
    assert_eq!(spec.last_at(), SimTime::from_millis(6_000));
    assert!(spec.validate(cfg.devices).is_ok());
}

#[test]
fn validate_reports_the_offending_step() {
    let spec = ScenarioSpec::from_json(SCENARIO).expect("valid scenario");
    match spec.validate(3) {
        Err(ScenarioError::UnknownDevice { step, device, devices }) => {
            assert_eq!((step, device, devices), (1, DeviceId(4), 3));
        }
        other => panic!("unexpected {other:?}"),
    }

    let bad_speed = SCENARIO.replace(r#""speed": 5"#, r#""speed": 9"#);
    let spec = ScenarioSpec::from_json(&bad_speed).expect("valid json");
    assert!(matches!(
        spec.validate(6),
        Err(ScenarioError::InvalidSpeed { step: 4, speed: 9 })
    ));

    let wrong_version = SCENARIO.replace(r#""schema_version": 1"#, r#""schema_version": 2"#);
    let spec = ScenarioSpec::from_json(&wrong_version).expect("valid json");
    assert!(matches!(
        spec.validate(6),
        Err(ScenarioError::UnsupportedSchema(2))
    ));
}

#[test]
fn unknown_actions_fail_to_parse() {
    let raw = r#"{ "schema_version": 1, "steps": [ { "at_ms": 0, "action": "reboot" } ] }"#;
    assert!(matches!(
        ScenarioSpec::from_json(raw),
        Err(ScenarioError::Parse(_))
    ));
}

#[test]
fn scheduled_steps_drive_the_session() {
    let spec = ScenarioSpec::from_json(SCENARIO).expect("valid scenario");
    let (mut sim, mut session) = quiet_session();
    spec.schedule_into(&mut sim);
    sim.run(&mut session);

    assert_eq!(session.stats().packets_sent, 1);
    assert_eq!(session.hub().status, HubStatus::Failed);
    assert_eq!(session.speed(), 5);
    assert!(messages(&session, Severity::Error)
        .iter()
        .any(|m| m == "Transmission failed - Hub is down, network unreachable"));
}

#[test]
fn failed_actions_do_not_stop_the_scenario() {
    let raw = r#"{
      "schema_version": 1,
      "steps": [
        { "at_ms": 0, "action": "set_power", "device": 2, "online": false },
        { "at_ms": 100, "action": "transmit", "from": 1, "to": 2 },
        { "at_ms": 200, "action": "start_bulk_traffic" },
        { "at_ms": 300, "action": "start_bulk_traffic" }
      ]
    }"#;
    let spec = ScenarioSpec::from_json(raw).expect("valid scenario");
    let (mut sim, mut session) = quiet_session();
    spec.schedule_into(&mut sim);
    sim.run(&mut session);

    let errors = messages(&session, Severity::Error);
    assert!(errors.iter().any(|m| m.contains("PC 2 - Device is offline")));
    assert!(errors
        .iter()
        .any(|m| m == "Network traffic simulation already in progress"));
    assert!(!session.is_bulk_running());
    assert_eq!(session.stats().packets_sent, 8);
}

#[test]
fn demo_scenario_is_valid_for_the_default_session() {
    let spec = demo_scenario();
    assert!(spec.validate(6).is_ok());
    assert!(spec.steps.windows(2).all(|w| w[0].at_ms <= w[1].at_ms));
    assert_eq!(spec.last_at(), SimTime::from_millis(67_000));

    let json = serde_json::to_string(&spec).expect("serializes");
    let back = ScenarioSpec::from_json(&json).expect("parses back");
    assert_eq!(back.steps.len(), spec.steps.len());
}

#[test]
fn demo_scenario_runs_end_to_end() {
    let spec = demo_scenario();
    let (mut sim, mut session) = quiet_session();
    spec.schedule_into(&mut sim);
    sim.run(&mut session);

    assert!(!session.is_bulk_running());
    assert!(!session.is_congested());
    assert_eq!(session.hub().status, HubStatus::Active);
    assert!(session.stats().packets_sent >= 2);
    assert!(session.stats().packets_collided > 0);
    assert_eq!(session.in_flight(), 0);
    assert!(session.check_invariants().is_ok());
}
