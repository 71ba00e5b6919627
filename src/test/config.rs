use crate::demo::build_session;
use crate::net::{DeviceId, DeviceRegistry, MacAddr, MAX_DEVICES};
use crate::session::{ConfigError, ScenarioError, ScenarioSpec, SessionConfig, TimingConfig};
use crate::sim::SimTime;

#[test]
fn partial_json_fills_in_defaults() {
    let cfg = SessionConfig::from_json(r#"{ "seed": 5, "timing": { "collision_rounds": 4 } }"#)
        .expect("valid config");
    assert_eq!(cfg.seed, 5);
    assert_eq!(cfg.devices, 6);
    assert_eq!(cfg.timing.collision_rounds, 4);
    assert_eq!(cfg.timing.ambient_tick_ms, 1_000);
}

#[test]
fn zero_tick_intervals_are_rejected() {
    let err = SessionConfig::from_json(r#"{ "timing": { "ambient_tick_ms": 0 } }"#)
        .expect_err("zero ambient tick");
    assert!(matches!(err, ConfigError::ZeroInterval("ambient_tick_ms")));

    let err = SessionConfig::from_json(r#"{ "timing": { "recovery_tick_ms": 0 } }"#)
        .expect_err("zero recovery tick");
    assert!(matches!(err, ConfigError::ZeroInterval("recovery_tick_ms")));
}

#[test]
fn out_of_range_values_are_rejected() {
    assert!(matches!(
        SessionConfig::from_json(r#"{ "devices": 256 }"#),
        Err(ConfigError::DeviceCount(256))
    ));
    assert!(matches!(
        SessionConfig::from_json(r#"{ "devices": 0 }"#),
        Err(ConfigError::DeviceCount(0))
    ));
    assert!(matches!(
        SessionConfig::from_json(r#"{ "speed": 7 }"#),
        Err(ConfigError::Speed(7))
    ));
    assert!(matches!(
        SessionConfig::from_json(r#"{ "timing": { "recovery_step_pct": 0 } }"#),
        Err(ConfigError::RecoveryStep(0))
    ));
    assert!(matches!(
        SessionConfig::from_json(
            r#"{ "timing": { "bulk_pause_min_ms": 5000, "bulk_pause_max_ms": 100 } }"#
        ),
        Err(ConfigError::BulkPauseRange { min: 5000, max: 100 })
    ));
    assert!(matches!(
        SessionConfig::from_json("{ not json"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn scenario_session_block_is_validated() {
    let raw = r#"{
      "schema_version": 1,
      "session": { "timing": { "ambient_tick_ms": 0 } },
      "steps": []
    }"#;
    let spec = ScenarioSpec::from_json(raw).expect("valid json");
    assert!(matches!(
        spec.validate(6),
        Err(ScenarioError::Config(ConfigError::ZeroInterval("ambient_tick_ms")))
    ));
}

#[test]
fn zero_ambient_tick_built_in_code_still_advances_time() {
    let cfg = SessionConfig {
        timing: TimingConfig {
            ambient_tick_ms: 0,
            ..TimingConfig::default()
        },
        ..SessionConfig::default()
    };
    assert!(cfg.validate().is_err());

    let (mut sim, mut session) = build_session(cfg, false);
    sim.run_until(SimTime::from_millis(20), &mut session);
    assert_eq!(sim.now(), SimTime::from_millis(20));
}

#[test]
fn registry_never_exceeds_the_mac_range() {
    let reg = DeviceRegistry::new(300);
    assert_eq!(reg.len(), MAX_DEVICES);

    let mut macs = reg.iter().map(|d| d.mac).collect::<Vec<_>>();
    macs.sort_by_key(|m| m.0);
    macs.dedup();
    assert_eq!(macs.len(), MAX_DEVICES);
    assert_eq!(
        MacAddr::for_device(DeviceId(MAX_DEVICES)).to_string(),
        "00:1A:2B:3C:4D:FF"
    );
}
