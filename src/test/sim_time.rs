use crate::sim::SimTime;

#[test]
fn sim_time_unit_conversions() {
    assert_eq!(SimTime::from_millis(1), SimTime(1_000_000));
    assert_eq!(SimTime::from_millis(1_500).as_millis(), 1_500);
}

#[test]
fn sim_time_unit_conversions_saturate_on_overflow() {
    assert_eq!(SimTime::from_millis(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime(u64::MAX).saturating_add(SimTime(1)), SimTime(u64::MAX));
    assert_eq!(SimTime(1).saturating_sub(SimTime(5)), SimTime::ZERO);
}

#[test]
fn fractional_millis_round_to_nanos_and_reject_garbage() {
    assert_eq!(SimTime::from_millis_f64(166.666_666_7), SimTime(166_666_667));
    assert_eq!(SimTime::from_millis_f64(-3.0), SimTime::ZERO);
    assert_eq!(SimTime::from_millis_f64(f64::NAN), SimTime::ZERO);
    assert_eq!(SimTime::from_millis_f64(f64::INFINITY), SimTime::ZERO);
}

#[test]
fn display_is_minutes_seconds_millis() {
    assert_eq!(SimTime::ZERO.to_string(), "00:00.000");
    assert_eq!(SimTime::from_millis(61_234).to_string(), "01:01.234");
}

#[test]
fn serializes_as_nanoseconds() {
    let v = serde_json::to_value(SimTime::from_millis(3)).expect("serialize");
    assert_eq!(v, 3_000_000);
}
