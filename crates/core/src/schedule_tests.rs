// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

fn t(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap()
}

fn schedule(times: &[&str]) -> RestartSchedule {
    RestartSchedule::parse(times).unwrap()
}

#[yare::parameterized(
    two_digit_hour   = { "12:00", 12, 0 },
    one_digit_hour   = { "7:05",  7,  5 },
    midnight         = { "00:00", 0,  0 },
    last_minute      = { "23:59", 23, 59 },
    surrounding_ws   = { " 21:30 ", 21, 30 },
)]
fn parse_accepts(input: &str, hour: u8, minute: u8) {
    let parsed = parse_time_of_day(input).unwrap();
    assert_eq!((parsed.hour(), parsed.minute()), (hour, minute));
}

#[yare::parameterized(
    hour_out_of_range   = { "24:00" },
    minute_out_of_range = { "12:60" },
    one_digit_minute    = { "12:5" },
    three_digit_hour    = { "123:00" },
    missing_colon       = { "1200" },
    negative            = { "-1:00" },
    letters             = { "ab:cd" },
    empty               = { "" },
    with_seconds        = { "12:00:00" },
)]
fn parse_rejects(input: &str) {
    assert_eq!(
        parse_time_of_day(input),
        Err(ScheduleError::InvalidTime(input.to_string()))
    );
}

#[test]
fn time_of_day_displays_zero_padded() {
    assert_eq!(TimeOfDay::new(7, 5).unwrap().to_string(), "07:05");
}

#[test]
fn time_of_day_serializes_as_string() {
    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        at: TimeOfDay,
    }
    let parsed: Wrapper = serde_json::from_str(r#"{"at":"21:00"}"#).unwrap();
    assert_eq!(parsed.at, TimeOfDay::new(21, 0).unwrap());
    assert_eq!(serde_json::to_string(&parsed).unwrap(), r#"{"at":"21:00"}"#);
}

#[test]
fn time_of_day_rejects_invalid_string_on_deserialize() {
    let result: Result<TimeOfDay, _> = serde_json::from_str(r#""25:00""#);
    assert!(result.is_err());
}

#[test]
fn empty_schedule_is_rejected() {
    assert_eq!(RestartSchedule::new(vec![]), Err(ScheduleError::Empty));
}

#[test]
fn schedule_is_sorted_and_deduplicated() {
    let s = schedule(&["21:00", "12:00", "21:00"]);
    assert_eq!(s.to_string(), "12:00, 21:00");
}

#[test]
fn countdown_before_first_entry() {
    // 11:59:30 with [12:00, 21:00] -> 30 seconds
    let s = schedule(&["12:00", "21:00"]);
    assert_eq!(s.seconds_until_next(t(11, 59, 30)), 30);
    assert!(!s.is_restart_instant(t(11, 59, 30)));
}

#[test]
fn countdown_between_entries() {
    let s = schedule(&["12:00", "21:00"]);
    assert_eq!(s.seconds_until_next(t(13, 0, 0)), 8 * 3600);
    assert_eq!(s.next_restart(t(13, 0, 0)).to_string(), "21:00");
}

#[test]
fn countdown_wraps_past_midnight() {
    let s = schedule(&["12:00", "21:00"]);
    // 21:00:10 -> next is 12:00 tomorrow
    assert_eq!(s.seconds_until_next(t(21, 0, 10)), 15 * 3600 - 10);
    assert_eq!(s.next_restart(t(21, 0, 10)).to_string(), "12:00");
}

#[test]
fn countdown_is_zero_at_scheduled_instant() {
    let s = schedule(&["12:00"]);
    assert_eq!(s.seconds_until_next(t(12, 0, 0)), 0);
}

#[test]
fn countdown_one_second_after_instant_is_almost_a_day() {
    let s = schedule(&["12:00"]);
    assert_eq!(s.seconds_until_next(t(12, 0, 1)), SECONDS_PER_DAY - 1);
}

#[test]
fn countdown_out_of_order_input_uses_sorted_order() {
    let s = schedule(&["21:00", "06:00"]);
    assert_eq!(s.next_restart(t(5, 0, 0)).to_string(), "06:00");
}

#[test]
fn trigger_at_instant_but_not_one_second_later() {
    let s = schedule(&["12:00"]);
    assert!(s.is_restart_instant(t(12, 0, 0)));
    assert!(!s.is_restart_instant(t(12, 0, 1)));
    assert!(!s.is_restart_instant(t(12, 1, 0)));
}

#[test]
fn fires_within_covers_instant_at_window_end() {
    let s = schedule(&["12:00"]);
    assert!(s.fires_within(t(11, 59, 59), Duration::from_secs(1)));
}

#[test]
fn fires_within_excludes_window_start() {
    // Already consumed: the tick that saw 12:00:00 does not fire again.
    let s = schedule(&["12:00"]);
    assert!(!s.fires_within(t(12, 0, 0), Duration::from_secs(1)));
}

#[test]
fn fires_within_survives_skipped_ticks() {
    let s = schedule(&["12:00"]);
    assert!(s.fires_within(t(11, 59, 58), Duration::from_secs(5)));
    assert!(!s.fires_within(t(11, 59, 50), Duration::from_secs(5)));
}

#[test]
fn fires_within_wraps_midnight() {
    let s = schedule(&["00:00"]);
    assert!(s.fires_within(t(23, 59, 59), Duration::from_secs(2)));
}

#[test]
fn fires_within_zero_window_never_fires() {
    let s = schedule(&["12:00"]);
    assert!(!s.fires_within(t(11, 59, 59), Duration::ZERO));
}

#[test]
fn fires_within_full_day_always_fires() {
    let s = schedule(&["12:00"]);
    let day = Duration::from_secs(SECONDS_PER_DAY as u64);
    assert!(s.fires_within(t(12, 0, 0), day));
}

#[test]
fn duplicate_minutes_fire_once() {
    let s = schedule(&["12:00", "12:00"]);
    assert_eq!(s.times().len(), 1);
}

#[test]
fn schedule_cell_replace_is_visible_to_clones() {
    let cell = ScheduleCell::new(schedule(&["12:00"]));
    let other = cell.clone();

    cell.replace(schedule(&["06:00"]));

    assert_eq!(other.get().to_string(), "06:00");
    assert_eq!(other.seconds_until_next(t(5, 0, 0)), 3600);
}

fn arb_time_of_day() -> impl Strategy<Value = TimeOfDay> {
    (0u8..24, 0u8..60).prop_map(|(h, m)| TimeOfDay::new(h, m).unwrap())
}

fn arb_now() -> impl Strategy<Value = NaiveTime> {
    (0u32..SECONDS_PER_DAY)
        .prop_map(|s| NaiveTime::from_num_seconds_from_midnight_opt(s, 0).unwrap())
}

proptest! {
    #[test]
    fn countdown_is_always_within_one_day(
        times in prop::collection::vec(arb_time_of_day(), 1..6),
        now in arb_now(),
    ) {
        let s = RestartSchedule::new(times).unwrap();
        let secs = s.seconds_until_next(now);
        prop_assert!(secs < SECONDS_PER_DAY);
    }

    #[test]
    fn countdown_lands_on_a_scheduled_instant(
        times in prop::collection::vec(arb_time_of_day(), 1..6),
        now in arb_now(),
    ) {
        let s = RestartSchedule::new(times).unwrap();
        let secs = s.seconds_until_next(now);
        let target = now + chrono::Duration::seconds(secs as i64);
        prop_assert!(s.is_restart_instant(target));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn each_instant_fires_exactly_once_across_one_second_ticks(
        times in prop::collection::vec(arb_time_of_day(), 1..4),
        start in arb_now(),
    ) {
        // Walking a full day in one-second ticks fires once per distinct time.
        let s = RestartSchedule::new(times).unwrap();
        let mut fired = 0usize;
        let mut prev = start;
        for _ in 0..SECONDS_PER_DAY {
            if s.fires_within(prev, Duration::from_secs(1)) {
                fired += 1;
            }
            prev += chrono::Duration::seconds(1);
        }
        prop_assert_eq!(fired, s.times().len());
    }
}
