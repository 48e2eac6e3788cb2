//! Tests for busy intervals and merging them over a window.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use planner_core::freebusy::merge_busy_periods;
use planner_core::BusyInterval;

fn at(hour: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 2)
        .unwrap()
        .and_hms_opt(hour, min, 0)
        .unwrap()
}

/// Busy interval on 2026-03-02 in UTC+01:00.
fn busy(start_hour: u32, start_min: u32, minutes: i64) -> BusyInterval {
    let offset = FixedOffset::east_opt(3600).unwrap();
    BusyInterval::new(
        offset
            .with_ymd_and_hms(2026, 3, 2, start_hour, start_min, 0)
            .unwrap(),
        minutes,
    )
}

#[test]
fn overlapping_intervals_merged_correctly() {
    // 10:00-11:30 and 11:00-12:00 -> busy 10:00-12:00
    let intervals = vec![busy(10, 0, 90), busy(11, 0, 60)];

    let merged = merge_busy_periods(&intervals, at(8, 0), at(17, 0));
    assert_eq!(merged, vec![(at(10, 0), at(12, 0))]);
}

#[test]
fn adjacent_intervals_coalesce() {
    let merged = merge_busy_periods(&[busy(9, 0, 30), busy(9, 30, 30)], at(8, 0), at(17, 0));
    assert_eq!(merged, vec![(at(9, 0), at(10, 0))]);
}

#[test]
fn unsorted_input_is_handled() {
    let merged = merge_busy_periods(&[busy(14, 0, 60), busy(9, 0, 60)], at(8, 0), at(17, 0));
    assert_eq!(merged, vec![(at(9, 0), at(10, 0)), (at(14, 0), at(15, 0))]);
}

#[test]
fn intervals_are_clipped_to_the_window() {
    // 07:00-09:00 starts before the window, 16:30-18:00 ends after it,
    // 20:00-21:00 is entirely outside.
    let intervals = vec![busy(7, 0, 120), busy(16, 30, 90), busy(20, 0, 60)];

    let merged = merge_busy_periods(&intervals, at(8, 0), at(17, 0));

    assert_eq!(
        merged,
        vec![(at(8, 0), at(9, 0)), (at(16, 30), at(17, 0))]
    );
}

#[test]
fn wall_clock_time_is_used_regardless_of_offset() {
    // 09:00 at UTC-05:00 is still 09:00 on the user's timeline.
    let offset = FixedOffset::west_opt(5 * 3600).unwrap();
    let interval = BusyInterval::new(offset.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(), 60);

    let merged = merge_busy_periods(&[interval], at(8, 0), at(17, 0));
    assert_eq!(merged, vec![(at(9, 0), at(10, 0))]);
}

#[test]
fn no_intervals_nothing_merged() {
    assert!(merge_busy_periods(&[], at(8, 0), at(17, 0)).is_empty());
}

#[test]
fn interval_covering_the_window_is_one_period() {
    let merged = merge_busy_periods(&[busy(9, 0, 180)], at(9, 0), at(12, 0));
    assert_eq!(merged, vec![(at(9, 0), at(12, 0))]);
}

#[test]
fn busy_interval_end_adds_duration() {
    let interval = busy(23, 30, 60);
    assert_eq!(interval.local_end(), at(0, 30) + chrono::Duration::days(1));
    assert_eq!(interval.end().naive_local(), interval.local_end());
}

#[test]
fn out_of_range_duration_saturates_instead_of_panicking() {
    let interval = busy(9, 0, i64::MAX);
    assert_eq!(interval.local_end(), NaiveDateTime::MAX);
    assert_eq!(interval.end(), DateTime::<Utc>::MAX_UTC.fixed_offset());

    let merged = merge_busy_periods(&[interval], at(8, 0), at(17, 0));
    assert_eq!(merged, vec![(at(9, 0), at(17, 0))]);

    let backwards = busy(9, 0, i64::MIN);
    assert_eq!(backwards.local_end(), NaiveDateTime::MIN);
    assert!(merge_busy_periods(&[backwards], at(8, 0), at(17, 0)).is_empty());
}
