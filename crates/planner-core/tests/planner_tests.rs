//! Tests for the planning-assistant state machine.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use planner_core::schedule::{ScheduleEntry, ScheduleResponse};
use planner_core::{PlanningAssistant, TimeGrid};

fn t(hour: u32, min: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, min, 0).unwrap()
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

fn at(day: u32, hour: u32, min: u32) -> NaiveDateTime {
    date(day).and_time(t(hour, min))
}

fn assistant(selected_start: NaiveDateTime, selected_end: NaiveDateTime) -> PlanningAssistant {
    let grid = TimeGrid::with_defaults(t(8, 0), t(18, 0)).unwrap();
    PlanningAssistant::new(
        grid,
        vec!["alice".to_string(), "bob".to_string()],
        selected_start,
        selected_end,
        date(16),
    )
}

fn schedule_with(user: &str, start: &str, duration: i32) -> ScheduleResponse {
    let mut users = BTreeMap::new();
    users.insert(
        user.to_string(),
        vec![ScheduleEntry {
            start: start.parse().unwrap(),
            end: None,
            duration,
        }],
    );
    ScheduleResponse {
        users,
        available_times: vec![],
    }
}

#[test]
fn opens_on_future_event_day() {
    let planner = assistant(at(20, 10, 0), at(20, 11, 0));
    assert_eq!(planner.current_date(), date(20));
    assert_eq!(planner.duration_minutes(), 60);
}

#[test]
fn opens_today_for_past_event() {
    let planner = assistant(at(2, 10, 0), at(2, 10, 30));
    assert_eq!(planner.current_date(), date(16));
    assert_eq!(planner.duration_minutes(), 30);
}

#[test]
fn zero_length_event_defaults_to_one_slot() {
    let planner = assistant(at(20, 10, 0), at(20, 10, 0));
    assert_eq!(planner.duration_minutes(), 15);
}

#[test]
fn loading_until_first_response() {
    let mut planner = assistant(at(20, 10, 0), at(20, 11, 0));
    assert!(planner.is_loading());
    assert!(planner.view().is_none());

    let (ticket, query) = planner.refresh();
    assert_eq!(query.users, vec!["alice", "bob"]);
    assert_eq!(query.start, at(20, 0, 0));
    assert_eq!(query.end, at(21, 0, 0));

    let grid = planner
        .apply_response(ticket, &ScheduleResponse::default())
        .expect("current ticket is applied");
    assert_eq!(grid.date, date(20));
    assert!(!planner.is_loading());
}

#[test]
fn navigation_moves_the_day_and_issues_queries() {
    let mut planner = assistant(at(20, 10, 0), at(20, 11, 0));

    let (_, query) = planner.next_day();
    assert_eq!(planner.current_date(), date(21));
    assert_eq!(query.start, at(21, 0, 0));

    planner.prev_day();
    planner.prev_day();
    assert_eq!(planner.current_date(), date(19));

    let (_, query) = planner.go_today();
    assert_eq!(planner.current_date(), date(16));
    assert_eq!(query.start, at(16, 0, 0));
}

#[test]
fn stale_response_does_not_overwrite_newer_day() {
    let mut planner = assistant(at(20, 10, 0), at(20, 11, 0));

    let (day_20, _) = planner.refresh();
    let (day_21, _) = planner.next_day();

    // Day 21 answers first.
    let fresh = schedule_with("alice", "2026-03-21T09:00:00+00:00", 60);
    assert!(planner.apply_response(day_21, &fresh).is_some());

    // The slow day-20 response must be ignored.
    let slow = schedule_with("alice", "2026-03-20T13:00:00+00:00", 60);
    assert!(planner.apply_response(day_20, &slow).is_none());

    let view = planner.view().unwrap();
    assert_eq!(view.date, date(21));
    assert_eq!(view.user_layout["alice"][0].offset_pixels, 200.0);
}

#[test]
fn view_is_kept_while_next_query_is_pending() {
    let mut planner = assistant(at(20, 10, 0), at(20, 11, 0));
    let (ticket, _) = planner.refresh();
    planner.apply_response(ticket, &ScheduleResponse::default());

    planner.next_day();

    assert!(planner.is_loading());
    assert_eq!(planner.view().unwrap().date, date(20));
}

#[test]
fn duration_change_is_used_for_free_slots() {
    let mut planner = assistant(at(20, 10, 0), at(20, 10, 15));
    assert!(planner.set_duration(0).is_none());
    assert!(planner.set_duration(-30).is_none());
    assert!(planner.set_duration(i64::MAX).is_none());
    assert_eq!(planner.duration_minutes(), 15);

    let (ticket, _) = planner.set_duration(600).unwrap();
    let grid = planner
        .apply_response(ticket, &schedule_with("bob", "2026-03-20T17:00:00+00:00", 15))
        .unwrap();

    // A ten-hour meeting only fits starting at 08:00, and bob is busy at 17:00.
    assert!(grid.free_slots.is_empty());
}

#[test]
fn selecting_a_column_builds_event_time() {
    let mut planner = assistant(at(20, 10, 0), at(20, 10, 45));
    planner.next_day();

    let selected = planner.select_slot(t(16, 30)).unwrap();

    assert_eq!(selected.start, at(21, 16, 30));
    assert_eq!(selected.end, at(21, 17, 15));
    assert_eq!(selected.start_time, "16:30");
    assert_eq!(selected.end_time, "17:15");
}

#[test]
fn selecting_outside_the_grid_is_rejected() {
    let planner = assistant(at(20, 10, 0), at(20, 11, 0));
    assert!(planner.select_slot(t(7, 45)).is_none());
    assert!(planner.select_slot(t(9, 10)).is_none());
    assert!(planner.select_slot(t(18, 0)).is_none());
}
