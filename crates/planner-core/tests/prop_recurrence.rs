//! Property-based tests for the recurrence codec using proptest.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use proptest::prelude::*;
use planner_core::recurrence::{decode, encode, Frequency, RecurrenceRule, WeekdaySelection};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_weekday() -> impl Strategy<Value = Weekday> {
    prop_oneof![
        Just(Weekday::Mon),
        Just(Weekday::Tue),
        Just(Weekday::Wed),
        Just(Weekday::Thu),
        Just(Weekday::Fri),
        Just(Weekday::Sat),
        Just(Weekday::Sun),
    ]
}

/// Non-empty selection in arbitrary order.
fn arb_selection() -> impl Strategy<Value = WeekdaySelection> {
    prop::collection::vec(arb_weekday(), 1..10).prop_map(WeekdaySelection::from_days)
}

/// Whole-second UTC instant in the 2025-2030 range.
fn arb_until() -> impl Strategy<Value = DateTime<Utc>> {
    (2025i32..=2030, 1u32..=12, 1u32..=28, 0u32..=23, 0u32..=59, 0u32..=59).prop_map(
        |(y, m, d, h, min, s)| {
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, s)
                .unwrap()
                .and_utc()
        },
    )
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: weekly rules round-trip
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn weekly_rule_round_trips(
        interval in 1u32..=10,
        days in arb_selection(),
        until in arb_until(),
    ) {
        let rule = RecurrenceRule {
            interval,
            by_weekday: days,
            until: Some(until),
            ..RecurrenceRule::default()
        };

        let decoded = decode(&encode(&rule)).expect("encoded rule must decode");

        prop_assert_eq!(decoded.frequency, rule.frequency);
        prop_assert_eq!(decoded.interval, rule.interval);
        prop_assert!(decoded.by_weekday.same_days(&rule.by_weekday));
        prop_assert_eq!(decoded.until, rule.until);
    }
}

// ---------------------------------------------------------------------------
// Property 1b: rules built through the constructors round-trip exactly
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn built_rule_round_trips_exactly(
        monthly in any::<bool>(),
        interval in 1u32..=10,
        days in prop::collection::vec(arb_weekday(), 0..10),
        until in prop::option::of(arb_until()),
    ) {
        let base = if monthly {
            RecurrenceRule::monthly(interval)
        } else {
            RecurrenceRule::weekly(interval)
        };
        let mut rule = base.with_weekdays(days);
        rule.until = until;

        let decoded = decode(&encode(&rule)).expect("encoded rule must decode");

        prop_assert_eq!(&decoded, &rule);
        if rule.frequency == Frequency::Monthly {
            prop_assert!(decoded.by_weekday.is_empty());
        }
    }
}

// ---------------------------------------------------------------------------
// Property 2: no BYDAY without weekdays, no trailing separator ever
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn empty_selection_never_emits_byday(
        interval in 1u32..=100,
        until in prop::option::of(arb_until()),
    ) {
        let rule = RecurrenceRule { interval, until, ..RecurrenceRule::default() };
        let token = encode(&rule);

        prop_assert!(!token.contains("BYDAY"));
        prop_assert!(!token.ends_with(';'));
        prop_assert!(token.starts_with("RRULE:FREQ=WEEKLY;INTERVAL="));
    }
}

// ---------------------------------------------------------------------------
// Property 3: decode never panics on arbitrary input
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn decode_never_panics(token in "[A-Za-z0-9:;=,\\- ]{0,60}") {
        let _ = decode(&token);
    }
}
