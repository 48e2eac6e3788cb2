//! Recurrence expansion -- turns a recurring event into the busy intervals it
//! occupies within a time window.
//!
//! Wraps the `rrule` crate (v0.13) and `chrono-tz`. The event's DTSTART is a
//! wall-clock time in an IANA timezone, so occurrences keep their local time
//! of day across DST changes.

use chrono::{DateTime, NaiveDateTime, TimeDelta, TimeZone, Utc};
use rrule::RRuleSet;
use tracing::debug;

use crate::error::{PlannerError, Result};
use crate::freebusy::BusyInterval;
use crate::recurrence::{self, RecurrenceRule};

/// Upper bound on generated instances per expansion.
pub const MAX_INSTANCES: u16 = 500;

/// Expand `rule` starting at `dtstart` and return the occurrences overlapping
/// `[window_start, window_end)`.
///
/// `until` on the rule is applied as an inclusive bound on occurrence start.
///
/// # Errors
/// Returns `PlannerError::InvalidTimezone` for an unknown IANA name,
/// `PlannerError::InvalidTime` for a duration outside chrono's range and
/// `PlannerError::InvalidRule` if the `rrule` crate rejects the rule.
pub fn expand_occurrences(
    rule: &RecurrenceRule,
    dtstart: NaiveDateTime,
    timezone: &str,
    duration_minutes: i64,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Vec<BusyInterval>> {
    let tz: chrono_tz::Tz = timezone
        .parse()
        .map_err(|_| PlannerError::InvalidTimezone(timezone.to_string()))?;

    let duration = occurrence_length(duration_minutes)?;
    if window_start >= window_end {
        return Ok(Vec::new());
    }

    // UNTIL is filtered below rather than handed to the rrule crate, which
    // requires UNTIL and DTSTART to share a timezone.
    let unbounded = RecurrenceRule {
        until: None,
        ..rule.clone()
    };
    let rrule_text = format!(
        "DTSTART;TZID={}:{}\n{}",
        timezone,
        dtstart.format("%Y%m%dT%H%M%S"),
        unbounded.encode()
    );

    let rrule_set: RRuleSet = rrule_text
        .parse()
        .map_err(|e| PlannerError::InvalidRule(format!("{}", e)))?;

    // Bound the set to the window so the instance cap counts from the window,
    // not from DTSTART. Both bounds are inclusive; `overlaps` trims the edges.
    let earliest_start = window_start
        .checked_sub_signed(duration)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let instances = rrule_set
        .after(earliest_start.with_timezone(&rrule::Tz::UTC))
        .before(window_end.with_timezone(&rrule::Tz::UTC))
        .all(MAX_INSTANCES);
    if instances.limited {
        debug!(max = MAX_INSTANCES, "recurrence expansion hit the instance cap");
    }

    let occurrences = instances
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc))
        .take_while(|start| rule.until.is_none_or(|until| *start <= until))
        .filter(|start| overlaps(*start, duration, window_start, window_end))
        .map(|start| BusyInterval::new(start.with_timezone(&tz).fixed_offset(), duration_minutes))
        .collect();

    Ok(occurrences)
}

/// Expand an event's stored recurrence token.
///
/// An empty token is a one-off event: its single occurrence is returned if it
/// overlaps the window.
///
/// # Errors
/// Everything [`expand_occurrences`] and [`recurrence::decode`] can return, plus
/// `PlannerError::InvalidTime` when `dtstart` does not exist in `timezone`.
pub fn expand_token(
    token: &str,
    dtstart: NaiveDateTime,
    timezone: &str,
    duration_minutes: i64,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Vec<BusyInterval>> {
    if !token.trim().is_empty() {
        let rule = recurrence::decode(token)?;
        return expand_occurrences(
            &rule,
            dtstart,
            timezone,
            duration_minutes,
            window_start,
            window_end,
        );
    }

    let tz: chrono_tz::Tz = timezone
        .parse()
        .map_err(|_| PlannerError::InvalidTimezone(timezone.to_string()))?;
    let start = tz.from_local_datetime(&dtstart).earliest().ok_or_else(|| {
        PlannerError::InvalidTime(format!("{} does not exist in {}", dtstart, timezone))
    })?;

    let duration = occurrence_length(duration_minutes)?;
    if overlaps(start.with_timezone(&Utc), duration, window_start, window_end) {
        Ok(vec![BusyInterval::new(start.fixed_offset(), duration_minutes)])
    } else {
        Ok(Vec::new())
    }
}

fn occurrence_length(duration_minutes: i64) -> Result<TimeDelta> {
    TimeDelta::try_minutes(duration_minutes).ok_or_else(|| {
        PlannerError::InvalidTime(format!(
            "occurrence length of {} minutes is out of range",
            duration_minutes
        ))
    })
}

fn overlaps(
    start: DateTime<Utc>,
    duration: TimeDelta,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> bool {
    start < window_end
        && (start >= window_start
            || start
                .checked_add_signed(duration)
                .is_none_or(|end| end > window_start))
}
