//! Busy intervals and their union over a planning window.
//!
//! All arithmetic is done on the user's wall-clock time: the schedule backend
//! already converts every interval into the requesting user's location.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A period during which a user is busy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<FixedOffset>,
    pub duration_minutes: i64,
}

impl BusyInterval {
    pub fn new(start: DateTime<FixedOffset>, duration_minutes: i64) -> Self {
        Self {
            start,
            duration_minutes,
        }
    }

    /// End instant. Saturates at chrono's range for absurd durations.
    pub fn end(&self) -> DateTime<FixedOffset> {
        self.start
            .checked_add_signed(self.length())
            .unwrap_or_else(|| {
                let bound = if self.duration_minutes < 0 {
                    DateTime::<Utc>::MIN_UTC
                } else {
                    DateTime::<Utc>::MAX_UTC
                };
                bound.fixed_offset()
            })
    }

    /// Length as a `TimeDelta`, saturated to chrono's range.
    pub fn length(&self) -> TimeDelta {
        TimeDelta::try_minutes(self.duration_minutes).unwrap_or(if self.duration_minutes < 0 {
            TimeDelta::MIN
        } else {
            TimeDelta::MAX
        })
    }

    /// Start as wall-clock time in the interval's own offset.
    pub fn local_start(&self) -> NaiveDateTime {
        self.start.naive_local()
    }

    pub fn local_end(&self) -> NaiveDateTime {
        self.local_start()
            .checked_add_signed(self.length())
            .unwrap_or(if self.duration_minutes < 0 {
                NaiveDateTime::MIN
            } else {
                NaiveDateTime::MAX
            })
    }
}

/// Merge overlapping or adjacent busy periods, clipped to the given window.
///
/// Returns a sorted, non-overlapping list of (start, end) wall-clock periods.
pub fn merge_busy_periods(
    intervals: &[BusyInterval],
    window_start: NaiveDateTime,
    window_end: NaiveDateTime,
) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    // Clip to the window, discarding intervals entirely outside it.
    let mut periods: Vec<(NaiveDateTime, NaiveDateTime)> = intervals
        .iter()
        .map(|i| (i.local_start(), i.local_end()))
        .filter(|&(start, end)| start < window_end && end > window_start)
        .map(|(start, end)| (start.max(window_start), end.min(window_end)))
        .collect();

    if periods.is_empty() {
        return Vec::new();
    }

    periods.sort_by_key(|&(start, end)| (start, end));

    let mut merged: Vec<(NaiveDateTime, NaiveDateTime)> = Vec::new();
    for (start, end) in periods {
        if let Some(last) = merged.last_mut() {
            if start <= last.1 {
                // Overlapping or adjacent.
                last.1 = last.1.max(end);
                continue;
            }
        }
        merged.push((start, end));
    }

    merged
}
