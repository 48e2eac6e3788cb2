//! Recurrence-rule codec -- converts the editor's repeat selection to and from
//! the `RRULE:` token stored on an event.
//!
//! The token is a single line of the form
//! `RRULE:FREQ=<freq>;INTERVAL=<n>[;BYDAY=<d1,d2,...>][;UNTIL=<YYYYMMDDThhmmssZ>]`.
//! An empty token means "does not repeat".

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, warn};

use crate::error::{PlannerError, Result};

/// Property name prefixed to every encoded token.
pub const RRULE_PREFIX: &str = "RRULE:";

/// `chrono` format of the `UNTIL` value (always UTC).
pub const UNTIL_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Largest interval the editor's spinner offers. The codec itself does not
/// enforce it.
pub const MAX_UI_INTERVAL: u32 = 10;

/// Repeat frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    #[default]
    Weekly,
    /// Representable and round-trips, but carries no monthly-specific fields.
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            other => Err(PlannerError::InvalidRule(format!(
                "unsupported FREQ '{}'",
                other
            ))),
        }
    }
}

/// Two-letter RFC 5545 weekday code (`MO`..`SU`).
pub fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// Inverse of [`weekday_code`]. Case-insensitive.
pub fn parse_weekday_code(code: &str) -> Option<Weekday> {
    match code.trim().to_ascii_uppercase().as_str() {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => None,
    }
}

/// The weekdays picked in the editor.
///
/// Behaves like a set (a day appears at most once) but remembers the order in
/// which days were selected; that order is what ends up in `BYDAY`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekdaySelection(Vec<Weekday>);

impl WeekdaySelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from days in the given order, dropping repeats.
    pub fn from_days<I: IntoIterator<Item = Weekday>>(days: I) -> Self {
        let mut selection = Self::new();
        for day in days {
            selection.insert(day);
        }
        selection
    }

    /// Add `day` at the end of the selection. Returns false if it was already selected.
    pub fn insert(&mut self, day: Weekday) -> bool {
        if self.contains(day) {
            return false;
        }
        self.0.push(day);
        true
    }

    pub fn remove(&mut self, day: Weekday) -> bool {
        let before = self.0.len();
        self.0.retain(|d| *d != day);
        self.0.len() != before
    }

    /// Flip a weekday toggle button. Returns whether the day is selected afterwards.
    pub fn toggle(&mut self, day: Weekday) -> bool {
        if self.remove(day) {
            false
        } else {
            self.0.push(day);
            true
        }
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0.contains(&day)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[Weekday] {
        &self.0
    }

    /// The selected days in calendar order, Monday first.
    pub fn sorted(&self) -> Vec<Weekday> {
        let mut days = self.0.clone();
        days.sort_by_key(|d| d.num_days_from_monday());
        days
    }

    /// Set equality, ignoring selection order.
    pub fn same_days(&self, other: &WeekdaySelection) -> bool {
        self.sorted() == other.sorted()
    }
}

impl FromIterator<Weekday> for WeekdaySelection {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        Self::from_days(iter)
    }
}

impl Serialize for WeekdaySelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(weekday_code))
    }
}

impl<'de> Deserialize<'de> for WeekdaySelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let codes = Vec::<String>::deserialize(deserializer)?;
        codes
            .iter()
            .map(|code| {
                parse_weekday_code(code).ok_or_else(|| {
                    serde::de::Error::custom(format!("unknown weekday code '{}'", code))
                })
            })
            .collect()
    }
}

/// A repeat pattern as edited in the event modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    /// Repeat every N units of `frequency`. Must be positive.
    pub interval: u32,
    /// Only meaningful for [`Frequency::Weekly`] and never encoded otherwise;
    /// empty means no restriction.
    pub by_weekday: WeekdaySelection,
    /// Inclusive end of the recurrence, in UTC.
    pub until: Option<DateTime<Utc>>,
}

impl Default for RecurrenceRule {
    fn default() -> Self {
        Self {
            frequency: Frequency::Weekly,
            interval: 1,
            by_weekday: WeekdaySelection::new(),
            until: None,
        }
    }
}

impl RecurrenceRule {
    pub fn weekly(interval: u32) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    pub fn monthly(interval: u32) -> Self {
        Self {
            frequency: Frequency::Monthly,
            interval,
            ..Self::default()
        }
    }

    /// Restrict a weekly rule to `days`. Monthly rules carry no weekdays and
    /// are returned unchanged.
    pub fn with_weekdays<I: IntoIterator<Item = Weekday>>(mut self, days: I) -> Self {
        if self.frequency == Frequency::Weekly {
            self.by_weekday = WeekdaySelection::from_days(days);
        }
        self
    }

    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// Set `until` from a date picked in the calendar popover. The bound is the
    /// last second of that day so occurrences later on the same day still count.
    pub fn with_until_date(self, date: NaiveDate) -> Self {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        self.with_until(date.and_time(end_of_day).and_utc())
    }

    pub fn until_date(&self) -> Option<NaiveDate> {
        self.until.map(|u| u.date_naive())
    }

    pub fn encode(&self) -> String {
        encode(self)
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}

impl FromStr for RecurrenceRule {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self> {
        decode(s)
    }
}

/// Encode a rule into its `RRULE:` token.
///
/// Fields are always emitted in the order FREQ, INTERVAL, BYDAY, UNTIL.
/// `BYDAY` is written only for weekly rules with at least one selected day.
pub fn encode(rule: &RecurrenceRule) -> String {
    let mut parts = vec![
        format!("FREQ={}", rule.frequency),
        format!("INTERVAL={}", rule.interval),
    ];

    if rule.frequency == Frequency::Weekly && !rule.by_weekday.is_empty() {
        let days: Vec<&str> = rule.by_weekday.iter().map(weekday_code).collect();
        parts.push(format!("BYDAY={}", days.join(",")));
    }

    if let Some(until) = rule.until {
        parts.push(format!("UNTIL={}", until.format(UNTIL_FORMAT)));
    }

    format!("{}{}", RRULE_PREFIX, parts.join(";"))
}

/// Decode an `RRULE:` token.
///
/// An empty token yields the default rule. Unknown keys are skipped; a
/// malformed value for a known key fails the whole decode. `BYDAY` on a
/// monthly rule is dropped, so `decode(encode(r)) == r` for every rule built
/// through the constructors.
///
/// # Errors
/// Returns `PlannerError::InvalidRule` for unsupported frequencies, bad
/// intervals, unknown weekday codes or segments without `=`, and
/// `PlannerError::InvalidUntil` when `UNTIL` does not match [`UNTIL_FORMAT`].
pub fn decode(token: &str) -> Result<RecurrenceRule> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(RecurrenceRule::default());
    }

    let body = match token.split_once(':') {
        Some((name, body)) if name.trim().eq_ignore_ascii_case("RRULE") => body,
        Some((name, _)) => {
            return Err(PlannerError::InvalidRule(format!(
                "unexpected property '{}'",
                name
            )))
        }
        None => token,
    };

    let mut rule = RecurrenceRule::default();
    for segment in body.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let (key, value) = segment.split_once('=').ok_or_else(|| {
            PlannerError::InvalidRule(format!("expected KEY=VALUE, got '{}'", segment))
        })?;

        match key.trim().to_ascii_uppercase().as_str() {
            "FREQ" => rule.frequency = value.parse()?,
            "INTERVAL" => rule.interval = parse_interval(value)?,
            "BYDAY" => rule.by_weekday = parse_byday(value)?,
            "UNTIL" => rule.until = Some(parse_until(value)?),
            other => debug!(key = other, "ignoring unknown recurrence key"),
        }
    }

    if rule.frequency == Frequency::Monthly && !rule.by_weekday.is_empty() {
        debug!("ignoring BYDAY on a monthly rule");
        rule.by_weekday = WeekdaySelection::new();
    }

    Ok(rule)
}

/// Decode for the event editor: a malformed token falls back to "no repeat".
pub fn decode_or_default(token: &str) -> RecurrenceRule {
    decode(token).unwrap_or_else(|err| {
        warn!(%err, token, "falling back to default recurrence");
        RecurrenceRule::default()
    })
}

fn parse_interval(value: &str) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(PlannerError::InvalidRule(format!(
            "INTERVAL must be a positive integer, got '{}'",
            value
        ))),
    }
}

fn parse_byday(value: &str) -> Result<WeekdaySelection> {
    value
        .split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(|code| {
            parse_weekday_code(code)
                .ok_or_else(|| PlannerError::InvalidRule(format!("unknown BYDAY code '{}'", code)))
        })
        .collect()
}

fn parse_until(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, UNTIL_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|source| PlannerError::InvalidUntil {
            value: value.to_string(),
            source,
        })
}
