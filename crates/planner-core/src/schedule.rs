//! Schedule query wire contract and the stale-response guard.
//!
//! The planning assistant asks the backend for the busy intervals of every
//! event member over one day:
//!
//! ```text
//! GET schedule?users=<comma ids>&start=<YYYY-MM-DDThh:mm:ss>&end=<...>
//! -> {"users": {"<id>": [{"start": ..., "end": ..., "duration": 60}]},
//!     "available_times": ["09:00", ...]}
//! ```
//!
//! Responses can arrive out of order when the user flips days quickly, so each
//! query is tagged by a [`RequestTracker`] and only the latest one is applied.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::freebusy::BusyInterval;

/// Layout of the `start`/`end` query parameters (user-local wall time).
pub const QUERY_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A schedule request for a set of users over a local time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleQuery {
    pub users: Vec<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ScheduleQuery {
    /// Query covering the whole of `date`, midnight to midnight.
    pub fn for_day(users: Vec<String>, date: NaiveDate) -> Self {
        let start = date.and_time(NaiveTime::MIN);
        Self {
            users,
            start,
            end: start + Duration::hours(24),
        }
    }

    /// Query-string parameters, unencoded. The HTTP client is responsible for
    /// percent-encoding.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("users", self.users.join(",")),
            ("start", self.start.format(QUERY_DATE_TIME_FORMAT).to_string()),
            ("end", self.end.format(QUERY_DATE_TIME_FORMAT).to_string()),
        ]
    }
}

/// One busy entry of a user's schedule as sent by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub start: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<FixedOffset>>,
    /// Minutes. Authoritative when present; `end` is only consulted when it is 0.
    #[serde(default)]
    pub duration: i32,
}

impl ScheduleEntry {
    pub fn to_busy_interval(&self) -> BusyInterval {
        let duration = match (self.duration, self.end) {
            (0, Some(end)) => (end - self.start).num_minutes(),
            (minutes, _) => i64::from(minutes),
        };
        BusyInterval::new(self.start, duration)
    }
}

/// Body of a schedule response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResponse {
    #[serde(default, deserialize_with = "users_or_empty")]
    pub users: BTreeMap<String, Vec<ScheduleEntry>>,
    /// `HH:MM` labels the backend considers free for everyone. The current
    /// backend always sends an empty list.
    #[serde(default, deserialize_with = "null_as_default")]
    pub available_times: Vec<String>,
}

impl ScheduleResponse {
    /// Parse a response body, with or without the `{"data": ...}` envelope.
    pub fn from_json(json: &str) -> Result<Self> {
        crate::api::from_api_json(json)
    }

    pub fn busy_by_user(&self) -> BTreeMap<String, Vec<BusyInterval>> {
        self.users
            .iter()
            .map(|(user, entries)| {
                (
                    user.clone(),
                    entries.iter().map(ScheduleEntry::to_busy_interval).collect(),
                )
            })
            .collect()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn users_or_empty<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, Vec<ScheduleEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Option<Vec<ScheduleEntry>>>> =
        Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(user, entries)| (user, entries.unwrap_or_default()))
        .collect())
}

/// Sequence number attached to an issued schedule query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// Hands out monotonically increasing tickets and accepts only the response
/// to the most recent one.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    issued: u64,
    accepted: Option<u64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag a new query. Every ticket issued earlier becomes stale.
    pub fn issue(&mut self) -> RequestTicket {
        self.issued += 1;
        RequestTicket(self.issued)
    }

    pub fn latest(&self) -> Option<RequestTicket> {
        (self.issued > 0).then_some(RequestTicket(self.issued))
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.issued
    }

    /// True while the latest query has not been answered.
    pub fn is_pending(&self) -> bool {
        self.issued > 0 && self.accepted != Some(self.issued)
    }

    /// Decide whether the response for `ticket` should be applied.
    ///
    /// Returns false for superseded tickets and for a second response to the
    /// same ticket.
    pub fn accept(&mut self, ticket: RequestTicket) -> bool {
        if !self.is_current(ticket) {
            debug!(
                ticket = ticket.0,
                latest = self.issued,
                "discarding stale schedule response"
            );
            return false;
        }
        if self.accepted == Some(ticket.0) {
            debug!(ticket = ticket.0, "schedule response already applied");
            return false;
        }
        self.accepted = Some(ticket.0);
        true
    }
}
