//! WASM bindings for planner-core.
//!
//! Exposes the recurrence codec, the timeline columns, the free/busy grid and
//! recurrence expansion to the calendar front end via `wasm-bindgen`. All
//! complex types are passed as JSON strings.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p planner-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir packages/planner-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/planner_wasm.wasm
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use planner_core::error::{PlannerError, Result};
use planner_core::grid::{self, TimeGrid};
use planner_core::recurrence::{self, RecurrenceRule};
use planner_core::schedule::ScheduleResponse;
use planner_core::settings::CalendarSettings;
use planner_core::{compute_grid, expander, BusyInterval};
use serde::Serialize;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct OccurrenceDto {
    start: String,
    end: String,
    duration_minutes: i64,
}

impl From<&BusyInterval> for OccurrenceDto {
    fn from(b: &BusyInterval) -> Self {
        Self {
            start: b.start.to_rfc3339(),
            end: b.end().to_rfc3339(),
            duration_minutes: b.duration_minutes,
        }
    }
}

// ---------------------------------------------------------------------------
// Input parsing
// ---------------------------------------------------------------------------

/// Parse a window boundary: RFC 3339, or a naive datetime taken as UTC.
fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    parse_local(s).map(|ndt| ndt.and_utc())
}

fn parse_local(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map_err(|e| PlannerError::InvalidTime(format!("'{}': {}", s, e)))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| PlannerError::InvalidTime(format!("'{}': {}", s, e)))
}

/// Empty or whitespace-only settings mean "use the defaults".
fn parse_settings(json: &str) -> Result<CalendarSettings> {
    if json.trim().is_empty() {
        Ok(CalendarSettings::default())
    } else {
        CalendarSettings::from_json(json)
    }
}

fn encode_rule_json(rule_json: &str) -> Result<String> {
    let rule: RecurrenceRule = serde_json::from_str(rule_json)?;
    Ok(recurrence::encode(&rule))
}

fn decode_token_json(token: &str) -> Result<String> {
    let rule = recurrence::decode(token)?;
    Ok(serde_json::to_string(&rule)?)
}

fn columns_json(start: &str, end: &str, slot_minutes: u32) -> Result<String> {
    let time_grid = TimeGrid::new(
        grid::parse_label(start)?,
        grid::parse_label(end)?,
        i64::from(slot_minutes),
        grid::DEFAULT_PIXELS_PER_SLOT,
    )?;
    let labels: Vec<String> = time_grid
        .columns()
        .into_iter()
        .map(grid::format_label)
        .collect();
    Ok(serde_json::to_string(&labels)?)
}

fn grid_json(
    schedule_json: &str,
    date: &str,
    settings_json: &str,
    duration_minutes: u32,
) -> Result<String> {
    let settings = parse_settings(settings_json)?;
    let time_grid = settings.time_grid()?;
    let schedule = ScheduleResponse::from_json(schedule_json)?;
    let result = compute_grid(
        &time_grid,
        parse_date(date)?,
        &schedule,
        i64::from(duration_minutes),
    );
    Ok(serde_json::to_string(&result)?)
}

fn expand_json(
    token: &str,
    dtstart: &str,
    timezone: &str,
    duration_minutes: u32,
    from: &str,
    to: &str,
) -> Result<String> {
    let occurrences = expander::expand_token(
        token,
        parse_local(dtstart)?,
        timezone,
        i64::from(duration_minutes),
        parse_instant(from)?,
        parse_instant(to)?,
    )?;
    let dtos: Vec<OccurrenceDto> = occurrences.iter().map(OccurrenceDto::from).collect();
    Ok(serde_json::to_string(&dtos)?)
}

fn to_js(e: PlannerError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Encode a repeat selection into an `RRULE:` token.
///
/// `rule_json` is `{frequency, interval, by_weekday, until}`; missing fields
/// take the default weekly rule.
#[wasm_bindgen(js_name = "encodeRecurrence")]
pub fn encode_recurrence(rule_json: &str) -> std::result::Result<String, JsValue> {
    encode_rule_json(rule_json).map_err(to_js)
}

/// Decode an `RRULE:` token into the rule JSON. An empty token decodes to the
/// default weekly rule.
#[wasm_bindgen(js_name = "decodeRecurrence")]
pub fn decode_recurrence(token: &str) -> std::result::Result<String, JsValue> {
    decode_token_json(token).map_err(to_js)
}

/// `HH:MM` labels of the timeline columns between `start` and `end`.
///
/// Throws when the window is empty, shorter than one slot, or `slot_minutes`
/// is zero.
#[wasm_bindgen(js_name = "computeColumns")]
pub fn compute_columns_js(
    start: &str,
    end: &str,
    slot_minutes: u32,
) -> std::result::Result<String, JsValue> {
    columns_json(start, end, slot_minutes).map_err(to_js)
}

/// Free/busy grid for `date` (`YYYY-MM-DD`) from a schedule response.
///
/// `settings_json` may be empty to use the default business hours.
#[wasm_bindgen(js_name = "computeGrid")]
pub fn compute_grid_js(
    schedule_json: &str,
    date: &str,
    settings_json: &str,
    duration_minutes: u32,
) -> std::result::Result<String, JsValue> {
    grid_json(schedule_json, date, settings_json, duration_minutes).map_err(to_js)
}

/// Expand an event's recurrence token into occurrences overlapping
/// `[from, to)`.
///
/// # Arguments
/// - `token` -- `RRULE:` token, empty for a one-off event
/// - `dtstart` -- local start of the first occurrence (e.g. "2026-03-02T09:00:00")
/// - `timezone` -- IANA timezone of `dtstart`
/// - `duration_minutes` -- length of each occurrence
/// - `from`, `to` -- window boundaries (RFC 3339, or naive datetimes taken as UTC)
#[wasm_bindgen(js_name = "expandRecurrence")]
pub fn expand_recurrence(
    token: &str,
    dtstart: &str,
    timezone: &str,
    duration_minutes: u32,
    from: &str,
    to: &str,
) -> std::result::Result<String, JsValue> {
    expand_json(token, dtstart, timezone, duration_minutes, from, to).map_err(to_js)
}
