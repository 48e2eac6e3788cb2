//! # planner-core
//!
//! Client-side scheduling logic for a team-chat calendar: the recurrence-rule
//! codec behind the event editor's "repeat" controls and the free/busy grid
//! behind the "find free time" planning assistant.
//!
//! Everything here is synchronous and free of host state. The host (web client
//! or CLI) performs HTTP calls and rendering; this crate turns the data those
//! produce into tokens, slots and pixel layouts.
//!
//! ## Modules
//!
//! - [`recurrence`] — `RRULE:` token encode/decode
//! - [`grid`] — timeline columns, free slots and per-user busy layout
//! - [`freebusy`] — busy intervals and their union over a window
//! - [`expander`] — recurring event → concrete busy intervals
//! - [`schedule`] — schedule query/response wire types and the stale-response guard
//! - [`settings`] — per-user calendar settings
//! - [`planner`] — planning-assistant state
//! - [`error`] — Error types

pub mod api;
pub mod error;
pub mod expander;
pub mod freebusy;
pub mod grid;
pub mod planner;
pub mod recurrence;
pub mod schedule;
pub mod settings;

pub use error::PlannerError;
pub use freebusy::BusyInterval;
pub use grid::{
    compute_columns, compute_free_slots, compute_grid, compute_user_layout, FreeBusyGrid,
    LayoutBlock, TimeGrid,
};
pub use planner::PlanningAssistant;
pub use recurrence::{decode, encode, Frequency, RecurrenceRule, WeekdaySelection};
pub use schedule::{RequestTicket, RequestTracker, ScheduleQuery, ScheduleResponse};
pub use settings::CalendarSettings;
