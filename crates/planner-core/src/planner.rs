//! Planning-assistant state.
//!
//! Holds what the "find free time" dialog needs between renders: the day being
//! viewed, the meeting length, the event members and the last applied grid.
//! Every navigation step produces a new tagged [`ScheduleQuery`]; the host runs
//! it and feeds the response back through [`PlanningAssistant::apply_response`],
//! where responses to superseded queries are dropped.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::debug;

use crate::grid::{self, FreeBusyGrid, TimeGrid, DEFAULT_SLOT_MINUTES};
use crate::schedule::{RequestTicket, RequestTracker, ScheduleQuery, ScheduleResponse};

/// The event time chosen by clicking a timeline column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedEventTime {
    pub start: NaiveDateTime,
    pub start_time: String,
    pub end: NaiveDateTime,
    pub end_time: String,
}

#[derive(Debug, Clone)]
pub struct PlanningAssistant {
    grid: TimeGrid,
    members: Vec<String>,
    today: NaiveDate,
    current_date: NaiveDate,
    duration_minutes: i64,
    tracker: RequestTracker,
    view: Option<FreeBusyGrid>,
}

impl PlanningAssistant {
    /// Open the assistant for an event currently planned at
    /// `selected_start..selected_end`.
    ///
    /// The first day shown is the event's day when it lies in the future,
    /// otherwise `today`. The meeting length is the event's length, or one slot
    /// if that is not positive.
    pub fn new(
        grid: TimeGrid,
        members: Vec<String>,
        selected_start: NaiveDateTime,
        selected_end: NaiveDateTime,
        today: NaiveDate,
    ) -> Self {
        let current_date = if selected_start.date() > today {
            selected_start.date()
        } else {
            today
        };
        let duration_minutes = match (selected_end - selected_start).num_minutes() {
            minutes if minutes > 0 => minutes,
            _ => DEFAULT_SLOT_MINUTES,
        };

        Self {
            grid,
            members,
            today,
            current_date,
            duration_minutes,
            tracker: RequestTracker::new(),
            view: None,
        }
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration_minutes
    }

    /// The last applied grid. Kept while a newer query is in flight.
    pub fn view(&self) -> Option<&FreeBusyGrid> {
        self.view.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.view.is_none() || self.tracker.is_pending()
    }

    /// Issue a query for the current day.
    pub fn refresh(&mut self) -> (RequestTicket, ScheduleQuery) {
        let ticket = self.tracker.issue();
        let query = ScheduleQuery::for_day(self.members.clone(), self.current_date);
        (ticket, query)
    }

    pub fn go_today(&mut self) -> (RequestTicket, ScheduleQuery) {
        self.current_date = self.today;
        self.refresh()
    }

    pub fn prev_day(&mut self) -> (RequestTicket, ScheduleQuery) {
        self.current_date -= Duration::days(1);
        self.refresh()
    }

    pub fn next_day(&mut self) -> (RequestTicket, ScheduleQuery) {
        self.current_date += Duration::days(1);
        self.refresh()
    }

    /// Change the meeting length. Non-positive or out-of-range values are
    /// ignored and return `None`.
    pub fn set_duration(&mut self, minutes: i64) -> Option<(RequestTicket, ScheduleQuery)> {
        if minutes <= 0 || Duration::try_minutes(minutes).is_none() {
            debug!(minutes, "ignoring invalid meeting duration");
            return None;
        }
        self.duration_minutes = minutes;
        Some(self.refresh())
    }

    /// Apply the response to `ticket`. Returns the new grid, or `None` when the
    /// response belongs to a superseded query.
    pub fn apply_response(
        &mut self,
        ticket: RequestTicket,
        response: &ScheduleResponse,
    ) -> Option<&FreeBusyGrid> {
        if !self.tracker.accept(ticket) {
            return None;
        }
        self.view = Some(grid::compute_grid(
            &self.grid,
            self.current_date,
            response,
            self.duration_minutes,
        ));
        self.view.as_ref()
    }

    /// The event time for a click on `column`, or `None` if `column` is not a
    /// column of the grid or the meeting would end past chrono's range.
    pub fn select_slot(&self, column: NaiveTime) -> Option<SelectedEventTime> {
        if !self.grid.columns().contains(&column) {
            return None;
        }
        let start = self.current_date.and_time(column);
        let end = start.checked_add_signed(Duration::try_minutes(self.duration_minutes)?)?;
        Some(SelectedEventTime {
            start,
            start_time: grid::format_label(start.time()),
            end,
            end_time: grid::format_label(end.time()),
        })
    }
}
