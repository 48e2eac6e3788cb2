//! Per-user calendar settings.
//!
//! Mirrors the backend's settings payload (camelCase JSON). Business hours are
//! already converted into the user's location by the backend and are plain
//! `HH:MM` strings here.

use std::path::Path;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::grid::{self, TimeGrid};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalendarSettings {
    pub is_open_calendar_left_bar: bool,
    /// 0 = Sunday, 1 = Monday, ...
    pub first_day_of_week: u32,
    pub business_start_time: String,
    pub business_end_time: String,
    /// Working days, numbered like `first_day_of_week`.
    pub business_days: Vec<u32>,
    pub hide_non_working_days: bool,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            is_open_calendar_left_bar: true,
            first_day_of_week: 1,
            business_start_time: "08:00".to_string(),
            business_end_time: "18:00".to_string(),
            business_days: vec![1, 2, 3, 4, 5],
            hide_non_working_days: false,
        }
    }
}

impl CalendarSettings {
    /// Parse a settings payload, with or without the `{"data": ...}` envelope.
    pub fn from_json(json: &str) -> Result<Self> {
        crate::api::from_api_json(json)
    }

    /// Read a JSON settings file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Business start and end as times of day.
    ///
    /// # Errors
    /// Returns `PlannerError::InvalidTime` if either value is not `HH:MM`.
    pub fn business_hours(&self) -> Result<(NaiveTime, NaiveTime)> {
        Ok((
            grid::parse_label(&self.business_start_time)?,
            grid::parse_label(&self.business_end_time)?,
        ))
    }

    /// Default-resolution planning grid over the business hours.
    pub fn time_grid(&self) -> Result<TimeGrid> {
        let (start, end) = self.business_hours()?;
        TimeGrid::with_defaults(start, end)
    }

    pub fn first_weekday(&self) -> Result<Weekday> {
        weekday_from_sunday_index(self.first_day_of_week).ok_or_else(|| {
            PlannerError::InvalidTime(format!(
                "firstDayOfWeek must be 0-6, got {}",
                self.first_day_of_week
            ))
        })
    }

    pub fn is_business_day(&self, day: Weekday) -> bool {
        self.business_days.contains(&day.num_days_from_sunday())
    }

    /// The part of the settings the client writes back.
    pub fn update(&self) -> SettingsUpdate {
        SettingsUpdate {
            is_open_calendar_left_bar: self.is_open_calendar_left_bar,
            first_day_of_week: self.first_day_of_week,
            hide_non_working_days: self.hide_non_working_days,
        }
    }

    pub fn apply(&mut self, update: &SettingsUpdate) {
        self.is_open_calendar_left_bar = update.is_open_calendar_left_bar;
        self.first_day_of_week = update.first_day_of_week;
        self.hide_non_working_days = update.hide_non_working_days;
    }
}

/// Body of the settings update request. Business hours are server configuration
/// and cannot be changed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub is_open_calendar_left_bar: bool,
    pub first_day_of_week: u32,
    pub hide_non_working_days: bool,
}

fn weekday_from_sunday_index(index: u32) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1..=6 => Weekday::try_from((index - 1) as u8).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sunday_index_maps_to_weekdays() {
        assert_eq!(weekday_from_sunday_index(0), Some(Weekday::Sun));
        assert_eq!(weekday_from_sunday_index(1), Some(Weekday::Mon));
        assert_eq!(weekday_from_sunday_index(6), Some(Weekday::Sat));
        assert_eq!(weekday_from_sunday_index(7), None);
    }
}
