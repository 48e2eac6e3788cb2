//! Planning-assistant timeline grid.
//!
//! The business-hours window of one day is cut into fixed-width slots
//! (columns). Each user's busy intervals are laid out as pixel rectangles on a
//! timeline of `columns * pixels_per_slot` pixels, and the columns free for
//! every user are marked so they can be offered as meeting start times.

use std::collections::{BTreeMap, HashSet};

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, warn};

use crate::error::{PlannerError, Result};
use crate::freebusy::{self, BusyInterval};
use crate::schedule::ScheduleResponse;

/// Width of one slot, in minutes.
pub const DEFAULT_SLOT_MINUTES: i64 = 15;

/// Rendered width of one slot.
pub const DEFAULT_PIXELS_PER_SLOT: f64 = 50.0;

/// `HH:MM` label format shared with the backend's `available_times`.
pub const LABEL_FORMAT: &str = "%H:%M";

pub fn format_label(time: NaiveTime) -> String {
    time.format(LABEL_FORMAT).to_string()
}

/// Parse an `HH:MM` time of day.
pub fn parse_label(label: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(label.trim(), LABEL_FORMAT)
        .map_err(|e| PlannerError::InvalidTime(format!("'{}': {}", label, e)))
}

/// Validated grid parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeGrid {
    business_start: NaiveTime,
    business_end: NaiveTime,
    slot_minutes: i64,
    pixels_per_slot: f64,
}

impl TimeGrid {
    /// # Errors
    /// Returns `PlannerError::InvalidGrid` when the window is empty or shorter
    /// than one slot, when `slot_minutes` is not positive, or when
    /// `pixels_per_slot` is not a positive finite number.
    pub fn new(
        business_start: NaiveTime,
        business_end: NaiveTime,
        slot_minutes: i64,
        pixels_per_slot: f64,
    ) -> Result<Self> {
        if slot_minutes <= 0 {
            return Err(PlannerError::InvalidGrid(format!(
                "slot width must be positive, got {} minutes",
                slot_minutes
            )));
        }
        if business_end <= business_start {
            return Err(PlannerError::InvalidGrid(format!(
                "business end {} is not after business start {}",
                format_label(business_end),
                format_label(business_start)
            )));
        }
        if (business_end - business_start).num_minutes() < slot_minutes {
            return Err(PlannerError::InvalidGrid(format!(
                "business window {}-{} is shorter than one {}-minute slot",
                format_label(business_start),
                format_label(business_end),
                slot_minutes
            )));
        }
        if !pixels_per_slot.is_finite() || pixels_per_slot <= 0.0 {
            return Err(PlannerError::InvalidGrid(format!(
                "pixels per slot must be positive, got {}",
                pixels_per_slot
            )));
        }
        Ok(Self {
            business_start,
            business_end,
            slot_minutes,
            pixels_per_slot,
        })
    }

    /// Grid with 15-minute slots rendered 50 px wide.
    pub fn with_defaults(business_start: NaiveTime, business_end: NaiveTime) -> Result<Self> {
        Self::new(
            business_start,
            business_end,
            DEFAULT_SLOT_MINUTES,
            DEFAULT_PIXELS_PER_SLOT,
        )
    }

    pub fn business_start(&self) -> NaiveTime {
        self.business_start
    }

    pub fn business_end(&self) -> NaiveTime {
        self.business_end
    }

    pub fn slot_minutes(&self) -> i64 {
        self.slot_minutes
    }

    pub fn pixels_per_slot(&self) -> f64 {
        self.pixels_per_slot
    }

    pub fn columns(&self) -> Vec<NaiveTime> {
        compute_columns(self.business_start, self.business_end, self.slot_minutes)
    }

    pub fn column_count(&self) -> usize {
        ((self.business_end - self.business_start).num_minutes() / self.slot_minutes) as usize
    }

    pub fn timeline_width(&self) -> f64 {
        self.column_count() as f64 * self.pixels_per_slot
    }

    /// The rendered window on `date`: business start up to the end of the last
    /// whole slot.
    pub fn window_on(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        let start = date.and_time(self.business_start);
        let end = start + Duration::minutes(self.column_count() as i64 * self.slot_minutes);
        (start, end)
    }

    fn minutes_to_pixels(&self, minutes: f64) -> f64 {
        minutes / self.slot_minutes as f64 * self.pixels_per_slot
    }
}

/// Slot start times covering `[business_start, business_end)`.
///
/// Only whole slots are produced. Returns an empty list when the window is
/// empty or `slot_minutes` is not positive.
pub fn compute_columns(
    business_start: NaiveTime,
    business_end: NaiveTime,
    slot_minutes: i64,
) -> Vec<NaiveTime> {
    if slot_minutes <= 0 || business_end <= business_start {
        warn!(
            start = %format_label(business_start),
            end = %format_label(business_end),
            slot_minutes,
            "no columns for invalid grid parameters"
        );
        return Vec::new();
    }

    let count = (business_end - business_start).num_minutes() / slot_minutes;
    (0..count)
        .map(|i| business_start + Duration::minutes(i * slot_minutes))
        .collect()
}

/// Columns whose `HH:MM` label appears in the backend's `available_times`.
///
/// The result follows column order, whatever the order of `available_times`.
pub fn compute_free_slots<S: AsRef<str>>(
    columns: &[NaiveTime],
    available_times: &[S],
) -> Vec<NaiveTime> {
    let available: HashSet<NaiveTime> = available_times
        .iter()
        .filter_map(|label| parse_label(label.as_ref()).ok())
        .collect();

    columns
        .iter()
        .copied()
        .filter(|column| available.contains(column))
        .collect()
}

/// Columns at which a meeting of `meeting_minutes` fits for every user.
///
/// All users' busy intervals are merged; a column qualifies when
/// `[column, column + meeting_minutes)` ends inside the window and overlaps
/// no busy period. A non-positive meeting length counts as one slot.
pub fn derive_available_times<'a, I>(
    grid: &TimeGrid,
    reference_date: NaiveDate,
    busy_by_user: I,
    meeting_minutes: i64,
) -> Vec<NaiveTime>
where
    I: IntoIterator<Item = &'a [BusyInterval]>,
{
    let (window_start, window_end) = grid.window_on(reference_date);
    let all_busy: Vec<BusyInterval> = busy_by_user
        .into_iter()
        .flat_map(|intervals| intervals.iter().cloned())
        .collect();
    let merged = freebusy::merge_busy_periods(&all_busy, window_start, window_end);

    let minutes = if meeting_minutes > 0 {
        meeting_minutes
    } else {
        grid.slot_minutes
    };
    let Some(meeting) = Duration::try_minutes(minutes) else {
        warn!(meeting_minutes, "meeting length out of range, no column fits");
        return Vec::new();
    };

    grid.columns()
        .into_iter()
        .filter(|column| {
            let start = reference_date.and_time(*column);
            let Some(end) = start.checked_add_signed(meeting) else {
                return false;
            };
            end <= window_end
                && !merged
                    .iter()
                    .any(|&(busy_start, busy_end)| start < busy_end && busy_start < end)
        })
        .collect()
}

/// A busy rectangle on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutBlock {
    pub offset_pixels: f64,
    pub width_pixels: f64,
}

/// Pixel rectangles for one user's busy intervals on `reference_date`.
///
/// Blocks are clipped to the timeline, never wrapped: offsets and widths are
/// always non-negative and `offset + width` never exceeds the timeline width.
/// Intervals entirely outside the timeline produce no block. Overlapping
/// intervals are not merged.
pub fn compute_user_layout(
    busy: &[BusyInterval],
    reference_date: NaiveDate,
    grid: &TimeGrid,
) -> Vec<LayoutBlock> {
    let origin = reference_date.and_time(grid.business_start);
    let total = grid.timeline_width();

    busy.iter()
        .filter_map(|interval| {
            let offset_minutes = (interval.local_start() - origin).num_seconds() as f64 / 60.0;
            let mut offset = grid.minutes_to_pixels(offset_minutes);
            let mut width = grid.minutes_to_pixels(interval.duration_minutes as f64);

            if offset >= total {
                debug!(start = %interval.start, "busy interval starts after the timeline");
                return None;
            }
            if offset < 0.0 {
                width += offset;
                offset = 0.0;
            }
            if offset + width > total {
                width = total - offset;
            }
            if width <= 0.0 {
                debug!(start = %interval.start, "busy interval has no visible width");
                return None;
            }

            Some(LayoutBlock {
                offset_pixels: offset,
                width_pixels: width,
            })
        })
        .collect()
}

/// Everything the planning assistant renders for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreeBusyGrid {
    pub date: NaiveDate,
    pub slot_minutes: i64,
    pub pixels_per_slot: f64,
    pub timeline_width: f64,
    #[serde(serialize_with = "serialize_labels")]
    pub columns: Vec<NaiveTime>,
    #[serde(serialize_with = "serialize_labels")]
    pub free_slots: Vec<NaiveTime>,
    pub user_layout: BTreeMap<String, Vec<LayoutBlock>>,
}

impl FreeBusyGrid {
    pub fn is_free(&self, column: NaiveTime) -> bool {
        self.free_slots.contains(&column)
    }
}

fn serialize_labels<S: Serializer>(
    times: &[NaiveTime],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(times.iter().map(|t| format_label(*t)))
}

/// Build the full grid for `reference_date` from a schedule response.
///
/// Free slots come from the backend's `available_times` when it sends any;
/// otherwise they are derived locally from the busy intervals.
pub fn compute_grid(
    grid: &TimeGrid,
    reference_date: NaiveDate,
    schedule: &ScheduleResponse,
    meeting_minutes: i64,
) -> FreeBusyGrid {
    let columns = grid.columns();
    let busy = schedule.busy_by_user();

    let free_slots = if schedule.available_times.is_empty() {
        derive_available_times(
            grid,
            reference_date,
            busy.values().map(Vec::as_slice),
            meeting_minutes,
        )
    } else {
        compute_free_slots(&columns, &schedule.available_times)
    };

    let user_layout = busy
        .iter()
        .map(|(user, intervals)| {
            (
                user.clone(),
                compute_user_layout(intervals, reference_date, grid),
            )
        })
        .collect();

    FreeBusyGrid {
        date: reference_date,
        slot_minutes: grid.slot_minutes,
        pixels_per_slot: grid.pixels_per_slot,
        timeline_width: grid.timeline_width(),
        columns,
        free_slots,
        user_layout,
    }
}
