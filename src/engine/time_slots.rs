//! Time slot generation for the schedule grid.
//!
//! This module turns a working window and an interval into the ordered rows
//! of the grid.

use chrono::{NaiveTime, Timelike};

use crate::error::{EngineError, EngineResult};
use crate::models::TimeSlot;

fn minutes_from_midnight(time: NaiveTime) -> u32 {
    time.num_seconds_from_midnight() / 60
}

fn time_from_minutes(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

/// Generates the grid's time slots.
///
/// Slots start at `window_start` and step by `interval_minutes`; each slot
/// ends `interval_minutes` after it starts. Generation stops at the first
/// start that is not before `window_end`, so the last slot may end after
/// `window_end`. An empty window yields no slots.
///
/// # Errors
///
/// - [`EngineError::InvalidGrid`] if `interval_minutes` is zero
/// - [`EngineError::InvalidGrid`] if a slot would end at or past midnight
///
/// # Example
///
/// ```
/// use grid_import_engine::engine::generate_time_slots;
/// use chrono::NaiveTime;
///
/// let slots = generate_time_slots(
///     NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
///     NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
///     30,
/// )
/// .unwrap();
///
/// let keys: Vec<String> = slots.iter().map(|s| s.key()).collect();
/// assert_eq!(keys, vec!["15:00", "15:30"]);
/// assert_eq!(slots[1].end, NaiveTime::from_hms_opt(16, 0, 0).unwrap());
/// ```
pub fn generate_time_slots(
    window_start: NaiveTime,
    window_end: NaiveTime,
    interval_minutes: u32,
) -> EngineResult<Vec<TimeSlot>> {
    if interval_minutes == 0 {
        return Err(EngineError::InvalidGrid {
            field: "interval_minutes".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    let end = minutes_from_midnight(window_end);
    let mut start = minutes_from_midnight(window_start);
    let mut slots = Vec::new();

    while start < end {
        let slot_end = start + interval_minutes;
        let (Some(start_time), Some(end_time)) = (
            time_from_minutes(start),
            time_from_minutes(slot_end),
        ) else {
            return Err(EngineError::InvalidGrid {
                field: "window_end".to_string(),
                message: format!(
                    "slot starting at {:02}:{:02} would run past midnight",
                    start / 60,
                    start % 60
                ),
            });
        };

        slots.push(TimeSlot {
            start: start_time,
            end: end_time,
        });
        start = slot_end;
    }

    Ok(slots)
}
