//! Occupancy building.
//!
//! Folds resolved appointments for one date into the set of students
//! present in each slot of the grid.

use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{Occupancy, ResolvedAppointment};

/// The occupancy of one date, with how many rows fed it.
#[derive(Debug, Clone, Default)]
pub struct OccupancyResult {
    /// Students present in each slot.
    pub occupancy: Occupancy,
    /// Appointments that fell on the target date.
    pub rows_matched: usize,
    /// Appointments on any other date.
    pub excluded_for_date: usize,
}

/// Drops seconds so times key on `HH:MM`.
fn slot_key(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

/// Builds the occupancy of `target_date`.
///
/// Each appointment on `target_date` puts its student in the slot keyed by
/// its start time. An appointment longer than `interval_minutes` also puts
/// the student in the slot `interval_minutes` later. Only that one
/// continuation slot is modeled; longer sessions are not carried further,
/// and a continuation that would cross midnight is not added.
///
/// # Errors
///
/// Returns [`EngineError::InvalidGrid`] if `interval_minutes` is zero.
///
/// # Example
///
/// ```
/// use grid_import_engine::engine::build_occupancy;
/// use grid_import_engine::models::ResolvedAppointment;
/// use chrono::{NaiveDate, NaiveTime};
///
/// let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let appointment = ResolvedAppointment {
///     date,
///     time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
///     student_id: 4,
///     session_type_id: 1,
///     duration_minutes: 60,
/// };
///
/// let result = build_occupancy(&[appointment], date, 30).unwrap();
/// assert_eq!(result.occupancy.occupants(NaiveTime::from_hms_opt(15, 0, 0).unwrap()), &[4]);
/// assert_eq!(result.occupancy.occupants(NaiveTime::from_hms_opt(15, 30, 0).unwrap()), &[4]);
/// ```
pub fn build_occupancy(
    appointments: &[ResolvedAppointment],
    target_date: NaiveDate,
    interval_minutes: u32,
) -> EngineResult<OccupancyResult> {
    if interval_minutes == 0 {
        return Err(EngineError::InvalidGrid {
            field: "interval_minutes".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    let interval = Duration::minutes(i64::from(interval_minutes));
    let mut result = OccupancyResult::default();

    for appointment in appointments {
        if appointment.date != target_date {
            result.excluded_for_date += 1;
            continue;
        }
        result.rows_matched += 1;

        let start = slot_key(appointment.time);
        result.occupancy.add(start, appointment.student_id);

        if appointment.duration_minutes > interval_minutes {
            let (continuation, wrapped_seconds) = start.overflowing_add_signed(interval);
            if wrapped_seconds != 0 {
                debug!(
                    student_id = appointment.student_id,
                    start = %start,
                    "Continuation slot crosses midnight; not added"
                );
                continue;
            }
            result.occupancy.add(continuation, appointment.student_id);
        }
    }

    Ok(result)
}
