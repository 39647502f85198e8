//! Column assignment for the schedule grid.
//!
//! Walks the occupied slots in chronological order and gives every
//! occupant a column in `1..=capacity`. A student who held a column in the
//! previous occupied slot keeps it; everyone else takes the lowest free
//! column. When a slot has more occupants than columns, the late arrivals
//! are left out and reported as overflow.
//!
//! Columns are only carried from one grid slot to the next: a student
//! absent from a slot loses their column, even if they come back later.
//! A grid slot with nobody in it is a gap that frees every column.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveTime};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    ColumnAssignment, ImportWarning, Occupancy, OverflowEntry, StudentId, WarningKind,
    format_time_of_day,
};

/// Column assignments for one date, plus everyone who did not fit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentResult {
    /// Assignments in slot order, then occupant order.
    pub assignments: Vec<ColumnAssignment>,
    /// Occupants that found every column taken.
    pub overflow: Vec<OverflowEntry>,
}

impl AssignmentResult {
    /// Returns the overflow entries as import warnings.
    pub fn overflow_warnings(&self) -> Vec<ImportWarning> {
        self.overflow
            .iter()
            .map(|entry| {
                ImportWarning::for_grid(
                    WarningKind::Overflow,
                    format!(
                        "Slot {} is full; student {} was not placed",
                        format_time_of_day(entry.time),
                        entry.student_id
                    ),
                    json!({
                        "time": format_time_of_day(entry.time),
                        "student_id": entry.student_id,
                    }),
                )
            })
            .collect()
    }
}

fn lowest_free_column(used: &HashSet<u32>, capacity: u32) -> Option<u32> {
    (1..=capacity).find(|column| !used.contains(column))
}

/// True when `time` is the grid slot right after `previous`.
fn follows(previous: NaiveTime, time: NaiveTime, step: Duration) -> bool {
    let (next, wrapped) = previous.overflowing_add_signed(step);
    wrapped == 0 && next == time
}

/// Assigns every occupant a column.
///
/// Per slot, in ascending time order:
/// 1. Columns carried over by students present in this slot are marked used.
///    Nothing is carried when the previous grid slot (`interval_minutes`
///    earlier) was empty.
/// 2. Each occupant without a carried column takes the lowest unused
///    column, or overflows when none is left.
/// 3. One [`ColumnAssignment`] is emitted per placed occupant.
/// 4. Only this slot's placed occupants carry their column forward.
///
/// # Errors
///
/// Returns [`EngineError::InvalidCapacity`] if `capacity` is zero and
/// [`EngineError::InvalidGrid`] if `interval_minutes` is zero.
///
/// # Example
///
/// ```
/// use grid_import_engine::engine::assign_columns;
/// use grid_import_engine::models::Occupancy;
/// use chrono::NaiveTime;
///
/// let three = NaiveTime::from_hms_opt(15, 0, 0).unwrap();
/// let half_past = NaiveTime::from_hms_opt(15, 30, 0).unwrap();
///
/// let mut occupancy = Occupancy::new();
/// occupancy.add(three, 1);
/// occupancy.add(three, 2);
/// occupancy.add(half_past, 3);
/// occupancy.add(half_past, 2);
///
/// let result = assign_columns(&occupancy, 2, 30).unwrap();
/// let placed: Vec<(i64, u32)> = result
///     .assignments
///     .iter()
///     .map(|a| (a.student_id, a.column_number))
///     .collect();
///
/// // Student 2 keeps column 2; student 3 takes the column student 1 freed.
/// assert_eq!(placed, vec![(1, 1), (2, 2), (3, 1), (2, 2)]);
/// ```
pub fn assign_columns(
    occupancy: &Occupancy,
    capacity: u32,
    interval_minutes: u32,
) -> EngineResult<AssignmentResult> {
    if capacity == 0 {
        return Err(EngineError::InvalidCapacity { capacity });
    }
    if interval_minutes == 0 {
        return Err(EngineError::InvalidGrid {
            field: "interval_minutes".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    let step = Duration::minutes(i64::from(interval_minutes));
    let mut result = AssignmentResult::default();
    let mut active: HashMap<StudentId, u32> = HashMap::new();
    let mut previous: Option<NaiveTime> = None;

    for (time, occupants) in occupancy.iter() {
        if previous.is_some_and(|prev| !follows(prev, time, step)) && !active.is_empty() {
            debug!(
                time = %format_time_of_day(time),
                released = active.len(),
                "Empty slot before this one; columns released"
            );
            active.clear();
        }
        let mut used: HashSet<u32> = occupants
            .iter()
            .filter_map(|student_id| active.get(student_id).copied())
            .collect();
        let mut placed: HashMap<StudentId, u32> = HashMap::with_capacity(occupants.len());

        for &student_id in occupants {
            let column = match active.get(&student_id) {
                Some(&held) => Some(held),
                None => lowest_free_column(&used, capacity),
            };

            let Some(column_number) = column else {
                warn!(
                    time = %format_time_of_day(time),
                    student_id,
                    capacity,
                    "Slot is full; occupant dropped"
                );
                result.overflow.push(OverflowEntry { time, student_id });
                continue;
            };

            used.insert(column_number);
            placed.insert(student_id, column_number);
            result.assignments.push(ColumnAssignment {
                time,
                student_id,
                column_number,
            });
        }

        debug!(
            time = %format_time_of_day(time),
            occupants = occupants.len(),
            placed = placed.len(),
            "Assigned slot"
        );
        active = placed;
        previous = Some(time);
    }

    Ok(result)
}
