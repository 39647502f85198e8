//! Column assignment and persisted cell models.

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

use super::appointment::StudentId;
use super::time_slot::hhmm;

/// Identifier handed back by the persistence collaborator for a stored cell.
pub type CellId = i64;

/// A student placed into one column of one time slot.
///
/// Within a slot, `column_number` is unique and lies in `1..=capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnAssignment {
    /// Start of the slot.
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    /// The placed student.
    pub student_id: StudentId,
    /// 1-based column within the slot.
    pub column_number: u32,
}

impl ColumnAssignment {
    /// Returns the end of the slot for a grid of the given interval.
    pub fn time_end(&self, interval_minutes: u32) -> NaiveTime {
        self.time + Duration::minutes(i64::from(interval_minutes))
    }
}

/// An occupant that could not be placed because every column was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverflowEntry {
    /// Start of the full slot.
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    /// The student left out.
    pub student_id: StudentId,
}

/// The record written for each assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRecord {
    /// Owning tutoring center.
    pub center_id: i64,
    /// Schedule (one day's grid) the cell belongs to.
    pub schedule_id: i64,
    /// Imports never place an instructor.
    pub instructor_id: Option<i64>,
    /// The placed student.
    pub student_id: StudentId,
    /// Slot start.
    #[serde(with = "hhmm")]
    pub time_start: NaiveTime,
    /// Slot end.
    #[serde(with = "hhmm")]
    pub time_end: NaiveTime,
    /// 1-based column within the slot.
    pub column_number: u32,
}

impl CellRecord {
    /// Builds the cell for an assignment on the given schedule.
    pub fn from_assignment(
        assignment: &ColumnAssignment,
        center_id: i64,
        schedule_id: i64,
        interval_minutes: u32,
    ) -> Self {
        Self {
            center_id,
            schedule_id,
            instructor_id: None,
            student_id: assignment.student_id,
            time_start: assignment.time,
            time_end: assignment.time_end(interval_minutes),
            column_number: assignment.column_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_record_from_assignment() {
        let assignment = ColumnAssignment {
            time: NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
            student_id: 42,
            column_number: 2,
        };
        let cell = CellRecord::from_assignment(&assignment, 1, 9, 30);

        assert_eq!(cell.instructor_id, None);
        assert_eq!(cell.time_end, NaiveTime::from_hms_opt(16, 0, 0).unwrap());

        let json = serde_json::to_value(&cell).unwrap();
        assert_eq!(json["time_start"], "15:30");
        assert_eq!(json["time_end"], "16:00");
        assert_eq!(json["instructor_id"], serde_json::Value::Null);
        assert_eq!(json["column_number"], 2);
    }
}
