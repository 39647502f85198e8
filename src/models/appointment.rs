//! Appointment, roster and session-type models.
//!
//! An [`AppointmentRow`] is what the parser reads out of an uploaded file;
//! a [`ResolvedAppointment`] is the same row once its student and session
//! type have been looked up. Both live only for one import.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::time_slot::hhmm;

/// Identifier of a student in the roster.
pub type StudentId = i64;

/// Identifier of a session type.
pub type SessionTypeId = i64;

/// A normalized row read from an appointment file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentRow {
    /// 1-based line number of the record in the source file.
    pub line: usize,
    /// When the appointment starts.
    pub appointment_date: NaiveDateTime,
    /// Student display name as written in the file.
    pub student_name: String,
    /// Session type alias as written in the file.
    pub session_type_label: String,
}

/// An appointment whose student and session type are both known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAppointment {
    /// Calendar date of the appointment.
    pub date: NaiveDate,
    /// Start time of the appointment.
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    /// The matched student.
    pub student_id: StudentId,
    /// The matched session type.
    pub session_type_id: SessionTypeId,
    /// Session length taken from the session type.
    pub duration_minutes: u32,
}

/// A student as held by the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// Unique identifier for the student.
    pub id: StudentId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Inactive students are never matched by an import.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl StudentRecord {
    /// Returns the `"First Last"` display name.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A kind of tutoring session and the alias used for it in imported files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionType {
    /// Unique identifier for the session type.
    pub id: SessionTypeId,
    /// Human-readable name.
    pub name: String,
    /// Alias matched against the file's session type column.
    pub alias: String,
    /// Length of one session.
    pub duration_minutes: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_joins_first_and_last() {
        let student = StudentRecord {
            id: 7,
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            active: true,
        };
        assert_eq!(student.display_name(), "Ann Lee");
    }

    #[test]
    fn test_student_active_defaults_to_true() {
        let student: StudentRecord =
            serde_json::from_str(r#"{"id": 1, "first_name": "Bo", "last_name": "Kim"}"#).unwrap();
        assert!(student.active);
    }

    #[test]
    fn test_resolved_appointment_time_is_hhmm() {
        let appointment = ResolvedAppointment {
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            time: NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
            student_id: 1,
            session_type_id: 2,
            duration_minutes: 60,
        };
        let json = serde_json::to_value(&appointment).unwrap();
        assert_eq!(json["time"], "15:30");
        assert_eq!(json["date"], "2026-03-02");
    }
}
