//! Core data models for the grid import engine.
//!
//! This module contains all the domain models used throughout the engine.

mod appointment;
mod assignment;
mod import_report;
mod occupancy;
mod time_slot;

pub use appointment::{
    AppointmentRow, ResolvedAppointment, SessionType, SessionTypeId, StudentId, StudentRecord,
};
pub use assignment::{CellId, CellRecord, ColumnAssignment, OverflowEntry};
pub use import_report::{
    CellFailure, ImportCounts, ImportReport, ImportWarning, TargetSummary, WarningKind,
};
pub use occupancy::Occupancy;
pub use time_slot::{TIME_FORMAT, TimeSlot, format_time_of_day, hhmm, parse_time_of_day};
