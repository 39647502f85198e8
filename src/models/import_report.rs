//! Import report models.
//!
//! This module contains the [`ImportReport`] returned by every import run.
//! It records how many rows survived each stage, what was placed on each
//! target schedule, which cells failed to persist, and a warning for every
//! row or occupant that was dropped along the way.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::assignment::{CellRecord, ColumnAssignment, OverflowEntry};

/// What kind of loss a warning describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// The row had too few fields or an unreadable date.
    MalformedRow,
    /// No active student matched the row's name.
    UnknownStudent,
    /// No session type matched the row's alias.
    UnknownSessionType,
    /// The occupant's slot is not drawn on the grid.
    OffGrid,
    /// Every column of the slot was already taken.
    Overflow,
    /// The persistence collaborator rejected the cell.
    PersistFailed,
}

/// A non-fatal problem found during an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportWarning {
    /// The kind of loss.
    pub kind: WarningKind,
    /// Human-readable description.
    pub message: String,
    /// Source line, when the warning is about a file row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Structured details for programmatic handling.
    pub context: serde_json::Value,
}

impl ImportWarning {
    /// Creates a warning tied to a source line.
    pub fn for_line(
        kind: WarningKind,
        line: usize,
        message: impl Into<String>,
        context: serde_json::Value,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            line: Some(line),
            context,
        }
    }

    /// Creates a warning about a grid cell rather than a file row.
    pub fn for_grid(kind: WarningKind, message: impl Into<String>, context: serde_json::Value) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
            context,
        }
    }
}

/// Row and cell counts for each stage of an import.
///
/// `rows_parsed == rows_resolved + dropped_for_lookup` always holds, and
/// resolved rows split into those matching a target date and
/// `dropped_for_date`. The occupant-level counts (`dropped_off_grid`,
/// `dropped_for_overflow`, `assignments`) count slot entries, not rows: a
/// two-slot session contributes two.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportCounts {
    /// Rows read with all fields and a usable date.
    pub rows_parsed: usize,
    /// Rows discarded by the parser.
    pub rows_malformed: usize,
    /// Rows whose student and session type were both found.
    pub rows_resolved: usize,
    /// Rows dropped because a lookup failed.
    pub dropped_for_lookup: usize,
    /// Resolved rows whose date matched no target schedule.
    pub dropped_for_date: usize,
    /// Occupant entries outside the grid's slots.
    pub dropped_off_grid: usize,
    /// Occupant entries left out because their slot was full.
    pub dropped_for_overflow: usize,
    /// Column assignments emitted.
    pub assignments: usize,
    /// Cells the persistence collaborator stored.
    pub persisted: usize,
}

/// What one target schedule received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSummary {
    /// The schedule written to.
    pub schedule_id: i64,
    /// The date the schedule covers.
    pub date: NaiveDate,
    /// Resolved rows that fell on this date.
    pub rows_matched: usize,
    /// Assignments in slot order, then occupant order.
    pub assignments: Vec<ColumnAssignment>,
    /// Occupants that did not fit.
    pub overflow: Vec<OverflowEntry>,
    /// Cells stored for this schedule.
    pub persisted: usize,
}

/// A cell that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellFailure {
    /// The cell that was rejected.
    pub cell: CellRecord,
    /// The collaborator's error message.
    pub error: String,
}

/// The complete result of an import run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Correlation identifier for this import.
    pub import_id: Uuid,
    /// When the import started.
    pub timestamp: DateTime<Utc>,
    /// The version of the engine that ran the import.
    pub engine_version: String,
    /// Stage counts.
    pub counts: ImportCounts,
    /// One summary per target schedule, in request order.
    pub targets: Vec<TargetSummary>,
    /// Cells that failed to persist, in issue order.
    pub failures: Vec<CellFailure>,
    /// Everything that was dropped, with the reason.
    pub warnings: Vec<ImportWarning>,
    /// Wall-clock duration of the run in microseconds.
    pub duration_us: u64,
}

impl ImportReport {
    /// Returns the first cell that failed to persist, if any.
    pub fn first_failure(&self) -> Option<&CellFailure> {
        self.failures.first()
    }

    /// Returns true when every emitted assignment was stored.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.counts.persisted == self.counts.assignments
    }

    /// Returns the warnings of one kind.
    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &ImportWarning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}
