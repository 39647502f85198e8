//! Student and session-type lookup.
//!
//! Rows name students by display name and session types by alias. This
//! module resolves both against a [`LookupSource`] through an explicit
//! read-through [`LookupCache`] owned by the caller.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde_json::json;
use tracing::{debug, warn};

use crate::error::EngineResult;
use crate::models::{
    AppointmentRow, ImportWarning, ResolvedAppointment, SessionType, SessionTypeId, StudentId,
    StudentRecord, WarningKind,
};

/// Read access to the roster and session-type tables.
///
/// Implemented by the loaded configuration and by the SQLite store, and by
/// any host that keeps these tables elsewhere.
pub trait LookupSource: Send + Sync {
    /// Returns every student, active or not.
    fn students(&self) -> EngineResult<Vec<StudentRecord>>;

    /// Returns every session type.
    fn session_types(&self) -> EngineResult<Vec<SessionType>>;
}

/// The parts of a session type an import needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTypeInfo {
    /// The session type's identifier.
    pub id: SessionTypeId,
    /// Length of one session.
    pub duration_minutes: u32,
}

/// Normalizes a name or alias into its lookup key.
///
/// Trims, collapses whitespace runs to one space and lowercases.
///
/// # Example
///
/// ```
/// use grid_import_engine::engine::lookup_key;
///
/// assert_eq!(lookup_key("  Ann   LEE "), "ann lee");
/// ```
pub fn lookup_key(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Read-through cache of the normalized lookup tables.
///
/// Each table is read from the source on first use and kept until
/// [`invalidate`](LookupCache::invalidate) is called, so a roster change
/// made between imports is only seen after invalidation.
#[derive(Debug, Default)]
pub struct LookupCache {
    students: Option<HashMap<String, StudentId>>,
    session_types: Option<HashMap<String, SessionTypeInfo>>,
}

impl LookupCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops both cached tables.
    pub fn invalidate(&mut self) {
        self.students = None;
        self.session_types = None;
    }

    /// Returns true when both tables have been loaded.
    pub fn is_warm(&self) -> bool {
        self.students.is_some() && self.session_types.is_some()
    }

    /// Replaces both tables with ones built from already-fetched records.
    ///
    /// Lets an async caller read the source off the executor and hand the
    /// records over, so later lookups never touch the source.
    pub fn warm(&mut self, students: Vec<StudentRecord>, session_types: Vec<SessionType>) {
        self.students = Some(build_student_table(students));
        self.session_types = Some(build_session_type_table(session_types));
    }

    /// Looks up an active student by `"First Last"` display name.
    pub fn student_id(
        &mut self,
        source: &dyn LookupSource,
        name: &str,
    ) -> EngineResult<Option<StudentId>> {
        let students = self.student_table(source)?;
        Ok(students.get(&lookup_key(name)).copied())
    }

    /// Looks up a session type by alias.
    pub fn session_type(
        &mut self,
        source: &dyn LookupSource,
        alias: &str,
    ) -> EngineResult<Option<SessionTypeInfo>> {
        let session_types = self.session_type_table(source)?;
        Ok(session_types.get(&lookup_key(alias)).copied())
    }

    fn student_table(
        &mut self,
        source: &dyn LookupSource,
    ) -> EngineResult<&HashMap<String, StudentId>> {
        let table = match self.students.take() {
            Some(table) => table,
            None => build_student_table(source.students()?),
        };
        Ok(&*self.students.insert(table))
    }

    fn session_type_table(
        &mut self,
        source: &dyn LookupSource,
    ) -> EngineResult<&HashMap<String, SessionTypeInfo>> {
        let table = match self.session_types.take() {
            Some(table) => table,
            None => build_session_type_table(source.session_types()?),
        };
        Ok(&*self.session_types.insert(table))
    }
}

fn build_student_table(students: Vec<StudentRecord>) -> HashMap<String, StudentId> {
    let mut table = HashMap::new();
    for student in students.into_iter().filter(|s| s.active) {
        match table.entry(lookup_key(&student.display_name())) {
            Entry::Vacant(slot) => {
                slot.insert(student.id);
            }
            Entry::Occupied(existing) => {
                debug!(
                    name = %existing.key(),
                    kept = *existing.get(),
                    ignored = student.id,
                    "Duplicate active student name"
                );
            }
        }
    }
    table
}

fn build_session_type_table(session_types: Vec<SessionType>) -> HashMap<String, SessionTypeInfo> {
    let mut table = HashMap::new();
    for session_type in session_types {
        table
            .entry(lookup_key(&session_type.alias))
            .or_insert(SessionTypeInfo {
                id: session_type.id,
                duration_minutes: session_type.duration_minutes,
            });
    }
    table
}

/// The rows that resolved, plus one warning per row that did not.
#[derive(Debug, Clone, Default)]
pub struct ResolutionResult {
    /// Rows with both a student and a session type.
    pub resolved: Vec<ResolvedAppointment>,
    /// One warning per dropped row.
    pub unresolved: Vec<ImportWarning>,
}

/// Resolves parsed rows into appointments.
///
/// A row whose student or session type is unknown is dropped with a
/// warning; it never fails the batch. Only a failing [`LookupSource`]
/// returns an error.
pub fn resolve_appointments(
    rows: &[AppointmentRow],
    source: &dyn LookupSource,
    cache: &mut LookupCache,
) -> EngineResult<ResolutionResult> {
    let mut result = ResolutionResult::default();

    for row in rows {
        let Some(student_id) = cache.student_id(source, &row.student_name)? else {
            warn!(line = row.line, student_name = %row.student_name, "Unknown student");
            result.unresolved.push(ImportWarning::for_line(
                WarningKind::UnknownStudent,
                row.line,
                format!("No active student named '{}'", row.student_name),
                json!({ "student_name": row.student_name }),
            ));
            continue;
        };

        let Some(session_type) = cache.session_type(source, &row.session_type_label)? else {
            warn!(
                line = row.line,
                session_type = %row.session_type_label,
                "Unknown session type"
            );
            result.unresolved.push(ImportWarning::for_line(
                WarningKind::UnknownSessionType,
                row.line,
                format!("No session type with alias '{}'", row.session_type_label),
                json!({ "session_type": row.session_type_label }),
            ));
            continue;
        };

        result.resolved.push(ResolvedAppointment {
            date: row.appointment_date.date(),
            time: row.appointment_date.time(),
            student_id,
            session_type_id: session_type.id,
            duration_minutes: session_type.duration_minutes,
        });
    }

    Ok(result)
}
