//! Import orchestration.
//!
//! Runs the whole pipeline for one uploaded file: parse, resolve, then per
//! target schedule build occupancy, drop off-grid occupants, assign columns
//! and hand the cells to a [`CellPersister`]. Soft losses are counted and
//! described in the returned [`ImportReport`]; only degenerate input, a
//! failing lookup source or a broken grid return an error.

use std::collections::HashSet;
use std::time::Instant;

use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::GridConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CellFailure, CellRecord, ColumnAssignment, ImportCounts, ImportReport, ImportWarning,
    OverflowEntry, TargetSummary, WarningKind, format_time_of_day,
};
use crate::persistence::CellPersister;

use super::column_assignment::assign_columns;
use super::lookup::{LookupCache, LookupSource, resolve_appointments};
use super::occupancy::build_occupancy;
use super::row_parser::parse_appointment_rows;

/// A schedule to fill and the date it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTarget {
    /// The schedule cells are written to.
    pub schedule_id: i64,
    /// Only rows on this date land on the schedule.
    pub date: NaiveDate,
}

/// One uploaded file and the schedules it should fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRequest {
    /// Owning tutoring center.
    pub center_id: i64,
    /// One entry for a day import, several for a week.
    pub targets: Vec<ScheduleTarget>,
    /// Raw CSV or TSV text, header line included.
    pub content: String,
}

impl ImportRequest {
    /// Builds a request for a single day's schedule.
    pub fn for_day(
        center_id: i64,
        schedule_id: i64,
        date: NaiveDate,
        content: impl Into<String>,
    ) -> Self {
        Self {
            center_id,
            targets: vec![ScheduleTarget { schedule_id, date }],
            content: content.into(),
        }
    }

    fn validate(&self) -> EngineResult<()> {
        if self.targets.is_empty() {
            return Err(EngineError::InvalidImport {
                message: "no target schedules".to_string(),
            });
        }

        let mut seen = HashSet::with_capacity(self.targets.len());
        for target in &self.targets {
            if !seen.insert(target.date) {
                return Err(EngineError::InvalidImport {
                    message: format!("date {} is targeted more than once", target.date),
                });
            }
        }
        Ok(())
    }
}

/// What the pipeline decided for one target, before anything is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPlan {
    /// The schedule being filled.
    pub target: ScheduleTarget,
    /// Resolved rows on the target date.
    pub rows_matched: usize,
    /// Placed occupants in slot order.
    pub assignments: Vec<ColumnAssignment>,
    /// Occupants that found their slot full.
    pub overflow: Vec<OverflowEntry>,
    /// One cell per assignment, ready to persist.
    pub cells: Vec<CellRecord>,
}

/// The computed outcome of an import, before persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportPlan {
    /// Stage counts; `persisted` is still zero.
    pub counts: ImportCounts,
    /// One plan per target, in request order.
    pub targets: Vec<TargetPlan>,
    /// Everything dropped so far.
    pub warnings: Vec<ImportWarning>,
}

impl ImportPlan {
    /// Returns every cell to write, target by target.
    pub fn cells(&self) -> Vec<CellRecord> {
        self.targets
            .iter()
            .flat_map(|plan| plan.cells.iter().cloned())
            .collect()
    }
}

fn with_schedule(mut warning: ImportWarning, schedule_id: i64) -> ImportWarning {
    if let serde_json::Value::Object(context) = &mut warning.context {
        context.insert("schedule_id".to_string(), json!(schedule_id));
    }
    warning
}

/// Computes every assignment an import would write.
///
/// The grid and the request are checked before any row is read. Parsing
/// and resolution run once; each target then gets its own occupancy and a
/// fresh column pass.
///
/// # Errors
///
/// - [`EngineError::InvalidGrid`] / [`EngineError::InvalidCapacity`] for a
///   degenerate grid
/// - [`EngineError::InvalidImport`] for no targets or a repeated date
/// - Any error from the [`LookupSource`]
pub fn plan_import(
    request: &ImportRequest,
    grid: &GridConfig,
    source: &dyn LookupSource,
    cache: &mut LookupCache,
) -> EngineResult<ImportPlan> {
    grid.validate()?;
    let capacity = grid.capacity();
    if capacity == 0 {
        return Err(EngineError::InvalidCapacity { capacity });
    }
    let slot_starts: HashSet<NaiveTime> = grid
        .time_slots()?
        .into_iter()
        .map(|slot| slot.start)
        .collect();
    request.validate()?;

    let mut plan = ImportPlan::default();

    let parsed = parse_appointment_rows(&request.content);
    plan.counts.rows_parsed = parsed.rows.len();
    plan.counts.rows_malformed = parsed.malformed.len();
    plan.warnings.extend(parsed.malformed);

    let resolution = resolve_appointments(&parsed.rows, source, cache)?;
    plan.counts.rows_resolved = resolution.resolved.len();
    plan.counts.dropped_for_lookup = resolution.unresolved.len();
    plan.warnings.extend(resolution.unresolved);

    let target_dates: HashSet<NaiveDate> = request.targets.iter().map(|t| t.date).collect();
    plan.counts.dropped_for_date = resolution
        .resolved
        .iter()
        .filter(|appointment| !target_dates.contains(&appointment.date))
        .count();

    for target in &request.targets {
        let mut occupancy =
            build_occupancy(&resolution.resolved, target.date, grid.interval_minutes)?;

        for (time, students) in occupancy
            .occupancy
            .split_off_unless(|time| slot_starts.contains(&time))
        {
            for student_id in students {
                warn!(
                    schedule_id = target.schedule_id,
                    time = %format_time_of_day(time),
                    student_id,
                    "Occupant outside the grid; dropped"
                );
                plan.counts.dropped_off_grid += 1;
                plan.warnings.push(ImportWarning::for_grid(
                    WarningKind::OffGrid,
                    format!(
                        "{} is not a slot on the grid; student {} was not placed",
                        format_time_of_day(time),
                        student_id
                    ),
                    json!({
                        "schedule_id": target.schedule_id,
                        "time": format_time_of_day(time),
                        "student_id": student_id,
                    }),
                ));
            }
        }

        let assigned = assign_columns(&occupancy.occupancy, capacity, grid.interval_minutes)?;
        plan.counts.dropped_for_overflow += assigned.overflow.len();
        plan.counts.assignments += assigned.assignments.len();
        plan.warnings.extend(
            assigned
                .overflow_warnings()
                .into_iter()
                .map(|warning| with_schedule(warning, target.schedule_id)),
        );

        let cells = assigned
            .assignments
            .iter()
            .map(|assignment| {
                CellRecord::from_assignment(
                    assignment,
                    request.center_id,
                    target.schedule_id,
                    grid.interval_minutes,
                )
            })
            .collect();

        plan.targets.push(TargetPlan {
            target: *target,
            rows_matched: occupancy.rows_matched,
            assignments: assigned.assignments,
            overflow: assigned.overflow,
            cells,
        });
    }

    Ok(plan)
}

/// Runs an import end to end and persists the result.
///
/// All cells go to the persister in one [`CellPersister::insert_batch`]
/// call. Cells that fail to write are listed in
/// [`ImportReport::failures`]; they do not turn the run into an error.
///
/// # Example
///
/// ```
/// use chrono::{NaiveDate, NaiveTime};
/// use grid_import_engine::config::GridConfig;
/// use grid_import_engine::engine::{ImportRequest, LookupCache, LookupSource, run_import};
/// use grid_import_engine::error::EngineResult;
/// use grid_import_engine::models::{SessionType, StudentRecord};
/// use grid_import_engine::persistence::MemoryPersister;
///
/// struct Tables;
///
/// impl LookupSource for Tables {
///     fn students(&self) -> EngineResult<Vec<StudentRecord>> {
///         Ok(vec![StudentRecord {
///             id: 1,
///             first_name: "Ann".to_string(),
///             last_name: "Lee".to_string(),
///             active: true,
///         }])
///     }
///
///     fn session_types(&self) -> EngineResult<Vec<SessionType>> {
///         Ok(vec![SessionType {
///             id: 1,
///             name: "Standard".to_string(),
///             alias: "typeA".to_string(),
///             duration_minutes: 30,
///         }])
///     }
/// }
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let grid = GridConfig {
///     num_pods: 1,
///     interval_minutes: 30,
///     window_start: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
///     window_end: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
/// };
/// let request = ImportRequest::for_day(
///     1,
///     10,
///     NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
///     "date,student,type\n2026-03-02 15:00,Ann Lee,typeA\n",
/// );
/// let persister = MemoryPersister::new();
///
/// let report = run_import(&request, &grid, &Tables, &mut LookupCache::new(), &persister)
///     .await
///     .unwrap();
///
/// assert!(report.is_success());
/// assert_eq!(report.counts.persisted, 1);
/// # });
/// ```
pub async fn run_import(
    request: &ImportRequest,
    grid: &GridConfig,
    source: &dyn LookupSource,
    cache: &mut LookupCache,
    persister: &dyn CellPersister,
) -> EngineResult<ImportReport> {
    let import_id = Uuid::new_v4();
    let timestamp = Utc::now();
    let start_time = Instant::now();

    info!(
        import_id = %import_id,
        center_id = request.center_id,
        targets = request.targets.len(),
        "Starting import"
    );

    let plan = plan_import(request, grid, source, cache).inspect_err(|err| {
        warn!(import_id = %import_id, error = %err, "Import rejected");
    })?;

    let cells = plan.cells();
    let ImportPlan {
        mut counts,
        targets,
        mut warnings,
    } = plan;

    let mut results = persister.insert_batch(&cells).await.into_iter();

    let mut failures = Vec::new();
    let mut summaries = Vec::with_capacity(targets.len());

    for target in targets {
        let mut persisted = 0;

        for cell in target.cells {
            let outcome = results.next().unwrap_or_else(|| {
                Err(EngineError::Persistence {
                    message: "no result returned for cell".to_string(),
                })
            });

            match outcome {
                Ok(_) => persisted += 1,
                Err(err) => {
                    warn!(
                        import_id = %import_id,
                        schedule_id = cell.schedule_id,
                        student_id = cell.student_id,
                        time = %format_time_of_day(cell.time_start),
                        error = %err,
                        "Cell insert failed"
                    );
                    warnings.push(ImportWarning::for_grid(
                        WarningKind::PersistFailed,
                        format!(
                            "Cell for student {} at {} was not stored",
                            cell.student_id,
                            format_time_of_day(cell.time_start)
                        ),
                        json!({
                            "schedule_id": cell.schedule_id,
                            "time": format_time_of_day(cell.time_start),
                            "student_id": cell.student_id,
                            "column_number": cell.column_number,
                        }),
                    ));
                    failures.push(CellFailure {
                        cell,
                        error: err.to_string(),
                    });
                }
            }
        }

        counts.persisted += persisted;
        summaries.push(TargetSummary {
            schedule_id: target.target.schedule_id,
            date: target.target.date,
            rows_matched: target.rows_matched,
            assignments: target.assignments,
            overflow: target.overflow,
            persisted,
        });
    }

    let duration_us = start_time.elapsed().as_micros() as u64;

    info!(
        import_id = %import_id,
        rows_parsed = counts.rows_parsed,
        rows_resolved = counts.rows_resolved,
        assignments = counts.assignments,
        persisted = counts.persisted,
        failures = failures.len(),
        duration_us,
        "Import finished"
    );

    Ok(ImportReport {
        import_id,
        timestamp,
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        counts,
        targets: summaries,
        failures,
        warnings,
        duration_us,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellId, SessionType, StudentRecord};
    use crate::persistence::MemoryPersister;
    use async_trait::async_trait;

    struct Tables;

    impl LookupSource for Tables {
        fn students(&self) -> EngineResult<Vec<StudentRecord>> {
            let student = |id, first: &str, last: &str| StudentRecord {
                id,
                first_name: first.to_string(),
                last_name: last.to_string(),
                active: true,
            };
            Ok(vec![
                student(1, "Ann", "Lee"),
                student(2, "Bo", "Kim"),
                student(3, "Cy", "Fox"),
                student(4, "Di", "Wu"),
            ])
        }

        fn session_types(&self) -> EngineResult<Vec<SessionType>> {
            Ok(vec![
                SessionType {
                    id: 1,
                    name: "Standard".to_string(),
                    alias: "typeA".to_string(),
                    duration_minutes: 30,
                },
                SessionType {
                    id: 2,
                    name: "Extended".to_string(),
                    alias: "typeB".to_string(),
                    duration_minutes: 60,
                },
            ])
        }
    }

    /// Rejects every cell for one student.
    struct RejectStudent(i64);

    #[async_trait]
    impl CellPersister for RejectStudent {
        async fn insert_cell(&self, cell: &CellRecord) -> EngineResult<CellId> {
            if cell.student_id == self.0 {
                Err(EngineError::Persistence {
                    message: "constraint violation".to_string(),
                })
            } else {
                Ok(cell.student_id * 100 + i64::from(cell.column_number))
            }
        }
    }

    fn grid(num_pods: u32) -> GridConfig {
        GridConfig {
            num_pods,
            interval_minutes: 30,
            window_start: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            window_end: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    const DAY_FILE: &str = "Date,Student,Type\n\
        2026-03-02 15:00,Ann Lee,typeA\n\
        2026-03-02 15:00,Bo Kim,typeA\n\
        2026-03-02 15:30,Cy Fox,typeA\n";

    #[test]
    fn test_plan_places_day_file() {
        let request = ImportRequest::for_day(1, 10, date(2), DAY_FILE);
        let plan = plan_import(&request, &grid(1), &Tables, &mut LookupCache::new()).unwrap();

        assert_eq!(plan.counts.rows_parsed, 3);
        assert_eq!(plan.counts.rows_resolved, 3);
        assert_eq!(plan.counts.assignments, 3);

        let placed: Vec<(NaiveTime, i64, u32)> = plan.targets[0]
            .assignments
            .iter()
            .map(|a| (a.time, a.student_id, a.column_number))
            .collect();
        assert_eq!(
            placed,
            vec![(time(15, 0), 1, 1), (time(15, 0), 2, 2), (time(15, 30), 3, 1)]
        );

        let cells = plan.cells();
        assert_eq!(cells[2].time_end, time(16, 0));
        assert_eq!(cells[0].schedule_id, 10);
        assert_eq!(cells[0].center_id, 1);
    }

    #[test]
    fn test_plan_drops_continuation_past_window_end() {
        let content = "Date,Student,Type\n2026-03-02 15:30,Di Wu,typeB\n";
        let request = ImportRequest::for_day(1, 10, date(2), content);
        let plan = plan_import(&request, &grid(1), &Tables, &mut LookupCache::new()).unwrap();

        assert_eq!(plan.counts.assignments, 1);
        assert_eq!(plan.counts.dropped_off_grid, 1);
        assert_eq!(plan.warnings[0].kind, WarningKind::OffGrid);
        assert_eq!(plan.warnings[0].context["time"], "16:00");
    }

    #[test]
    fn test_plan_counts_rows_for_other_dates() {
        let content = "Date,Student,Type\n\
            2026-03-02 15:00,Ann Lee,typeA\n\
            2026-03-03 15:00,Bo Kim,typeA\n";
        let request = ImportRequest::for_day(1, 10, date(2), content);
        let plan = plan_import(&request, &grid(1), &Tables, &mut LookupCache::new()).unwrap();

        assert_eq!(plan.counts.dropped_for_date, 1);
        assert_eq!(plan.targets[0].rows_matched, 1);
    }

    #[test]
    fn test_plan_rejects_duplicate_target_dates() {
        let request = ImportRequest {
            center_id: 1,
            targets: vec![
                ScheduleTarget {
                    schedule_id: 10,
                    date: date(2),
                },
                ScheduleTarget {
                    schedule_id: 11,
                    date: date(2),
                },
            ],
            content: DAY_FILE.to_string(),
        };
        let result = plan_import(&request, &grid(1), &Tables, &mut LookupCache::new());
        assert!(matches!(result, Err(EngineError::InvalidImport { .. })));
    }

    #[test]
    fn test_plan_rejects_degenerate_grid_before_reading_rows() {
        let request = ImportRequest::for_day(1, 10, date(2), DAY_FILE);
        let mut cache = LookupCache::new();

        let result = plan_import(&request, &grid(0), &Tables, &mut cache);

        assert!(matches!(result, Err(EngineError::InvalidGrid { .. })));
        assert!(!cache.is_warm());
    }

    #[tokio::test]
    async fn test_run_import_persists_every_cell() {
        let request = ImportRequest::for_day(1, 10, date(2), DAY_FILE);
        let persister = MemoryPersister::new();

        let report = run_import(
            &request,
            &grid(1),
            &Tables,
            &mut LookupCache::new(),
            &persister,
        )
        .await
        .unwrap();

        assert!(report.is_success());
        assert_eq!(report.counts.persisted, 3);
        assert_eq!(report.targets[0].persisted, 3);
        assert_eq!(persister.len().await, 3);
        assert_eq!(report.engine_version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_run_import_reports_failed_cells() {
        let request = ImportRequest::for_day(1, 10, date(2), DAY_FILE);

        let report = run_import(
            &request,
            &grid(1),
            &Tables,
            &mut LookupCache::new(),
            &RejectStudent(2),
        )
        .await
        .unwrap();

        assert!(!report.is_success());
        assert_eq!(report.counts.persisted, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.first_failure().unwrap().cell.student_id, 2);
        assert_eq!(report.warnings_of(WarningKind::PersistFailed).count(), 1);
    }
}
