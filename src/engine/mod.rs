//! The appointment import pipeline.
//!
//! Each stage is a plain function over the models, leaves first: time slot
//! generation, row parsing, lookup resolution, occupancy building and
//! column assignment. [`run_import`] chains them for one uploaded file and
//! hands the result to a [`CellPersister`](crate::persistence::CellPersister).

mod column_assignment;
mod importer;
mod lookup;
mod occupancy;
mod row_parser;
mod time_slots;

pub use column_assignment::{AssignmentResult, assign_columns};
pub use importer::{
    ImportPlan, ImportRequest, ScheduleTarget, TargetPlan, plan_import, run_import,
};
pub use lookup::{
    LookupCache, LookupSource, ResolutionResult, SessionTypeInfo, lookup_key,
    resolve_appointments,
};
pub use occupancy::{OccupancyResult, build_occupancy};
pub use row_parser::{
    Delimiter, MIN_ROW_FIELDS, RowParseResult, parse_appointment_datetime, parse_appointment_rows,
};
pub use time_slots::generate_time_slots;
