//! Configuration types for the schedule grid.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::engine::generate_time_slots;
use crate::error::{EngineError, EngineResult};
use crate::models::{SessionType, StudentRecord, TimeSlot, format_time_of_day, hhmm};

/// Number of student columns in one pod of the room layout.
pub const SLOTS_PER_POD: u32 = 3;

/// Layout of one day's schedule grid.
///
/// # Example
///
/// ```
/// use grid_import_engine::config::GridConfig;
/// use chrono::NaiveTime;
///
/// let grid = GridConfig {
///     num_pods: 2,
///     interval_minutes: 30,
///     window_start: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
///     window_end: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
/// };
///
/// assert_eq!(grid.capacity(), 6);
/// assert_eq!(grid.time_slots().unwrap().len(), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of pods in the room.
    pub num_pods: u32,
    /// Width of each time slot.
    pub interval_minutes: u32,
    /// First slot start, `HH:MM`.
    #[serde(with = "hhmm")]
    pub window_start: NaiveTime,
    /// Slots stop once their start reaches this time, `HH:MM`.
    #[serde(with = "hhmm")]
    pub window_end: NaiveTime,
}

impl GridConfig {
    /// Total number of columns per time slot.
    pub fn capacity(&self) -> u32 {
        self.num_pods.saturating_mul(SLOTS_PER_POD)
    }

    /// Checks that the grid can produce a schedule.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidGrid`] naming the first offending field.
    pub fn validate(&self) -> EngineResult<()> {
        if self.num_pods == 0 {
            return Err(EngineError::InvalidGrid {
                field: "num_pods".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.interval_minutes == 0 {
            return Err(EngineError::InvalidGrid {
                field: "interval_minutes".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.window_start >= self.window_end {
            return Err(EngineError::InvalidGrid {
                field: "window_start".to_string(),
                message: format!(
                    "{} is not before window_end {}",
                    format_time_of_day(self.window_start),
                    format_time_of_day(self.window_end)
                ),
            });
        }
        Ok(())
    }

    /// Generates the grid's time slots.
    pub fn time_slots(&self) -> EngineResult<Vec<TimeSlot>> {
        generate_time_slots(self.window_start, self.window_end, self.interval_minutes)
    }
}

/// Roster file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RosterConfig {
    /// Every student known to the center.
    #[serde(default)]
    pub students: Vec<StudentRecord>,
}

/// Session types file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionTypesConfig {
    /// Every bookable session type.
    #[serde(default)]
    pub session_types: Vec<SessionType>,
}
