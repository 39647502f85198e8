//! Time slot model and `HH:MM` helpers.
//!
//! Grid times are wall-clock times of day. They are carried as
//! [`NaiveTime`] and rendered as zero-padded `HH:MM`, so chronological and
//! lexicographic order agree.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The canonical text format for grid times.
pub const TIME_FORMAT: &str = "%H:%M";

/// Parses a `HH:MM` time of day.
///
/// # Example
///
/// ```
/// use grid_import_engine::models::parse_time_of_day;
/// use chrono::NaiveTime;
///
/// let time = parse_time_of_day("15:30").unwrap();
/// assert_eq!(time, NaiveTime::from_hms_opt(15, 30, 0).unwrap());
/// assert!(parse_time_of_day("3pm").is_err());
/// ```
pub fn parse_time_of_day(value: &str) -> EngineResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT).map_err(|_| EngineError::InvalidTime {
        value: value.to_string(),
    })
}

/// Formats a time of day as zero-padded `HH:MM`.
pub fn format_time_of_day(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Serde adapter storing a [`NaiveTime`] as `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes a time of day as `HH:MM`.
    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_time_of_day(*time))
    }

    /// Deserializes a `HH:MM` time of day.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_time_of_day(&text).map_err(serde::de::Error::custom)
    }
}

/// One row of the schedule grid: the half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Inclusive start of the slot.
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    /// Exclusive end of the slot.
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl TimeSlot {
    /// Returns the slot key, the `HH:MM` rendering of its start.
    pub fn key(&self) -> String {
        format_time_of_day(self.start)
    }

    /// Returns the slot width in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_parse_time_of_day_accepts_padded_and_trimmed() {
        assert_eq!(parse_time_of_day("09:05").unwrap(), time(9, 5));
        assert_eq!(parse_time_of_day(" 16:00 ").unwrap(), time(16, 0));
    }

    #[test]
    fn test_parse_time_of_day_rejects_garbage() {
        match parse_time_of_day("25:00") {
            Err(EngineError::InvalidTime { value }) => assert_eq!(value, "25:00"),
            other => panic!("Expected InvalidTime, got {:?}", other),
        }
    }

    #[test]
    fn test_format_is_zero_padded() {
        assert_eq!(format_time_of_day(time(9, 0)), "09:00");
    }

    #[test]
    fn test_time_slot_serializes_as_hhmm() {
        let slot = TimeSlot {
            start: time(15, 0),
            end: time(15, 30),
        };
        let json = serde_json::to_string(&slot).unwrap();
        assert_eq!(json, r#"{"start":"15:00","end":"15:30"}"#);

        let back: TimeSlot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, slot);
        assert_eq!(back.key(), "15:00");
        assert_eq!(back.duration_minutes(), 30);
    }
}
