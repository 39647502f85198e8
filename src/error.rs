//! Error types for the grid import engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for the hard failures of an import. Soft failures (malformed rows,
//! unresolved lookups, overflow) are never errors; they are counted in the
//! [`ImportReport`](crate::models::ImportReport).

use thiserror::Error;

/// The main error type for the grid import engine.
///
/// # Example
///
/// ```
/// use grid_import_engine::error::EngineError;
///
/// let error = EngineError::InvalidCapacity { capacity: 0 };
/// assert_eq!(error.to_string(), "Invalid grid capacity: 0 (must be at least 1)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// The grid layout cannot produce a usable schedule.
    #[error("Invalid grid field '{field}': {message}")]
    InvalidGrid {
        /// The grid field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// Column assignment was requested with no columns to assign.
    #[error("Invalid grid capacity: {capacity} (must be at least 1)")]
    InvalidCapacity {
        /// The rejected capacity.
        capacity: u32,
    },

    /// A time of day was not in `HH:MM` form.
    #[error("Invalid time of day: '{value}' (expected HH:MM)")]
    InvalidTime {
        /// The rejected text.
        value: String,
    },

    /// The import request itself was unusable.
    #[error("Invalid import request: {message}")]
    InvalidImport {
        /// A description of the problem.
        message: String,
    },

    /// The roster or session-type source could not be read.
    #[error("Lookup source error: {message}")]
    LookupSource {
        /// A description of the failure.
        message: String,
    },

    /// A cell could not be written by the persistence collaborator.
    #[error("Persistence error: {message}")]
    Persistence {
        /// A description of the failure.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

impl From<rusqlite::Error> for EngineError {
    fn from(error: rusqlite::Error) -> Self {
        EngineError::Persistence {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/grid.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/grid.yaml"
        );
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = EngineError::ConfigParseError {
            path: "/config/bad.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/bad.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_invalid_grid_displays_field_and_message() {
        let error = EngineError::InvalidGrid {
            field: "interval_minutes".to_string(),
            message: "must be greater than zero".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid grid field 'interval_minutes': must be greater than zero"
        );
    }

    #[test]
    fn test_invalid_time_displays_value() {
        let error = EngineError::InvalidTime {
            value: "25:99".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid time of day: '25:99' (expected HH:MM)"
        );
    }

    #[test]
    fn test_persistence_error_displays_message() {
        let error = EngineError::Persistence {
            message: "disk full".to_string(),
        };
        assert_eq!(error.to_string(), "Persistence error: disk full");
    }

    #[test]
    fn test_sqlite_error_converts_to_persistence() {
        let error: EngineError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(error, EngineError::Persistence { .. }));
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_invalid_capacity() -> EngineResult<()> {
            Err(EngineError::InvalidCapacity { capacity: 0 })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_invalid_capacity()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
