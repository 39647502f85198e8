//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading a center's
//! grid layout, roster and session types from YAML files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::engine::LookupSource;
use crate::error::{EngineError, EngineResult};
use crate::models::{SessionType, StudentRecord};

use super::types::{GridConfig, RosterConfig, SessionTypesConfig};

/// Loads and provides access to a center's configuration.
///
/// # Directory Structure
///
/// ```text
/// config/center/
/// ├── grid.yaml           # Pods, interval and working window
/// ├── roster.yaml         # Students
/// └── session_types.yaml  # Session types with their aliases
/// ```
///
/// The loaded roster and session types serve as a [`LookupSource`], so an
/// import can run straight from the files.
///
/// # Example
///
/// ```no_run
/// use grid_import_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/center").unwrap();
/// println!("Grid capacity: {}", loader.grid().capacity());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    grid: GridConfig,
    students: Vec<StudentRecord>,
    session_types: Vec<SessionType>,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML or misses a required field
    /// - The grid layout fails [`GridConfig::validate`]
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let grid = Self::load_yaml::<GridConfig>(&path.join("grid.yaml"))?;
        grid.validate()?;

        let roster = Self::load_yaml::<RosterConfig>(&path.join("roster.yaml"))?;
        let session_types =
            Self::load_yaml::<SessionTypesConfig>(&path.join("session_types.yaml"))?;

        debug!(
            path = %path.display(),
            students = roster.students.len(),
            session_types = session_types.session_types.len(),
            "Loaded center configuration"
        );

        Ok(Self {
            grid,
            students: roster.students,
            session_types: session_types.session_types,
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the grid layout.
    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    /// Returns every roster entry, active or not.
    pub fn roster(&self) -> &[StudentRecord] {
        &self.students
    }

    /// Returns every configured session type.
    pub fn session_catalog(&self) -> &[SessionType] {
        &self.session_types
    }
}

impl LookupSource for ConfigLoader {
    fn students(&self) -> EngineResult<Vec<StudentRecord>> {
        Ok(self.students.clone())
    }

    fn session_types(&self) -> EngineResult<Vec<SessionType>> {
        Ok(self.session_types.clone())
    }
}
