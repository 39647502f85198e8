//! Configuration loading for a tutoring center.
//!
//! This module loads the grid layout, the student roster and the session
//! types from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use grid_import_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/center").unwrap();
//! println!("{} columns per slot", config.grid().capacity());
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{GridConfig, RosterConfig, SLOTS_PER_POD, SessionTypesConfig};
