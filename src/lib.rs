//! Appointment import engine for tutoring-center schedule grids.
//!
//! This crate turns an uploaded CSV or TSV file of appointments into cells
//! of a fixed time-by-column grid. Each slot of the grid holds as many
//! students as the room has columns (three per pod); a student booked over
//! consecutive slots keeps the same column, and occupants beyond capacity
//! are left out and reported.

#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod persistence;
