//! Output writers.
//!
//! CSV export of the projected table and JSON export of persona profiles.

pub mod csv_writer;
pub mod generator;

pub use csv_writer::*;
pub use generator::*;
