//! Analysis modules.
//!
//! Persona grouping and URL profile aggregation over the loaded table.

pub mod aggregator;

pub use aggregator::*;
