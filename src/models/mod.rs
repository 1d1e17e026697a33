//! Data models
//!
//! Rust structs representing database entities.

mod analysis;

pub use analysis::{Analysis, AnalysisCreate, FootprintTotals};
