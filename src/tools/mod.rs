//! Foodprint Tools module
//!
//! MCP tool implementations for the footprint estimator.

pub mod analysis;
pub mod emissions;
pub mod history;
pub mod status;
