//! Foodprint Library
//!
//! Carbon footprint estimation for food: emission factors, recognition,
//! weight sources, and analysis history.

pub mod build_info;
pub mod config;
pub mod db;
pub mod emissions;
pub mod mcp;
pub mod models;
pub mod recognition;
pub mod tools;
pub mod weight;
