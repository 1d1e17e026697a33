//! Foodprint Status Tool
//!
//! Provides runtime status information about the Foodprint service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::emissions;

use super::analysis::ScaleStatus;

/// Usage guide for AI assistants
pub const USAGE_INSTRUCTIONS: &str = r#"
# Foodprint Usage Instructions

Foodprint estimates the carbon footprint of food from its type and weight.

## Quick Calculation

**Tool:** `calculate_emission`
- `food_id`: food name, case-insensitive (e.g. "beef", "Apple")
- `weight`: quantity, must be zero or positive
- `unit`: g (default), mg, kg, oz, lb, ton
- `save`: store the result in the history (default false)

Foods missing from the table use a default factor of 2.5 kg CO2e/kg with
low confidence (0.3). The response carries a warning when that happens.

## Analyzing a Photo

**Tool:** `analyze_food_image`
- `image_path`: path to a JPEG or PNG on this machine
- `weight_grams`: measured weight, if known
- `context`: optional hint for the recognizer ("lunch plate", "raw meat")
- `save`: default true

Weight is taken from `weight_grams`, then from the connected scale (stable
readings only), then from the recognizer's visual estimate. When a scale is
connected the result line is also shown on its display, and
`foodprint_status` reports the latest reading and whether it is ready for
analysis. Check `weight_origin` and `warnings` in the
response before reporting numbers to the user.

## Browsing the Table

- `lookup_emission_factor`: one food's factor, source, and confidence
- `list_emission_factors`: the whole table, or one category
  (meat, seafood, dairy, fruit, vegetable, grain)

## History

- `list_analyses`: newest first, `limit` (default 20) and `offset`
- `get_analysis` / `delete_analysis`: by id
- `footprint_totals`: count, total grams, total kg CO2e, average per analysis

## Reading Results

| impact_level | total CO2e      |
|--------------|-----------------|
| LOW          | under 0.1 kg    |
| MEDIUM       | 0.1 to 0.5 kg   |
| HIGH         | 0.5 to 2 kg     |
| VERY_HIGH    | 2 kg and above  |

Equivalents: car_km assumes 0.2 kg CO2e per km driven, phone_charges
assumes 8.4 g per full charge, tree_months is how long one tree needs to
absorb the amount (about 22 kg per year).
"#;

/// Runtime status of the Foodprint service
#[derive(Debug, Clone, Serialize)]
pub struct FoodprintStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Capabilities
    pub recognizer: &'static str,
    pub emission_factors: usize,
    /// Absent when no scale is connected
    pub scale: Option<ScaleStatus>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self, recognizer: &'static str, scale: Option<ScaleStatus>) -> FoodprintStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        FoodprintStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            recognizer,
            scale,
            emission_factors: emissions::table().len(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
