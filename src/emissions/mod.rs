//! Emission lookup and calculation
//!
//! Static emission-factor table, weight units, and the footprint calculator.

pub mod calculator;
pub mod factors;
pub mod names;
pub mod units;

pub use calculator::{
    calculate, calculate_in_unit, grams_in_unit, round_to, CalcError, Calculator, EmissionResult, ImpactLevel,
    DEFAULT_EMISSION_FACTOR, DEFAULT_FACTOR_CONFIDENCE,
};
pub use factors::{lookup, table, EmissionFactor, EmissionTable, FoodCategory, EMISSION_FACTORS};
pub use names::map_food_name;
pub use units::{supported_units, WeightUnit};
