//! Carbon footprint calculation
//!
//! Converts a (food, weight) pair into an [`EmissionResult`]. Unknown foods
//! are not an error: they are priced with [`DEFAULT_EMISSION_FACTOR`] and
//! flagged so the caller can show a lower-confidence warning.

use serde::Serialize;
use thiserror::Error;

use super::factors::{self, EmissionTable, FoodCategory};
use super::units::{supported_units, WeightUnit};

/// Factor applied when a food is not in the table (kg CO2e / kg)
pub const DEFAULT_EMISSION_FACTOR: f64 = 2.5;
/// Confidence reported alongside the default factor
pub const DEFAULT_FACTOR_CONFIDENCE: f64 = 0.3;
/// Source label reported alongside the default factor
pub const DEFAULT_FACTOR_SOURCE: &str = "Default Estimate";

/// kg CO2 per km driven in an average passenger car
pub const CAR_KG_CO2_PER_KM: f64 = 0.2;
/// kg CO2 per full smartphone charge
pub const PHONE_KG_CO2_PER_CHARGE: f64 = 0.0084;
/// kg CO2 absorbed by one tree per month (22 kg per year)
pub const TREE_KG_CO2_PER_MONTH: f64 = 22.0 / 12.0;

/// Calculation errors
#[derive(Debug, Error, PartialEq)]
pub enum CalcError {
    #[error("Invalid weight: {0} (must be a finite, non-negative number)")]
    InvalidWeight(f64),

    #[error("Unsupported weight unit: {unit} (supported: {})", .supported.join(", "))]
    UnsupportedUnit {
        unit: String,
        supported: Vec<&'static str>,
    },
}

/// Coarse impact band for a footprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ImpactLevel {
    /// Band a footprint in kg CO2e
    pub fn from_co2_kg(co2_kg: f64) -> Self {
        if co2_kg < 0.1 {
            ImpactLevel::Low
        } else if co2_kg < 0.5 {
            ImpactLevel::Medium
        } else if co2_kg < 2.0 {
            ImpactLevel::High
        } else {
            ImpactLevel::VeryHigh
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactLevel::Low => "LOW",
            ImpactLevel::Medium => "MEDIUM",
            ImpactLevel::High => "HIGH",
            ImpactLevel::VeryHigh => "VERY_HIGH",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Some(ImpactLevel::Low),
            "MEDIUM" => Some(ImpactLevel::Medium),
            "HIGH" => Some(ImpactLevel::High),
            "VERY_HIGH" => Some(ImpactLevel::VeryHigh),
            _ => None,
        }
    }
}

/// Result of one footprint calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionResult {
    /// Lower-cased food identifier as looked up
    pub food_id: String,
    pub category: FoodCategory,
    pub weight_kg: f64,
    pub factor_used: f64,
    /// `weight_kg * factor_used`, unrounded
    pub total_co2_kg: f64,
    pub confidence: f64,
    pub used_default_factor: bool,
    pub source: &'static str,
    pub impact_level: ImpactLevel,
    /// Rounded to 2 decimals
    pub car_km_equivalent: f64,
    /// Rounded to 1 decimal
    pub phone_charges_equivalent: f64,
    /// Rounded to 1 decimal
    pub tree_months_equivalent: f64,
}

impl EmissionResult {
    /// Footprint in grams of CO2e
    pub fn total_co2_grams(&self) -> f64 {
        self.total_co2_kg * 1000.0
    }
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Calculator bound to an emission table
#[derive(Debug, Clone, Copy)]
pub struct Calculator<'a> {
    table: &'a EmissionTable,
}

impl Default for Calculator<'static> {
    fn default() -> Self {
        Self::new(factors::table())
    }
}

impl<'a> Calculator<'a> {
    pub fn new(table: &'a EmissionTable) -> Self {
        Self { table }
    }

    /// Calculate the footprint of `weight_grams` of `food_id`
    pub fn calculate(&self, food_id: &str, weight_grams: f64) -> Result<EmissionResult, CalcError> {
        if !weight_grams.is_finite() || weight_grams < 0.0 {
            return Err(CalcError::InvalidWeight(weight_grams));
        }

        let weight_kg = weight_grams / 1000.0;

        let (factor_used, confidence, category, source, used_default_factor) =
            match self.table.lookup(food_id) {
                Some(record) => (
                    record.factor,
                    record.confidence,
                    record.category,
                    record.source,
                    false,
                ),
                None => {
                    tracing::debug!(food_id, "No emission factor found, using default");
                    (
                        DEFAULT_EMISSION_FACTOR,
                        DEFAULT_FACTOR_CONFIDENCE,
                        FoodCategory::Unknown,
                        DEFAULT_FACTOR_SOURCE,
                        true,
                    )
                }
            };

        let total_co2_kg = weight_kg * factor_used;

        Ok(EmissionResult {
            food_id: food_id.to_lowercase(),
            category,
            weight_kg,
            factor_used,
            total_co2_kg,
            confidence,
            used_default_factor,
            source,
            impact_level: ImpactLevel::from_co2_kg(total_co2_kg),
            car_km_equivalent: round_to(total_co2_kg / CAR_KG_CO2_PER_KM, 2),
            phone_charges_equivalent: round_to(total_co2_kg / PHONE_KG_CO2_PER_CHARGE, 1),
            tree_months_equivalent: round_to(total_co2_kg / TREE_KG_CO2_PER_MONTH, 1),
        })
    }

    /// Calculate with the quantity given in any supported mass unit
    pub fn calculate_in_unit(
        &self,
        food_id: &str,
        quantity: f64,
        unit: &str,
    ) -> Result<EmissionResult, CalcError> {
        self.calculate(food_id, grams_in_unit(quantity, unit)?)
    }
}

/// Convert a quantity in a named unit to grams
pub fn grams_in_unit(quantity: f64, unit: &str) -> Result<f64, CalcError> {
    let unit = WeightUnit::parse(unit).ok_or_else(|| CalcError::UnsupportedUnit {
        unit: unit.to_string(),
        supported: supported_units(),
    })?;
    Ok(unit.to_grams(quantity))
}

/// Calculate against the reference table
pub fn calculate(food_id: &str, weight_grams: f64) -> Result<EmissionResult, CalcError> {
    Calculator::default().calculate(food_id, weight_grams)
}

/// Calculate against the reference table with an explicit unit
pub fn calculate_in_unit(food_id: &str, quantity: f64, unit: &str) -> Result<EmissionResult, CalcError> {
    Calculator::default().calculate_in_unit(food_id, quantity, unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emissions::factors::EMISSION_FACTORS;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_beef_100g() {
        let r = calculate("beef", 100.0).unwrap();
        assert!(approx(r.weight_kg, 0.1));
        assert_eq!(r.factor_used, 60.0);
        assert!(approx(r.total_co2_kg, 6.0));
        assert!(!r.used_default_factor);
        assert_eq!(r.category, FoodCategory::Meat);
        assert_eq!(r.confidence, 0.95);
        assert_eq!(r.car_km_equivalent, 30.0);
        assert_eq!(r.impact_level, ImpactLevel::VeryHigh);
    }

    #[test]
    fn test_apple_250g() {
        let r = calculate("apple", 250.0).unwrap();
        assert!(approx(r.weight_kg, 0.25));
        assert_eq!(r.factor_used, 0.6);
        assert!(approx(r.total_co2_kg, 0.15));
        assert_eq!(r.phone_charges_equivalent, 17.9);
        assert_eq!(r.car_km_equivalent, 0.75);
        assert_eq!(r.impact_level, ImpactLevel::Medium);
    }

    #[test]
    fn test_unknown_food_uses_default() {
        let r = calculate("unicorn-meat", 100.0).unwrap();
        assert_eq!(r.factor_used, DEFAULT_EMISSION_FACTOR);
        assert!(approx(r.total_co2_kg, 0.25));
        assert!(r.used_default_factor);
        assert_eq!(r.category, FoodCategory::Unknown);
        assert_eq!(r.confidence, DEFAULT_FACTOR_CONFIDENCE);
        assert_eq!(r.source, DEFAULT_FACTOR_SOURCE);
    }

    #[test]
    fn test_uppercase_rice_1kg() {
        let r = calculate("RICE", 1000.0).unwrap();
        assert_eq!(r.weight_kg, 1.0);
        assert_eq!(r.factor_used, 4.0);
        assert_eq!(r.total_co2_kg, 4.0);
        assert_eq!(r.food_id, "rice");
    }

    #[test]
    fn test_case_insensitive_results_identical() {
        assert_eq!(calculate("BEEF", 100.0), calculate("beef", 100.0));
    }

    #[test]
    fn test_idempotent() {
        let a = calculate("salmon", 321.5).unwrap();
        let b = calculate("salmon", 321.5).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.total_co2_kg.to_bits(), b.total_co2_kg.to_bits());
    }

    #[test]
    fn test_linear_in_weight() {
        for food in ["beef", "apple", "unicorn-meat", "ice cream"] {
            for w in [0.0, 1.0, 37.3, 100.0, 4999.9] {
                let single = calculate(food, w).unwrap().total_co2_kg;
                let double = calculate(food, 2.0 * w).unwrap().total_co2_kg;
                assert_eq!(double, 2.0 * single, "{} at {}g", food, w);
            }
        }
    }

    #[test]
    fn test_known_foods_use_table_factor() {
        for record in EMISSION_FACTORS {
            for w in [0.0, 50.0, 1234.5] {
                let r = calculate(record.food_id, w).unwrap();
                assert_eq!(r.factor_used, record.factor);
                assert!(!r.used_default_factor);
            }
        }
    }

    #[test]
    fn test_equivalents() {
        // 0.1kg rice -> 0.4kg CO2
        let r = calculate("rice", 100.0).unwrap();
        assert_eq!(r.car_km_equivalent, 2.0);
        assert_eq!(r.phone_charges_equivalent, 47.6);
        assert_eq!(r.tree_months_equivalent, 0.2);
    }

    #[test]
    fn test_zero_weight_allowed() {
        let r = calculate("beef", 0.0).unwrap();
        assert_eq!(r.total_co2_kg, 0.0);
        assert_eq!(r.impact_level, ImpactLevel::Low);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        assert_eq!(calculate("beef", -1.0), Err(CalcError::InvalidWeight(-1.0)));
        assert!(calculate("beef", f64::NAN).is_err());
        assert!(calculate("beef", f64::INFINITY).is_err());
        assert!(calculate("beef", f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_empty_string_uses_default() {
        let r = calculate("", 100.0).unwrap();
        assert!(r.used_default_factor);
    }

    #[test]
    fn test_empty_table_always_defaults() {
        let table = EmissionTable::new(&[]);
        let r = Calculator::new(&table).calculate("beef", 100.0).unwrap();
        assert!(r.used_default_factor);
        assert_eq!(r.factor_used, DEFAULT_EMISSION_FACTOR);
    }

    #[test]
    fn test_calculate_in_unit() {
        let r = calculate_in_unit("beef", 0.1, "kg").unwrap();
        assert!(approx(r.total_co2_kg, 6.0));

        let r = calculate_in_unit("rice", 1.0, "lb").unwrap();
        assert!(approx(r.weight_kg, 0.453592));

        let err = calculate_in_unit("rice", 1.0, "cup").unwrap_err();
        assert!(matches!(err, CalcError::UnsupportedUnit { .. }));
        assert!(err.to_string().contains("kg"));
    }

    #[test]
    fn test_impact_bands() {
        assert_eq!(ImpactLevel::from_co2_kg(0.05), ImpactLevel::Low);
        assert_eq!(ImpactLevel::from_co2_kg(0.1), ImpactLevel::Medium);
        assert_eq!(ImpactLevel::from_co2_kg(1.99), ImpactLevel::High);
        assert_eq!(ImpactLevel::from_co2_kg(2.0), ImpactLevel::VeryHigh);
        assert_eq!(ImpactLevel::from_str("very_high"), Some(ImpactLevel::VeryHigh));
    }

    #[test]
    fn test_concurrent_use() {
        let handles: Vec<_> = (0..4)
            .map(|i| std::thread::spawn(move || calculate("beef", 100.0 * i as f64).unwrap()))
            .collect();
        for (i, h) in handles.into_iter().enumerate() {
            let r = h.join().unwrap();
            assert!(approx(r.total_co2_kg, 6.0 * i as f64));
        }
    }
}
