//! Weight units and conversion constants
//!
//! The calculator works in grams; other mass units are converted first.

use serde::{Deserialize, Serialize};

// ============================================================================
// Weight Conversion Constants (to grams)
// ============================================================================

/// Grams per milligram
pub const G_PER_MG: f64 = 0.001;
/// Grams per kilogram
pub const G_PER_KG: f64 = 1000.0;
/// Grams per ounce
pub const G_PER_OZ: f64 = 28.3495;
/// Grams per pound
pub const G_PER_LB: f64 = 453.592;
/// Grams per metric ton
pub const G_PER_TON: f64 = 1_000_000.0;

/// Supported mass unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    G,
    Mg,
    Kg,
    Oz,
    Lb,
    Ton,
}

impl WeightUnit {
    pub const ALL: [WeightUnit; 6] = [
        WeightUnit::G,
        WeightUnit::Mg,
        WeightUnit::Kg,
        WeightUnit::Oz,
        WeightUnit::Lb,
        WeightUnit::Ton,
    ];

    /// Parse a unit string, accepting common spellings
    pub fn parse(unit: &str) -> Option<Self> {
        let lower = unit.to_lowercase();

        match lower.trim() {
            "g" | "gram" | "grams" => Some(WeightUnit::G),
            "mg" | "milligram" | "milligrams" => Some(WeightUnit::Mg),
            "kg" | "kilogram" | "kilograms" => Some(WeightUnit::Kg),
            "oz" | "ounce" | "ounces" => Some(WeightUnit::Oz),
            "lb" | "lbs" | "pound" | "pounds" => Some(WeightUnit::Lb),
            "t" | "ton" | "tons" | "tonne" | "tonnes" => Some(WeightUnit::Ton),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::G => "g",
            WeightUnit::Mg => "mg",
            WeightUnit::Kg => "kg",
            WeightUnit::Oz => "oz",
            WeightUnit::Lb => "lb",
            WeightUnit::Ton => "ton",
        }
    }

    pub fn grams_per_unit(&self) -> f64 {
        match self {
            WeightUnit::G => 1.0,
            WeightUnit::Mg => G_PER_MG,
            WeightUnit::Kg => G_PER_KG,
            WeightUnit::Oz => G_PER_OZ,
            WeightUnit::Lb => G_PER_LB,
            WeightUnit::Ton => G_PER_TON,
        }
    }

    pub fn to_grams(&self, quantity: f64) -> f64 {
        quantity * self.grams_per_unit()
    }
}

/// Canonical names of all supported units, for error messages
pub fn supported_units() -> Vec<&'static str> {
    WeightUnit::ALL.iter().map(|u| u.as_str()).collect()
}
