//! Emission factor table
//!
//! Static reference data: kg CO2-equivalent per kg of food, keyed by a
//! normalized lowercase food identifier.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Food category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodCategory {
    Meat,
    Seafood,
    Dairy,
    Fruit,
    Vegetable,
    Grain,
    Unknown,
}

impl FoodCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FoodCategory::Meat => "meat",
            FoodCategory::Seafood => "seafood",
            FoodCategory::Dairy => "dairy",
            FoodCategory::Fruit => "fruit",
            FoodCategory::Vegetable => "vegetable",
            FoodCategory::Grain => "grain",
            FoodCategory::Unknown => "unknown",
        }
    }

    /// Parse from string, anything unrecognized is `Unknown`
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "meat" => FoodCategory::Meat,
            "seafood" | "fish" => FoodCategory::Seafood,
            "dairy" => FoodCategory::Dairy,
            "fruit" | "fruits" => FoodCategory::Fruit,
            "vegetable" | "vegetables" => FoodCategory::Vegetable,
            "grain" | "grains" => FoodCategory::Grain,
            _ => FoodCategory::Unknown,
        }
    }
}

/// A single emission factor record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionFactor {
    pub food_id: &'static str,
    pub category: FoodCategory,
    /// kg CO2e per kg of food
    pub factor: f64,
    pub source: &'static str,
    /// Trust in the factor itself (0-1), not in any recognition step
    pub confidence: f64,
    pub notes: &'static str,
}

const fn ef(
    food_id: &'static str,
    category: FoodCategory,
    factor: f64,
    source: &'static str,
    confidence: f64,
    notes: &'static str,
) -> EmissionFactor {
    EmissionFactor { food_id, category, factor, source, confidence, notes }
}

use FoodCategory::{Dairy, Fruit, Grain, Meat, Seafood, Vegetable};

/// Reference emission factors (FAO, EPA, and LCA database figures)
pub const EMISSION_FACTORS: &[EmissionFactor] = &[
    // Meat
    ef("beef", Meat, 60.0, "FAO", 0.95, "Red meat, high emission"),
    ef("lamb", Meat, 39.2, "FAO", 0.9, "Red meat, high emission"),
    ef("pork", Meat, 12.1, "FAO", 0.9, "White meat, medium emission"),
    ef("chicken", Meat, 6.9, "FAO", 0.9, "White meat, lower emission"),
    ef("duck", Meat, 8.5, "FAO", 0.85, "Poultry"),
    ef("turkey", Meat, 10.9, "FAO", 0.85, "Poultry"),
    ef("rabbit", Meat, 4.3, "FAO", 0.8, "Small mammal"),
    ef("venison", Meat, 8.1, "FAO", 0.75, "Game meat"),
    // Seafood
    ef("salmon", Seafood, 11.9, "FAO", 0.9, "Farmed fish"),
    ef("tuna", Seafood, 9.7, "FAO", 0.85, "Marine fish"),
    ef("cod", Seafood, 2.3, "FAO", 0.85, "White fish"),
    ef("shrimp", Seafood, 18.2, "FAO", 0.8, "Crustacean, high emission"),
    ef("lobster", Seafood, 22.0, "FAO", 0.8, "Crustacean, high emission"),
    ef("crab", Seafood, 15.4, "FAO", 0.8, "Crustacean"),
    ef("mussels", Seafood, 1.6, "FAO", 0.85, "Shellfish, low emission"),
    ef("scallops", Seafood, 2.9, "FAO", 0.8, "Shellfish"),
    ef("sea bream", Seafood, 5.1, "FAO", 0.8, "Farmed fish"),
    ef("hairtail", Seafood, 3.8, "Database", 0.8, "Marine fish"),
    // Dairy
    ef("milk", Dairy, 3.2, "FAO", 0.95, "Liquid dairy"),
    ef("cheese", Dairy, 21.2, "FAO", 0.9, "Hard cheese"),
    ef("butter", Dairy, 23.8, "FAO", 0.9, "Animal fat"),
    ef("yogurt", Dairy, 2.2, "FAO", 0.85, "Fermented dairy"),
    ef("cream", Dairy, 14.3, "FAO", 0.85, "High fat dairy"),
    ef("ice cream", Dairy, 6.8, "EPA", 0.8, "Frozen dessert"),
    // Eggs, grouped with dairy
    ef("egg", Dairy, 4.2, "FAO", 0.9, "Poultry eggs"),
    ef("duck egg", Dairy, 4.8, "Database", 0.8, "Waterfowl eggs"),
    ef("goose egg", Dairy, 5.2, "Database", 0.75, "Large eggs"),
    ef("quail egg", Dairy, 3.9, "Database", 0.75, "Small eggs"),
    // Grains
    ef("rice", Grain, 4.0, "FAO", 0.9, "Staple, methane emission"),
    ef("wheat", Grain, 1.4, "FAO", 0.9, "Staple"),
    ef("corn", Grain, 1.1, "FAO", 0.9, "Feed grain"),
    ef("oats", Grain, 0.9, "FAO", 0.85, "Whole grain"),
    ef("barley", Grain, 1.2, "FAO", 0.85, "Feed grain"),
    ef("sorghum", Grain, 1.0, "FAO", 0.8, "Drought resistant"),
    ef("millet", Grain, 0.7, "Database", 0.8, "Traditional grain"),
    ef("quinoa", Grain, 2.3, "EPA", 0.8, "Pseudo-cereal"),
    // Grain-based processed foods
    ef("bread", Grain, 1.6, "EPA", 0.85, "Bakery"),
    ef("pasta", Grain, 1.4, "Database", 0.8, "Durum wheat"),
    ef("noodles", Grain, 2.2, "Database", 0.8, "Wheat noodles"),
    ef("instant noodles", Grain, 6.5, "Database", 0.75, "Fried, packaged"),
    ef("cookie", Grain, 3.8, "EPA", 0.75, "Bakery snack"),
    ef("cake", Grain, 4.5, "EPA", 0.75, "Dessert"),
    // Vegetables
    ef("potato", Vegetable, 0.5, "FAO", 0.9, "Root vegetable"),
    ef("sweet potato", Vegetable, 0.3, "FAO", 0.85, "Root vegetable"),
    ef("carrot", Vegetable, 0.4, "FAO", 0.85, "Root vegetable"),
    ef("radish", Vegetable, 0.3, "Database", 0.8, "Root vegetable"),
    ef("ginger", Vegetable, 2.1, "FAO", 0.8, "Root spice"),
    ef("onion", Vegetable, 0.4, "FAO", 0.85, "Bulb vegetable"),
    ef("garlic", Vegetable, 0.6, "FAO", 0.8, "Bulb vegetable"),
    ef("cabbage", Vegetable, 0.5, "FAO", 0.85, "Leafy vegetable"),
    ef("spinach", Vegetable, 2.0, "FAO", 0.8, "Leafy vegetable, greenhouse"),
    ef("lettuce", Vegetable, 1.3, "FAO", 0.8, "Leafy vegetable"),
    ef("tomato", Vegetable, 2.1, "FAO", 0.85, "Fruit vegetable, greenhouse"),
    ef("cucumber", Vegetable, 1.1, "FAO", 0.8, "Fruit vegetable"),
    ef("eggplant", Vegetable, 0.7, "Database", 0.8, "Fruit vegetable"),
    ef("bell pepper", Vegetable, 1.3, "FAO", 0.8, "Fruit vegetable"),
    ef("broccoli", Vegetable, 2.0, "FAO", 0.8, "Cruciferous"),
    ef("cauliflower", Vegetable, 1.9, "FAO", 0.8, "Cruciferous"),
    ef("celery", Vegetable, 1.4, "FAO", 0.75, "Stem vegetable"),
    // Legumes, grouped with vegetables
    ef("soybean", Vegetable, 1.2, "FAO", 0.9, "Protein legume"),
    ef("black bean", Vegetable, 0.8, "FAO", 0.85, "Protein legume"),
    ef("red bean", Vegetable, 0.9, "Database", 0.8, "Traditional legume"),
    ef("mung bean", Vegetable, 0.7, "Database", 0.8, "Summer legume"),
    ef("pea", Vegetable, 0.9, "FAO", 0.85, "Protein legume"),
    ef("lentil", Vegetable, 0.9, "FAO", 0.85, "Protein legume"),
    ef("chickpea", Vegetable, 0.8, "FAO", 0.8, "Protein legume"),
    ef("peanut", Vegetable, 2.5, "FAO", 0.85, "Ground nut, a legume"),
    // Fruit
    ef("apple", Fruit, 0.6, "FAO", 0.9, "Temperate fruit"),
    ef("banana", Fruit, 0.7, "FAO", 0.9, "Tropical fruit"),
    ef("orange", Fruit, 0.4, "FAO", 0.85, "Citrus"),
    ef("lemon", Fruit, 0.5, "FAO", 0.8, "Citrus"),
    ef("grape", Fruit, 1.8, "FAO", 0.8, "Berry"),
    ef("strawberry", Fruit, 1.4, "FAO", 0.75, "Berry"),
    ef("blueberry", Fruit, 2.3, "EPA", 0.75, "Berry"),
    ef("peach", Fruit, 0.8, "FAO", 0.8, "Stone fruit"),
    ef("pear", Fruit, 0.5, "FAO", 0.8, "Pome fruit"),
    ef("cherry", Fruit, 1.7, "FAO", 0.75, "Stone fruit"),
    ef("watermelon", Fruit, 0.4, "Database", 0.8, "Melon"),
    ef("kiwi", Fruit, 1.1, "FAO", 0.75, "Tropical fruit"),
    ef("mango", Fruit, 0.8, "FAO", 0.8, "Tropical fruit"),
    ef("pineapple", Fruit, 0.5, "FAO", 0.8, "Tropical fruit"),
];

/// Read-only lookup over a set of emission factor records
#[derive(Debug, Clone)]
pub struct EmissionTable {
    records: Vec<EmissionFactor>,
    index: HashMap<String, usize>,
}

impl EmissionTable {
    /// Build a table from records. Empty ids are skipped; on duplicate ids
    /// the first record wins.
    pub fn new(records: &[EmissionFactor]) -> Self {
        let mut kept = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());

        for record in records {
            let key = record.food_id.to_lowercase();
            if key.is_empty() || index.contains_key(&key) {
                tracing::debug!(food_id = record.food_id, "Skipping empty or duplicate emission factor");
                continue;
            }
            index.insert(key, kept.len());
            kept.push(record.clone());
        }

        let table = Self { records: kept, index };
        tracing::debug!(
            factors = table.len(),
            categories = table.categories().len(),
            "Loaded emission factor table"
        );
        table
    }

    /// Case-insensitive exact lookup. No trimming or fuzzy matching.
    pub fn lookup(&self, food_id: &str) -> Option<&EmissionFactor> {
        self.index
            .get(&food_id.to_lowercase())
            .map(|&i| &self.records[i])
    }

    /// All records in table order
    pub fn factors(&self) -> &[EmissionFactor] {
        &self.records
    }

    /// Records belonging to one category
    pub fn factors_in(&self, category: FoodCategory) -> Vec<&EmissionFactor> {
        self.records.iter().filter(|r| r.category == category).collect()
    }

    /// Distinct categories in first-seen order
    pub fn categories(&self) -> Vec<FoodCategory> {
        let mut seen = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.category) {
                seen.push(record.category);
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The process-wide reference table, built on first use
pub fn table() -> &'static EmissionTable {
    static TABLE: OnceLock<EmissionTable> = OnceLock::new();
    TABLE.get_or_init(|| EmissionTable::new(EMISSION_FACTORS))
}

/// Look up a food in the reference table
pub fn lookup(food_id: &str) -> Option<&'static EmissionFactor> {
    table().lookup(food_id)
}
