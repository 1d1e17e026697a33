//! Emission Tools
//!
//! Factor lookup and footprint calculation.

use serde::Serialize;

use crate::db::Database;
use crate::emissions::{self, EmissionFactor, EmissionResult, FoodCategory};
use crate::models::{Analysis, AnalysisCreate};

/// Response for lookup_emission_factor
#[derive(Debug, Serialize)]
pub struct LookupFactorResponse {
    pub found: bool,
    pub food_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factor: Option<EmissionFactor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response for list_emission_factors
#[derive(Debug, Serialize)]
pub struct ListFactorsResponse {
    pub factors: Vec<EmissionFactor>,
    pub total: usize,
    pub categories: Vec<FoodCategory>,
}

/// Response for calculate_emission
#[derive(Debug, Serialize)]
pub struct CalculateEmissionResponse {
    pub weight_grams: f64,
    pub result: EmissionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_analysis_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Warning shown when the default factor was used
pub fn default_factor_warning(result: &EmissionResult) -> Option<String> {
    result.used_default_factor.then(|| {
        format!(
            "'{}' is not in the emission table; used the default factor of {} kg CO2e/kg (low confidence)",
            result.food_id, result.factor_used
        )
    })
}

/// Look up one food's emission factor
pub fn lookup_emission_factor(food_id: &str) -> LookupFactorResponse {
    match emissions::lookup(food_id) {
        Some(factor) => LookupFactorResponse {
            found: true,
            food_id: factor.food_id.to_string(),
            factor: Some(factor.clone()),
            message: None,
        },
        None => LookupFactorResponse {
            found: false,
            food_id: food_id.to_lowercase(),
            factor: None,
            message: Some(format!(
                "No factor for '{}'; calculations will use the default of {} kg CO2e/kg",
                food_id,
                emissions::DEFAULT_EMISSION_FACTOR
            )),
        },
    }
}

/// List the table, optionally for one category
pub fn list_emission_factors(category: Option<&str>) -> Result<ListFactorsResponse, String> {
    let table = emissions::table();

    let factors: Vec<EmissionFactor> = match category {
        Some(name) => {
            let category = FoodCategory::from_str(name);
            if category == FoodCategory::Unknown {
                return Err(format!(
                    "Unknown category '{}'. Valid: meat, seafood, dairy, fruit, vegetable, grain",
                    name
                ));
            }
            table.factors_in(category).into_iter().cloned().collect()
        }
        None => table.factors().to_vec(),
    };

    Ok(ListFactorsResponse {
        total: factors.len(),
        factors,
        categories: table.categories(),
    })
}

/// Calculate a footprint, optionally saving it to the history
pub fn calculate_emission(
    db: &Database,
    food_id: &str,
    quantity: f64,
    unit: &str,
    save: bool,
) -> Result<CalculateEmissionResponse, String> {
    let weight_grams = emissions::grams_in_unit(quantity, unit).map_err(|e| e.to_string())?;
    let result = emissions::calculate(food_id, weight_grams).map_err(|e| e.to_string())?;

    let saved_analysis_id = if save {
        let data = AnalysisCreate::from_result(result.clone(), weight_grams);
        let saved = db
            .with_conn(|conn| Analysis::create(conn, &data))
            .map_err(|e| format!("Failed to save analysis: {}", e))?;
        Some(saved.id)
    } else {
        None
    };

    Ok(CalculateEmissionResponse {
        weight_grams,
        warning: default_factor_warning(&result),
        result,
        saved_analysis_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn test_db() -> Database {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| run_migrations(conn)).unwrap();
        db
    }

    #[test]
    fn test_lookup_found_and_missing() {
        let hit = lookup_emission_factor("Salmon");
        assert!(hit.found);
        assert_eq!(hit.food_id, "salmon");
        assert_eq!(hit.factor.unwrap().factor, 11.9);

        let miss = lookup_emission_factor("Unicorn");
        assert!(!miss.found);
        assert_eq!(miss.food_id, "unicorn");
        assert!(miss.message.is_some());
    }

    #[test]
    fn test_list_factors() {
        let all = list_emission_factors(None).unwrap();
        assert_eq!(all.total, emissions::EMISSION_FACTORS.len());

        let dairy = list_emission_factors(Some("dairy")).unwrap();
        assert!(dairy.factors.iter().all(|f| f.category == FoodCategory::Dairy));
        assert!(dairy.total > 0);

        assert!(list_emission_factors(Some("candy")).is_err());
    }

    #[test]
    fn test_calculate_and_save() {
        let db = test_db();
        let resp = calculate_emission(&db, "beef", 0.1, "kg", true).unwrap();
        assert!((resp.weight_grams - 100.0).abs() < 1e-9);
        assert!(resp.warning.is_none());
        let id = resp.saved_analysis_id.unwrap();

        let saved = db.with_conn(|conn| Analysis::get_by_id(conn, id)).unwrap().unwrap();
        assert_eq!(saved.food_name, "beef");
    }

    #[test]
    fn test_weight_grams_kept_exact() {
        let db = test_db();
        for tenths in 1..5000 {
            let grams = tenths as f64 * 0.1;
            let resp = calculate_emission(&db, "rice", grams, "g", false).unwrap();
            assert_eq!(resp.weight_grams, grams);
        }

        let resp = calculate_emission(&db, "rice", 15.7, "g", true).unwrap();
        let saved = db
            .with_conn(|conn| Analysis::get_by_id(conn, resp.saved_analysis_id.unwrap()))
            .unwrap()
            .unwrap();
        assert_eq!(saved.weight_grams, 15.7);
    }

    #[test]
    fn test_calculate_unknown_warns_without_saving() {
        let db = test_db();
        let resp = calculate_emission(&db, "dragon fruit", 100.0, "g", false).unwrap();
        assert!(resp.warning.unwrap().contains("default factor"));
        assert!(resp.saved_analysis_id.is_none());
        assert_eq!(db.with_conn(Analysis::count).unwrap(), 0);
    }

    #[test]
    fn test_calculate_errors() {
        let db = test_db();
        assert!(calculate_emission(&db, "beef", -5.0, "g", false).is_err());
        assert!(calculate_emission(&db, "beef", 5.0, "cup", false)
            .unwrap_err()
            .contains("Unsupported weight unit"));
    }
}
