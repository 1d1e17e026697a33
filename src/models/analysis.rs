//! Analysis model
//!
//! One saved footprint calculation, optionally tied to a recognition.

use rusqlite::{params, Connection, Row};
use serde::Serialize;

use crate::db::DbResult;
use crate::emissions::{EmissionResult, FoodCategory, ImpactLevel};

/// A saved analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub id: i64,
    pub food_name: String,
    pub raw_label: Option<String>,
    pub recognition_confidence: Option<f64>,
    pub weight_grams: f64,
    pub category: FoodCategory,
    pub factor_used: f64,
    pub total_co2_kg: f64,
    pub factor_confidence: f64,
    pub used_default_factor: bool,
    pub impact_level: ImpactLevel,
    pub car_km_equivalent: f64,
    pub phone_charges_equivalent: f64,
    pub tree_months_equivalent: f64,
    pub created_at: String,
}

/// Data for saving a new analysis
#[derive(Debug, Clone)]
pub struct AnalysisCreate {
    pub weight_grams: f64,
    pub raw_label: Option<String>,
    pub recognition_confidence: Option<f64>,
    pub result: EmissionResult,
}

impl AnalysisCreate {
    /// A plain calculation with no recognition step
    pub fn from_result(result: EmissionResult, weight_grams: f64) -> Self {
        Self {
            weight_grams,
            raw_label: None,
            recognition_confidence: None,
            result,
        }
    }

    pub fn with_recognition(mut self, raw_label: &str, confidence: f64) -> Self {
        self.raw_label = Some(raw_label.to_string());
        self.recognition_confidence = Some(confidence);
        self
    }
}

/// Aggregate over all saved analyses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FootprintTotals {
    pub analyses: i64,
    pub total_weight_grams: f64,
    pub total_co2_kg: f64,
    pub default_factor_analyses: i64,
}

impl Analysis {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let impact: String = row.get("impact_level")?;
        let category: String = row.get("category")?;

        Ok(Self {
            id: row.get("id")?,
            food_name: row.get("food_name")?,
            raw_label: row.get("raw_label")?,
            recognition_confidence: row.get("recognition_confidence")?,
            weight_grams: row.get("weight_grams")?,
            category: FoodCategory::from_str(&category),
            factor_used: row.get("factor_used")?,
            total_co2_kg: row.get("total_co2_kg")?,
            factor_confidence: row.get("factor_confidence")?,
            used_default_factor: row.get("used_default_factor")?,
            impact_level: ImpactLevel::from_str(&impact).unwrap_or(ImpactLevel::Low),
            car_km_equivalent: row.get("car_km_equivalent")?,
            phone_charges_equivalent: row.get("phone_charges_equivalent")?,
            tree_months_equivalent: row.get("tree_months_equivalent")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Insert a new analysis
    pub fn create(conn: &Connection, data: &AnalysisCreate) -> DbResult<Self> {
        let r = &data.result;
        conn.execute(
            r#"
            INSERT INTO analyses (
                food_name, raw_label, recognition_confidence, weight_grams,
                category, factor_used, total_co2_kg, factor_confidence, used_default_factor,
                impact_level, car_km_equivalent, phone_charges_equivalent, tree_months_equivalent
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                r.food_id,
                data.raw_label,
                data.recognition_confidence,
                data.weight_grams,
                r.category.as_str(),
                r.factor_used,
                r.total_co2_kg,
                r.confidence,
                r.used_default_factor,
                r.impact_level.as_str(),
                r.car_km_equivalent,
                r.phone_charges_equivalent,
                r.tree_months_equivalent,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get an analysis by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM analyses WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Most recent first
    pub fn list(conn: &Connection, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM analyses ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        )?;

        let items = stmt
            .query_map(params![limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM analyses", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Returns Ok(true) if deleted, Ok(false) if not found
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM analyses WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    pub fn totals(conn: &Connection) -> DbResult<FootprintTotals> {
        let totals = conn.query_row(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(weight_grams), 0.0),
                   COALESCE(SUM(total_co2_kg), 0.0),
                   COALESCE(SUM(used_default_factor), 0)
            FROM analyses
            "#,
            [],
            |row| {
                Ok(FootprintTotals {
                    analyses: row.get(0)?,
                    total_weight_grams: row.get(1)?,
                    total_co2_kg: row.get(2)?,
                    default_factor_analyses: row.get(3)?,
                })
            },
        )?;
        Ok(totals)
    }
}
