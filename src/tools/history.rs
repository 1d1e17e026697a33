//! History Tools
//!
//! Browse and prune saved analyses.

use serde::Serialize;

use crate::db::Database;
use crate::models::{Analysis, FootprintTotals};

const MAX_PAGE_SIZE: i64 = 200;

/// Response for list_analyses
#[derive(Debug, Serialize)]
pub struct ListAnalysesResponse {
    pub analyses: Vec<Analysis>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for delete_analysis
#[derive(Debug, Serialize)]
pub struct DeleteAnalysisResponse {
    pub success: bool,
    pub message: String,
}

/// Response for footprint_totals
#[derive(Debug, Serialize)]
pub struct TotalsResponse {
    #[serde(flatten)]
    pub totals: FootprintTotals,
    pub average_co2_kg: Option<f64>,
}

pub fn list_analyses(db: &Database, limit: i64, offset: i64) -> Result<ListAnalysesResponse, String> {
    if limit < 1 || offset < 0 {
        return Err("limit must be positive and offset must not be negative".to_string());
    }
    let limit = limit.min(MAX_PAGE_SIZE);

    db.with_conn(|conn| {
        Ok(ListAnalysesResponse {
            analyses: Analysis::list(conn, limit, offset)?,
            total: Analysis::count(conn)?,
            limit,
            offset,
        })
    })
    .map_err(|e| format!("Failed to list analyses: {}", e))
}

pub fn get_analysis(db: &Database, id: i64) -> Result<Analysis, String> {
    db.with_conn(|conn| Analysis::get_by_id(conn, id))
        .map_err(|e| format!("Failed to get analysis: {}", e))?
        .ok_or_else(|| format!("Analysis not found: {}", id))
}

pub fn delete_analysis(db: &Database, id: i64) -> Result<DeleteAnalysisResponse, String> {
    let deleted = db
        .with_conn(|conn| Analysis::delete(conn, id))
        .map_err(|e| format!("Failed to delete analysis: {}", e))?;

    if deleted {
        Ok(DeleteAnalysisResponse {
            success: true,
            message: format!("Analysis {} deleted", id),
        })
    } else {
        Err(format!("Analysis not found: {}", id))
    }
}

pub fn footprint_totals(db: &Database) -> Result<TotalsResponse, String> {
    let totals = db
        .with_conn(Analysis::totals)
        .map_err(|e| format!("Failed to compute totals: {}", e))?;

    let average_co2_kg = (totals.analyses > 0).then(|| totals.total_co2_kg / totals.analyses as f64);
    Ok(TotalsResponse {
        totals,
        average_co2_kg,
    })
}
