//! Foodprint MCP Server Implementation
//!
//! Implements the MCP server with all Foodprint tools.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::Database;
use crate::tools::analysis::FoodAnalyzer;
use crate::tools::emissions;
use crate::tools::history;
use crate::tools::status::StatusTracker;

/// Foodprint MCP Service
#[derive(Clone)]
pub struct FoodprintService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    analyzer: Arc<FoodAnalyzer>,
    tool_router: ToolRouter<FoodprintService>,
}

impl FoodprintService {
    pub fn new(database_path: PathBuf, database: Database, analyzer: FoodAnalyzer) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            analyzer: Arc::new(analyzer),
            tool_router: Self::tool_router(),
        }
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Emission Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LookupEmissionFactorParams {
    /// Food name, case-insensitive
    pub food_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListEmissionFactorsParams {
    /// meat, seafood, dairy, fruit, vegetable or grain
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CalculateEmissionParams {
    pub food_id: String,
    pub weight: f64,
    /// g, mg, kg, oz, lb or ton
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub save: bool,
}

fn default_unit() -> String { "g".to_string() }

// ============================================================================
// Analysis Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AnalyzeFoodImageParams {
    /// Path to a JPEG or PNG file
    pub image_path: String,
    /// Measured weight; overrides the scale and the visual estimate
    pub weight_grams: Option<f64>,
    /// Free-text hint for the recognizer
    pub context: Option<String>,
    #[serde(default = "default_save")]
    pub save: bool,
}

fn default_save() -> bool { true }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListAnalysesParams {
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_list_limit() -> i64 { 20 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AnalysisIdParams {
    pub id: i64,
}

#[tool_router]
impl FoodprintService {
    // --- Status ---

    #[tool(description = "Get the current status of the Foodprint service including build info, database status, recognizer, scale readiness, and process information")]
    async fn foodprint_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(self.analyzer.recognizer_name(), self.analyzer.scale_status());
        json_result(&status)
    }

    #[tool(description = "Get instructions for estimating food carbon footprints. Call this when unsure how to use the Foodprint tools.")]
    fn usage_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::USAGE_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(USAGE_INSTRUCTIONS)]))
    }

    // --- Emission Factors ---

    #[tool(description = "Look up the emission factor (kg CO2e per kg) for one food")]
    fn lookup_emission_factor(&self, Parameters(p): Parameters<LookupEmissionFactorParams>) -> Result<CallToolResult, McpError> {
        json_result(&emissions::lookup_emission_factor(&p.food_id))
    }

    #[tool(description = "List the emission factor table, optionally filtered by category")]
    fn list_emission_factors(&self, Parameters(p): Parameters<ListEmissionFactorsParams>) -> Result<CallToolResult, McpError> {
        let result = emissions::list_emission_factors(p.category.as_deref()).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Calculate the carbon footprint of a food quantity. Unknown foods use a low-confidence default factor.")]
    fn calculate_emission(&self, Parameters(p): Parameters<CalculateEmissionParams>) -> Result<CallToolResult, McpError> {
        let result = emissions::calculate_emission(&self.database, &p.food_id, p.weight, &p.unit, p.save)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Image Analysis ---

    #[tool(description = "Recognize the food in an image file, weigh it (argument, scale, or visual estimate), and calculate its carbon footprint")]
    async fn analyze_food_image(&self, Parameters(p): Parameters<AnalyzeFoodImageParams>) -> Result<CallToolResult, McpError> {
        let result = self
            .analyzer
            .analyze_file(&self.database, Path::new(&p.image_path), p.weight_grams, p.context, p.save)
            .await
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- History ---

    #[tool(description = "List saved analyses, newest first")]
    fn list_analyses(&self, Parameters(p): Parameters<ListAnalysesParams>) -> Result<CallToolResult, McpError> {
        let result = history::list_analyses(&self.database, p.limit, p.offset).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get one saved analysis by ID")]
    fn get_analysis(&self, Parameters(p): Parameters<AnalysisIdParams>) -> Result<CallToolResult, McpError> {
        match history::get_analysis(&self.database, p.id) {
            Ok(analysis) => json_result(&analysis),
            Err(e) => json_result(&serde_json::json!({ "error": e, "id": p.id })),
        }
    }

    #[tool(description = "Delete a saved analysis by ID")]
    fn delete_analysis(&self, Parameters(p): Parameters<AnalysisIdParams>) -> Result<CallToolResult, McpError> {
        let result = history::delete_analysis(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Total weight and carbon footprint across all saved analyses")]
    fn footprint_totals(&self) -> Result<CallToolResult, McpError> {
        let result = history::footprint_totals(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }
}

#[tool_handler]
impl ServerHandler for FoodprintService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "foodprint".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Foodprint".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Foodprint - carbon footprint estimates for food. \
                 Call usage_instructions first if unsure. \
                 Factors: lookup_emission_factor, list_emission_factors. \
                 Calculate: calculate_emission (food + weight + unit), analyze_food_image (photo, optional weight). \
                 History: list_analyses, get_analysis, delete_analysis, footprint_totals. \
                 Status: foodprint_status."
                    .into(),
            ),
        }
    }
}
