//! Foodprint
//!
//! An MCP server for food carbon footprint estimation.

use std::fs::OpenOptions;
use std::io::BufReader;
use std::sync::Arc;

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use foodprint::build_info;
use foodprint::config::{AiConfig, Config, HardwareConfig};
use foodprint::db;
use foodprint::mcp::FoodprintService;
use foodprint::recognition::{DemoRecognizer, GeminiRecognizer, Recognizer};
use foodprint::tools::analysis::FoodAnalyzer;
use foodprint::weight::{LineDisplay, LineWeightReceiver};

/// Gemini when a key is configured, the offline demo otherwise
fn build_recognizer(ai: &AiConfig) -> Arc<dyn Recognizer> {
    match GeminiRecognizer::new(ai.clone()) {
        Ok(gemini) => Arc::new(gemini),
        Err(e) => {
            tracing::warn!(error = %e, "Gemini unavailable, using demo recognizer");
            Arc::new(DemoRecognizer::new())
        }
    }
}

/// Open the configured scale port, if any: readings come in on one handle,
/// result lines go out on a clone of it. The port is expected to be
/// configured for line mode already (baud rate, raw mode).
fn open_scale(hardware: &HardwareConfig) -> Option<(LineWeightReceiver, LineDisplay<std::fs::File>)> {
    let port = hardware.serial_port.as_deref()?;
    let opened = OpenOptions::new()
        .read(true)
        .write(true)
        .open(port)
        .and_then(|file| Ok((file.try_clone()?, file)));

    match opened {
        Ok((reader, writer)) => {
            tracing::info!(port, baudrate = hardware.baudrate, "Connected to scale");
            Some((
                LineWeightReceiver::spawn(BufReader::new(reader)),
                LineDisplay::new(writer),
            ))
        }
        Err(e) => {
            tracing::warn!(port, error = %e, "Could not open scale port, continuing without it");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("foodprint=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = Config::load()?;

    let db_path = config.database_path();
    eprintln!("Database path: {}", db_path.display());

    let database = db::Database::open(&db_path)?;

    database.with_conn(|conn| {
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        eprintln!("Database schema version: {}", version);
        Ok(())
    })?;

    let recognizer = build_recognizer(&config.ai);
    eprintln!("Recognizer: {}", recognizer.name());

    let mut analyzer = FoodAnalyzer::new(
        recognizer,
        config.hardware.clone(),
        config.ai.confidence_threshold,
    );
    if let Some((receiver, display)) = open_scale(&config.hardware) {
        analyzer = analyzer
            .with_weight_source(Arc::new(receiver))
            .with_display(Arc::new(display));
    }

    let service = FoodprintService::new(db_path, database, analyzer);

    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}
