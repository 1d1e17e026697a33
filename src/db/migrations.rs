//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!("Applied schema migration v1");
    }

    Ok(())
}

/// Highest applied schema version, 0 for a fresh database
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Migration v1: analysis history
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE analyses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            food_name TEXT NOT NULL,             -- table key used for the calculation
            raw_label TEXT,                      -- recognizer output before mapping
            recognition_confidence REAL,         -- NULL when no recognizer was involved
            weight_grams REAL NOT NULL CHECK(weight_grams >= 0),
            category TEXT NOT NULL,
            factor_used REAL NOT NULL,
            total_co2_kg REAL NOT NULL,
            factor_confidence REAL NOT NULL,
            used_default_factor INTEGER NOT NULL DEFAULT 0,
            impact_level TEXT NOT NULL
                CHECK(impact_level IN ('LOW', 'MEDIUM', 'HIGH', 'VERY_HIGH')),
            car_km_equivalent REAL NOT NULL,
            phone_charges_equivalent REAL NOT NULL,
            tree_months_equivalent REAL NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_analyses_created_at ON analyses(created_at);
        CREATE INDEX idx_analyses_food_name ON analyses(food_name);
        "#,
    )?;
    Ok(())
}
