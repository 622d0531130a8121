//! Storage module for larder
//!
//! Keeps consumption history and learned patterns in SQLite and
//! provides status/statistics reporting.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

pub mod history;
pub mod patterns;

pub use history::{ConsumptionRecord, HistoryStore};
pub use patterns::{ConsumptionPattern, PatternStore, Trend};

use crate::config::{self, Config};

/// Create the database schema (idempotent)
pub(crate) fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS history (
            record_id TEXT PRIMARY KEY,
            item_name TEXT NOT NULL,
            date TEXT NOT NULL,
            quantity_used REAL NOT NULL,
            unit TEXT NOT NULL,
            meal_plan_id TEXT,
            waste_amount REAL,
            actual_servings INTEGER,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS patterns (
            item_name TEXT PRIMARY KEY,
            average_weekly_usage REAL NOT NULL,
            unit TEXT NOT NULL,
            average_serving_size REAL,
            waste_percentage REAL NOT NULL,
            confidence_score REAL NOT NULL,
            data_points INTEGER NOT NULL,
            trend TEXT NOT NULL,
            weekly_history TEXT NOT NULL,
            last_updated TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS learning_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
            event_type TEXT NOT NULL,
            details TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_history_item_date ON history(item_name, date);
        CREATE INDEX IF NOT EXISTS idx_history_date ON history(date);
        "#,
    )?;

    Ok(())
}

/// Initialize larder storage and configuration
pub async fn init() -> Result<()> {
    let larder_dir = config::larder_dir()?;
    std::fs::create_dir_all(&larder_dir)?;

    let db_path = larder_dir.join("larder.sqlite");
    let conn = Connection::open(&db_path)?;
    create_schema(&conn)?;

    info!("larder initialized at {:?}", larder_dir);

    let config_path = larder_dir.join("config.toml");
    if !config_path.exists() {
        Config::default().save(&config_path)?;
        info!("Created default configuration at {:?}", config_path);
    }

    println!("✅ Larder initialized at {}", larder_dir.display());
    Ok(())
}

/// Append a consumption record from CLI input
pub async fn add_record(
    item_name: &str,
    quantity_used: f64,
    unit: &str,
    date: Option<NaiveDate>,
    waste_amount: Option<f64>,
    actual_servings: Option<u32>,
    meal_plan_id: Option<String>,
) -> Result<()> {
    if quantity_used < 0.0 {
        anyhow::bail!("Quantity used must be non-negative");
    }
    if waste_amount.is_some_and(|w| w < 0.0) {
        anyhow::bail!("Waste amount must be non-negative");
    }

    let record = ConsumptionRecord {
        record_id: Uuid::new_v4(),
        item_name: item_name.to_string(),
        date: date.unwrap_or_else(|| Utc::now().date_naive()),
        quantity_used,
        unit: unit.to_string(),
        meal_plan_id,
        waste_amount,
        actual_servings,
    };

    let db_path = config::db_path()?;
    let store = HistoryStore::open(&db_path)?;
    store.add(&record)?;

    println!(
        "✅ Recorded {} {} of '{}' on {}",
        record.quantity_used, record.unit, record.item_name, record.date
    );
    Ok(())
}

/// Log a learning event to the database
pub fn log_learning_event(db_path: &Path, event_type: &str, details: &impl Serialize) -> Result<()> {
    let conn = Connection::open(db_path)?;

    conn.execute(
        "INSERT INTO learning_log (event_type, details) VALUES (?1, ?2)",
        rusqlite::params![event_type, serde_json::to_string(details)?],
    )?;

    Ok(())
}

/// Show current larder status
pub async fn show_status() -> Result<()> {
    let larder_dir = config::larder_dir()?;

    println!("Larder Status");
    println!("=============");
    println!();

    if !larder_dir.exists() {
        println!("Status: NOT INITIALIZED");
        println!("Run 'larder init' to initialize");
        return Ok(());
    }

    println!("Status: INITIALIZED");
    println!("Data directory: {}", larder_dir.display());

    let db_path = larder_dir.join("larder.sqlite");
    if db_path.exists() {
        let history = HistoryStore::open(&db_path)?;
        let patterns = PatternStore::open(&db_path)?;

        println!("History records: {}", history.count()?);
        println!("Items tracked: {}", history.item_count()?);
        println!("Patterns learned: {}", patterns.count()?);
    } else {
        println!("Database: NOT FOUND");
    }

    Ok(())
}

/// Show detailed larder statistics
pub async fn show_stats() -> Result<()> {
    let larder_dir = config::larder_dir()?;

    println!("Larder Statistics");
    println!("=================");
    println!();

    if !larder_dir.exists() {
        println!("Larder not initialized. Run 'larder init' first.");
        return Ok(());
    }

    let db_path = larder_dir.join("larder.sqlite");
    if !db_path.exists() {
        println!("No database found.");
        return Ok(());
    }

    let conn = Connection::open(&db_path)?;

    println!("History:");
    println!("--------");

    let record_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))
        .unwrap_or(0);
    let item_count: i64 = conn
        .query_row("SELECT COUNT(DISTINCT item_name) FROM history", [], |row| row.get(0))
        .unwrap_or(0);
    println!("  Records: {}", record_count);
    println!("  Distinct items: {}", item_count);

    println!();
    println!("Patterns:");
    println!("---------");

    let pattern_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM patterns", [], |row| row.get(0))
        .unwrap_or(0);
    println!("  Total: {}", pattern_count);

    if pattern_count > 0 {
        let mut stmt = conn.prepare(
            "SELECT trend, COUNT(*) FROM patterns GROUP BY trend ORDER BY COUNT(*) DESC",
        )?;
        let trend_counts = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        println!("  By trend:");
        for (trend, count) in trend_counts.flatten() {
            println!("    {}: {}", trend, count);
        }

        let avg_confidence: f64 = conn
            .query_row("SELECT AVG(confidence_score) FROM patterns", [], |row| row.get(0))
            .unwrap_or(0.0);
        let high_confidence: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM patterns WHERE confidence_score > 0.7",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);
        let avg_waste: f64 = conn
            .query_row("SELECT AVG(waste_percentage) FROM patterns", [], |row| row.get(0))
            .unwrap_or(0.0);

        println!("  Avg confidence: {:.2}", avg_confidence);
        println!("  High confidence (>0.7): {}", high_confidence);
        println!("  Avg waste: {:.1}%", avg_waste);
    }

    println!();
    println!("Learning History:");
    println!("-----------------");

    let mut stmt =
        conn.prepare("SELECT timestamp, event_type FROM learning_log ORDER BY timestamp DESC LIMIT 5")?;
    let events = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut has_events = false;
    for (timestamp, event_type) in events.flatten() {
        has_events = true;
        println!("  {} - {}", timestamp, event_type);
    }

    if !has_events {
        println!("  No learning events recorded yet.");
    }

    Ok(())
}
