//! Consumption history storage
//!
//! Append-only record of what was actually used (and wasted) per item.
//! Reads are windowed by a lookback horizon; no ordering guarantee is
//! given to callers.

use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// A single consumption event for one item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionRecord {
    pub record_id: Uuid,
    pub item_name: String,
    pub date: NaiveDate,
    pub quantity_used: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_plan_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waste_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_servings: Option<u32>,
}

/// History store backed by SQLite
pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    /// Open a history store at the given database path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Ok(Self { conn })
    }

    /// Append a consumption record
    pub fn add(&self, record: &ConsumptionRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO history
            (record_id, item_name, date, quantity_used, unit,
             meal_plan_id, waste_amount, actual_servings)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.record_id.to_string(),
                record.item_name,
                record.date,
                record.quantity_used,
                record.unit,
                record.meal_plan_id,
                record.waste_amount,
                record.actual_servings,
            ],
        )?;

        Ok(())
    }

    /// Get records for one item within the lookback window
    pub fn get_by_item(&self, item_name: &str, lookback_weeks: u32) -> Result<Vec<ConsumptionRecord>> {
        let mut stmt = self.conn.prepare_cached(
            r#"
            SELECT record_id, item_name, date, quantity_used, unit,
                   meal_plan_id, waste_amount, actual_servings
            FROM history
            WHERE item_name = ?1 AND date >= ?2
            "#,
        )?;

        let records = stmt.query_map(params![item_name, cutoff_date(lookback_weeks)], |row| {
            row_to_record(row)
        })?;
        records.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Get all records within the lookback window, every item
    pub fn get_all(&self, lookback_weeks: u32) -> Result<Vec<ConsumptionRecord>> {
        let mut stmt = self.conn.prepare_cached(
            r#"
            SELECT record_id, item_name, date, quantity_used, unit,
                   meal_plan_id, waste_amount, actual_servings
            FROM history
            WHERE date >= ?1
            "#,
        )?;

        let records = stmt.query_map(params![cutoff_date(lookback_weeks)], |row| row_to_record(row))?;
        records.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Get total record count across all items
    pub fn count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))
            .map_err(Into::into)
    }

    /// Count distinct item names in the history table
    pub fn item_count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(DISTINCT item_name) FROM history", [], |row| row.get(0))
            .map_err(Into::into)
    }
}

fn cutoff_date(lookback_weeks: u32) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(lookback_weeks as i64 * 7)
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConsumptionRecord> {
    let record_id: String = row.get(0)?;
    let record_id = Uuid::parse_str(&record_id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(ConsumptionRecord {
        record_id,
        item_name: row.get(1)?,
        date: row.get(2)?,
        quantity_used: row.get(3)?,
        unit: row.get(4)?,
        meal_plan_id: row.get(5)?,
        waste_amount: row.get(6)?,
        actual_servings: row.get::<_, Option<i64>>(7)?.map(|v| v as u32),
    })
}
